use super::EntityGraph;
use crate::schema::{Attribute, Embeddable, Entity, TypePath};
use indexmap::IndexMap;

impl EntityGraph {
    /// Replaces embedded attributes with the embeddable's own attributes,
    /// named `<attribute>_<inner>`. Nested embeddables are flattened too; a
    /// cyclic embedding stops at the first repeated type.
    pub(super) fn flatten(&self, entity: Entity) -> Entity {
        if !entity
            .attributes()
            .any(|attribute| self.embeddable_for(attribute).is_some())
        {
            return entity;
        }

        let Entity {
            ty,
            table_name,
            model,
            attributes,
            read_only,
            cacheable,
            stateless,
            synthesized,
        } = entity;

        let mut flattened = IndexMap::with_capacity(attributes.len());
        let mut stack = vec![];

        for attribute in attributes.into_values() {
            self.flatten_into(&mut flattened, attribute, &mut stack);
        }

        Entity {
            ty,
            table_name,
            model,
            attributes: flattened,
            read_only,
            cacheable,
            stateless,
            synthesized,
        }
    }

    fn flatten_into(
        &self,
        out: &mut IndexMap<String, Attribute>,
        attribute: Attribute,
        stack: &mut Vec<TypePath>,
    ) {
        let embeddable = self
            .embeddable_for(&attribute)
            .filter(|embeddable| !stack.contains(&embeddable.ty));

        let Some(embeddable) = embeddable else {
            if out.contains_key(&attribute.name) {
                log::warn!(
                    "flattened attribute `{}` shadows an existing attribute; keeping the first",
                    attribute.name
                );
                return;
            }
            out.insert(attribute.name.clone(), attribute);
            return;
        };

        stack.push(embeddable.ty.clone());

        for inner in embeddable.attributes.values() {
            let mut inner = inner.clone();
            inner.name = format!("{}_{}", attribute.name, inner.name);
            inner.nullable |= attribute.nullable;
            self.flatten_into(out, inner, stack);
        }

        stack.pop();
    }

    fn embeddable_for(&self, attribute: &Attribute) -> Option<&Embeddable> {
        if attribute.is_association() {
            return None;
        }

        let path = attribute.ty.as_path()?;

        self.embeddables.get(path).or_else(|| {
            self.embeddables
                .values()
                .find(|embeddable| embeddable.ty.matches(path))
        })
    }
}
