use super::{EntityGraph, TypeNamePolicy};
use crate::schema::{Attribute, Entity, Name, Type, TypePath};

impl EntityGraph {
    /// Resolves the entity an association or foreign-key attribute points to.
    ///
    /// The first applicable strategy decides:
    ///
    /// 1. an explicit referenced table, matched case-insensitively;
    /// 2. an explicit referenced type; a primitive type means the attribute is
    ///    a plain foreign-key column and resolves to nothing;
    /// 3. the declared type, with one level of collection wrapping removed,
    ///    matched by simple name.
    pub fn referencing_entity(&self, attribute: &Attribute) -> Option<&Entity> {
        if let Some(table) = &attribute.referenced_table {
            return self.entity_by_table(table);
        }

        if let Some(ty) = &attribute.referenced_type {
            let ty = ty.element();
            if ty.is_primitive() {
                return None;
            }
            return self.entity_by_path(ty.as_path()?);
        }

        self.entity_for_type(&attribute.ty)
    }

    /// Finds the referenced column on the far side of `attribute`.
    ///
    /// An explicit referenced column must match exactly. Otherwise the
    /// referenced entity's key is used; a composite key is narrowed to the
    /// key attributes whose type equals the source attribute's type.
    pub fn referencing_attribute<'a>(
        &self,
        attribute: &Attribute,
        referenced: &'a Entity,
    ) -> Option<&'a Attribute> {
        if let Some(column) = &attribute.referenced_column {
            return referenced.attribute(column);
        }

        let keys: Vec<_> = referenced.key_attributes().collect();

        match &keys[..] {
            [] => None,
            [key] => Some(*key),
            _ => keys.into_iter().find(|key| key.ty == attribute.ty),
        }
    }

    /// Computes the inverse side of the relationship `entity.attribute`
    /// pointing at `referenced`.
    ///
    /// With `mapped_by` set, the result is the named attribute (or nothing).
    /// Without it, every association on `referenced` that resolves back to
    /// `entity` is a candidate, except those whose own `mapped_by` names some
    /// other attribute. Several candidates are narrowed to those naming
    /// `attribute` in their `mapped_by`, then to those named after `entity`;
    /// a narrowing step that would leave nothing is skipped. The result may
    /// still hold more than one attribute.
    pub fn mapped_attributes<'a>(
        &self,
        entity: &Entity,
        attribute: &Attribute,
        referenced: &'a Entity,
    ) -> Vec<&'a Attribute> {
        if let Some(mapped_by) = &attribute.mapped_by {
            return referenced.attribute(mapped_by).into_iter().collect();
        }

        let mut candidates: Vec<_> = referenced
            .associations()
            .filter(|candidate| {
                candidate
                    .mapped_by
                    .as_ref()
                    .map_or(true, |mapped_by| *mapped_by == attribute.name)
            })
            .filter(|candidate| {
                self.referencing_entity(candidate)
                    .is_some_and(|target| target.ty == entity.ty)
            })
            .collect();

        if candidates.len() > 1 {
            narrow(&mut candidates, |candidate| {
                candidate.mapped_by.as_ref() == Some(&attribute.name)
            });
        }

        if candidates.len() > 1 {
            let snake = Name::new(entity.ty.simple_name()).snake_case();
            narrow(&mut candidates, |candidate| {
                candidate.name == snake || candidate.name.eq_ignore_ascii_case(&entity.table_name)
            });
        }

        log::trace!(
            "`{}::{}` maps to {:?} on `{}`",
            entity.ty,
            attribute.name,
            candidates.iter().map(|c| &c.name).collect::<Vec<_>>(),
            referenced.ty
        );

        candidates
    }

    /// Resolves a qualified name exactly, falling back to the simple name
    /// when `path` carries no package.
    pub fn entity_by_path(&self, path: &TypePath) -> Option<&Entity> {
        if let Some(entity) = self.entity(path) {
            return Some(entity);
        }

        if path.has_package() {
            return None;
        }

        self.entity_by_simple_name(path.simple_name())
    }

    /// Resolves the entity a declared type refers to, if any.
    ///
    /// An exact qualified match wins; otherwise the simple name decides,
    /// subject to the graph's [`TypeNamePolicy`].
    pub fn entity_for_type(&self, ty: &Type) -> Option<&Entity> {
        let path = ty.element().as_path()?;

        self.entity(path)
            .or_else(|| self.entity_by_simple_name(path.simple_name()))
    }

    /// Entities competing for `attribute`'s target when it resolves by simple
    /// name and that name is shared. Empty when the target is unambiguous.
    pub fn ambiguous_targets(&self, attribute: &Attribute) -> Vec<&Entity> {
        if attribute.referenced_table.is_some() {
            return vec![];
        }

        let path = match &attribute.referenced_type {
            Some(ty) => match ty.element().as_path() {
                Some(path) if !path.has_package() => path,
                _ => return vec![],
            },
            None => match attribute.element_ty().as_path() {
                Some(path) => path,
                None => return vec![],
            },
        };

        if self.entity(path).is_some() {
            return vec![];
        }

        let candidates = self.entities_named(path.simple_name());

        if candidates.len() > 1 {
            candidates
        } else {
            vec![]
        }
    }

    fn entity_by_simple_name(&self, name: &str) -> Option<&Entity> {
        match (self.policy, &self.entities_named(name)[..]) {
            (_, []) => None,
            (TypeNamePolicy::Strict, [only]) => Some(*only),
            (TypeNamePolicy::Strict, _) => None,
            (TypeNamePolicy::FirstMatch, [first, ..]) => Some(*first),
        }
    }
}

/// Keeps the candidates matching `f`, unless none do.
fn narrow(candidates: &mut Vec<&Attribute>, f: impl Fn(&Attribute) -> bool) {
    if candidates.iter().any(|candidate| f(candidate)) {
        candidates.retain(|candidate| f(candidate));
    }
}
