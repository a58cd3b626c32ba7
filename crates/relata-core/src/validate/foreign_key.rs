use super::Validator;
use crate::schema::{Attribute, Entity};

impl<'a> Validator<'a> {
    pub(super) fn verify_foreign_key(&mut self, entity: &Entity, attribute: &Attribute) {
        let graph = self.graph;

        let Some(target) = graph.referencing_entity(attribute) else {
            // A plain foreign-key column may point outside the managed model
            if attribute.is_association() {
                let message = format!(
                    "foreign key `{}` references an unknown entity",
                    attribute.name
                );
                self.error(entity, attribute, message);
            }
            return;
        };

        if graph.referencing_attribute(attribute, target).is_none() {
            let column = match &attribute.referenced_column {
                Some(column) => format!("column `{column}`"),
                None => "key attribute".to_string(),
            };
            let message = format!("couldn't find referenced {column} on `{}`", target.ty);
            self.warning(entity, attribute, message);
            return;
        }

        if target.ty == entity.ty {
            return;
        }

        let back_reference = target.foreign_keys().find(|foreign_key| {
            graph
                .referencing_entity(foreign_key)
                .is_some_and(|referenced| referenced.ty == entity.ty)
        });

        if let Some(back_reference) = back_reference {
            let message = format!(
                "circular foreign key reference between `{}` and `{}` (via `{}`)",
                entity.ty,
                target.ty,
                target.attribute_ref(back_reference)
            );
            self.warning(entity, attribute, message);
        }
    }
}
