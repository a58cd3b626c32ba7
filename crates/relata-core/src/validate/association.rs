use super::Validator;
use crate::junction::JunctionKey;
use crate::schema::{Attribute, Cardinality, Entity};

impl<'a> Validator<'a> {
    pub(super) fn verify_association(&mut self, entity: &'a Entity, attribute: &'a Attribute) {
        let Some(cardinality) = attribute.cardinality else {
            return;
        };

        let graph = self.graph;

        let Some(target) = graph.referencing_entity(attribute) else {
            let message = format!(
                "couldn't find referenced element `{}`",
                describe_target(attribute)
            );
            self.warning(entity, attribute, message);
            return;
        };

        // An attribute resolving back to itself is a one-sided relationship
        let mapped: Vec<_> = graph
            .mapped_attributes(entity, attribute, target)
            .into_iter()
            .filter(|mapped| !(target.ty == entity.ty && mapped.name == attribute.name))
            .collect();

        match &mapped[..] {
            [] => self.verify_one_sided(entity, attribute, cardinality, target),
            [mapped] => self.verify_pair(entity, attribute, cardinality, target, mapped),
            [first, ..] => {
                let names = mapped
                    .iter()
                    .map(|mapped| format!("`{}`", mapped.name))
                    .collect::<Vec<_>>()
                    .join(", ");

                let message = format!(
                    "ambiguous mapping: {} attributes on `{}` map back to this attribute ({names}); using `{}`",
                    mapped.len(),
                    target.ty,
                    first.name
                );
                self.warning(entity, attribute, message);
            }
        }

        if cardinality.is_many_to_many() && mapped.len() <= 1 {
            self.request_junction(entity, attribute, target, mapped.first().copied());
        }
    }

    fn verify_one_sided(
        &mut self,
        entity: &Entity,
        attribute: &Attribute,
        cardinality: Cardinality,
        target: &Entity,
    ) {
        match cardinality {
            Cardinality::OneToOne if !attribute.foreign_key => {
                self.error(
                    entity,
                    attribute,
                    "single-sided OneToOne must declare a foreign key",
                );
            }
            Cardinality::OneToMany => {
                let message = format!("no matching ManyToOne found on `{}`", target.ty);
                self.error(entity, attribute, message);
            }
            _ => {}
        }
    }

    /// Pair-level rules, checked once per unordered pair of attributes.
    fn verify_pair(
        &mut self,
        entity: &Entity,
        attribute: &Attribute,
        cardinality: Cardinality,
        target: &Entity,
        mapped: &Attribute,
    ) {
        let source_ref = entity.attribute_ref(attribute);
        let mapped_ref = target.attribute_ref(mapped);

        if !self.first_visit(&source_ref, &mapped_ref) {
            return;
        }

        let expected = cardinality.inverse();

        let Some(actual) = mapped.cardinality else {
            let message = format!(
                "`{source_ref}` is {cardinality} but its mapped attribute `{mapped_ref}` has no relationship; expected {expected}"
            );
            self.error(entity, attribute, message);
            return;
        };

        if actual != expected {
            let message = format!(
                "`{source_ref}` is {cardinality} but its mapped attribute `{mapped_ref}` is {actual}; expected {expected}"
            );
            self.error(entity, attribute, message);
            return;
        }

        match cardinality {
            Cardinality::ManyToMany => {
                match (
                    attribute.associative_entity.is_some(),
                    mapped.associative_entity.is_some(),
                ) {
                    (false, false) => self.error(
                        entity,
                        attribute,
                        format!(
                            "ManyToMany must declare the junction on one side (`{source_ref}` or `{mapped_ref}`)"
                        ),
                    ),
                    (true, true) => self.error(
                        entity,
                        attribute,
                        format!(
                            "only one side of a ManyToMany may declare the junction; `{source_ref}` and `{mapped_ref}` both do"
                        ),
                    ),
                    _ => {}
                }
            }
            Cardinality::OneToOne => match (attribute.foreign_key, mapped.foreign_key) {
                (false, false) => self.error(
                    entity,
                    attribute,
                    "OneToOne must specify ForeignKey on one side",
                ),
                (true, true) => self.error(
                    entity,
                    attribute,
                    format!(
                        "OneToOne must specify ForeignKey on only one side; `{source_ref}` and `{mapped_ref}` both do"
                    ),
                ),
                _ => {}
            },
            _ => {}
        }
    }

    /// Records a junction request for a many-to-many attribute.
    ///
    /// The side declaring the junction requests it. A pair with no
    /// declaration on either side gets one default junction, named from the
    /// side visited first. With no inverse and no declaration, a default
    /// junction is requested when one-sided synthesis is enabled.
    fn request_junction(
        &mut self,
        entity: &Entity,
        attribute: &Attribute,
        target: &Entity,
        mapped: Option<&Attribute>,
    ) {
        let declared = attribute.associative_entity.is_some();
        let declared_by_mapped = mapped.is_some_and(|mapped| mapped.associative_entity.is_some());

        let wanted = match (declared, declared_by_mapped) {
            (true, false) => true,
            (false, false) => match mapped {
                Some(mapped) => {
                    let source_ref = entity.attribute_ref(attribute);
                    let mapped_ref = target.attribute_ref(mapped);
                    self.first_request(&source_ref, &mapped_ref)
                }
                None => self.one_sided_junctions,
            },
            _ => false,
        };

        if wanted {
            self.requests.push(JunctionKey {
                from: entity.ty.clone(),
                to: target.ty.clone(),
                attribute: attribute.name.clone(),
            });
        }
    }
}

fn describe_target(attribute: &Attribute) -> String {
    if let Some(table) = &attribute.referenced_table {
        return table.clone();
    }

    match &attribute.referenced_type {
        Some(ty) => ty.element().to_string(),
        None => attribute.element_ty().to_string(),
    }
}
