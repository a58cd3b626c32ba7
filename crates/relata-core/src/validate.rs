mod association;
mod diagnostic;
mod foreign_key;

pub use diagnostic::{Diagnostic, Diagnostics, Severity};

use crate::graph::{EntityGraph, TypeNamePolicy};
use crate::junction::JunctionKey;
use crate::schema::{Attribute, AttributeRef, Entity};
use std::collections::HashSet;

/// Checks an [`EntityGraph`] for relationship consistency.
///
/// Validation never fails: every finding is recorded as a [`Diagnostic`] and
/// the remaining attributes are still checked. Alongside the diagnostics,
/// the validator collects the junction tables many-to-many attributes still
/// need.
#[derive(Debug)]
pub struct Validator<'a> {
    graph: &'a EntityGraph,

    /// Request default junctions for many-to-many attributes with no inverse
    one_sided_junctions: bool,

    /// Unordered attribute pairs whose pair-level rules were already checked
    checked_pairs: HashSet<(AttributeRef, AttributeRef)>,

    /// Unordered pairs that already requested a default junction
    requested_pairs: HashSet<(AttributeRef, AttributeRef)>,

    diagnostics: Diagnostics,

    requests: Vec<JunctionKey>,
}

/// The outcome of validating a graph.
#[derive(Debug, Default)]
pub struct Validation {
    pub diagnostics: Diagnostics,

    /// Junctions to synthesize, in the order they were found
    pub requests: Vec<JunctionKey>,
}

impl<'a> Validator<'a> {
    pub fn new(graph: &'a EntityGraph) -> Self {
        Self {
            graph,
            one_sided_junctions: true,
            checked_pairs: HashSet::new(),
            requested_pairs: HashSet::new(),
            diagnostics: Diagnostics::new(),
            requests: vec![],
        }
    }

    pub fn synthesize_one_sided(mut self, enabled: bool) -> Self {
        self.one_sided_junctions = enabled;
        self
    }

    /// Validates every entity in the graph, in insertion order.
    pub fn validate(mut self) -> Validation {
        let graph = self.graph;

        for entity in graph.entities() {
            self.validate_entity(entity);
        }

        Validation {
            diagnostics: self.diagnostics,
            requests: self.requests,
        }
    }

    fn validate_entity(&mut self, entity: &'a Entity) {
        log::trace!("validating entity `{}`", entity.ty);

        for attribute in entity.attributes() {
            if !self.verify_unambiguous_target(entity, attribute) {
                continue;
            }

            if attribute.is_association() {
                self.verify_association(entity, attribute);
            } else {
                self.verify_scalar_reference(entity, attribute);
            }

            if attribute.foreign_key {
                self.verify_foreign_key(entity, attribute);
            }
        }
    }

    /// Reports a simple type name shared by several entities. Returns
    /// `false` when the target is left unresolved and no further checks
    /// apply to the attribute.
    fn verify_unambiguous_target(&mut self, entity: &Entity, attribute: &Attribute) -> bool {
        let graph = self.graph;
        let candidates = graph.ambiguous_targets(attribute);

        let [first, ..] = &candidates[..] else {
            return true;
        };

        let names = candidates
            .iter()
            .map(|candidate| format!("`{}`", candidate.ty))
            .collect::<Vec<_>>()
            .join(", ");

        match graph.type_name_policy() {
            TypeNamePolicy::FirstMatch => {
                let message = format!(
                    "type name `{}` is ambiguous; matches {names}; using `{}`",
                    first.ty.simple_name(),
                    first.ty
                );
                self.warning(entity, attribute, message);
                true
            }
            TypeNamePolicy::Strict => {
                let message = format!(
                    "type name `{}` is ambiguous; matches {names}",
                    first.ty.simple_name()
                );
                self.error(entity, attribute, message);
                false
            }
        }
    }

    fn verify_scalar_reference(&mut self, entity: &Entity, attribute: &Attribute) {
        let graph = self.graph;

        if let Some(target) = graph.entity_for_type(&attribute.ty) {
            let message = format!(
                "entity reference `{}` is missing a relationship annotation",
                target.ty
            );
            self.error(entity, attribute, message);
        }
    }

    /// Returns `true` the first time the unordered pair `(a, b)` is seen.
    fn first_visit(&mut self, a: &AttributeRef, b: &AttributeRef) -> bool {
        self.checked_pairs.insert(unordered(a, b))
    }

    /// Returns `true` the first time the unordered pair `(a, b)` requests a
    /// default junction.
    fn first_request(&mut self, a: &AttributeRef, b: &AttributeRef) -> bool {
        self.requested_pairs.insert(unordered(a, b))
    }

    fn error(&mut self, entity: &Entity, attribute: &Attribute, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::error(entity.attribute_ref(attribute), message));
    }

    fn warning(&mut self, entity: &Entity, attribute: &Attribute, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::warning(entity.attribute_ref(attribute), message));
    }
}

fn unordered(a: &AttributeRef, b: &AttributeRef) -> (AttributeRef, AttributeRef) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}
