mod flatten;
mod matching;

use crate::schema::{Embeddable, Entity, TypePath};
use crate::{Error, Result};
use indexmap::IndexMap;
use std::sync::Arc;

/// Embeddable descriptors keyed by declared type.
pub type Embeddables = IndexMap<TypePath, Embeddable>;

/// How an ambiguous simple type name is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TypeNamePolicy {
    /// The first entity with a matching simple name wins, in insertion order.
    #[default]
    FirstMatch,

    /// An ambiguous simple name resolves to nothing.
    Strict,
}

/// All entities of one model known to the current resolution pass.
///
/// The graph only grows: entities are inserted, never removed or edited.
#[derive(Debug, Clone)]
pub struct EntityGraph {
    model: String,

    entities: IndexMap<TypePath, Entity>,

    /// Read-only side table used to flatten embedded attributes on insertion
    embeddables: Arc<Embeddables>,

    policy: TypeNamePolicy,
}

impl EntityGraph {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            entities: IndexMap::new(),
            embeddables: Arc::default(),
            policy: TypeNamePolicy::default(),
        }
    }

    pub fn with_embeddables(mut self, embeddables: Arc<Embeddables>) -> Self {
        self.embeddables = embeddables;
        self
    }

    pub fn with_type_name_policy(mut self, policy: TypeNamePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn type_name_policy(&self) -> TypeNamePolicy {
        self.policy
    }

    /// Adds an entity to the graph.
    ///
    /// Returns `Ok(true)` if the entity is new and `Ok(false)` if an entity
    /// with the same identity is already present and identical, or if the
    /// incoming entity is synthesized. A declared entity that differs from
    /// the resident one, synthesized or not, is an error.
    pub fn add(&mut self, entity: Entity) -> Result<bool> {
        if entity.model != self.model {
            return Err(Error::invalid_schema(format!(
                "entity `{}` belongs to model `{}`, not `{}`",
                entity.ty, entity.model, self.model
            )));
        }

        entity.verify()?;
        let entity = self.flatten(entity);

        if let Some(existing) = self.entities.get(&entity.ty) {
            if *existing == entity || entity.synthesized {
                log::trace!("entity `{}` already in graph; skipping", entity.ty);
                return Ok(false);
            }

            return Err(Error::duplicate_entity(&entity.ty));
        }

        log::trace!("adding entity `{}` to model `{}`", entity.ty, self.model);
        self.entities.insert(entity.ty.clone(), entity);
        Ok(true)
    }

    /// Get an entity by its exact type path
    pub fn entity(&self, ty: &TypePath) -> Option<&Entity> {
        self.entities.get(ty)
    }

    /// Entities in insertion order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The unique entity mapped to `table`, compared case-insensitively.
    pub fn entity_by_table(&self, table: &str) -> Option<&Entity> {
        let mut matches = self
            .entities()
            .filter(|entity| entity.table_name.eq_ignore_ascii_case(table));

        match (matches.next(), matches.next()) {
            (Some(entity), None) => Some(entity),
            _ => None,
        }
    }

    /// Entities whose simple type name is `name`, in insertion order.
    pub fn entities_named(&self, name: &str) -> Vec<&Entity> {
        self.entities()
            .filter(|entity| entity.ty.simple_name() == name)
            .collect()
    }
}
