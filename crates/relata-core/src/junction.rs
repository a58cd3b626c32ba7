//! Junction entities backing many-to-many relationships

use crate::graph::EntityGraph;
use crate::schema::{
    AssociativeEntity, AssociativeReference, Attribute, Entity, Name, Type, TypePath,
};
use crate::{bail, err, Result};
use std::fmt;

/// Identifies a junction request: the many-to-many attribute `attribute`
/// declared on `from`, pointing at `to`.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JunctionKey {
    pub from: TypePath,
    pub to: TypePath,
    pub attribute: String,
}

/// Builds junction entities for many-to-many attributes.
///
/// The synthesizer only reads the graph. New junction entities are returned
/// to the caller, which inserts them on the next resolution round.
#[derive(Debug)]
pub struct JunctionSynthesizer<'a> {
    graph: &'a EntityGraph,
    separator: &'a str,
}

impl<'a> JunctionSynthesizer<'a> {
    pub fn new(graph: &'a EntityGraph) -> Self {
        Self {
            graph,
            separator: "_",
        }
    }

    /// Separator placed between the two table names of a derived junction
    /// table name.
    pub fn separator(mut self, separator: &'a str) -> Self {
        self.separator = separator;
        self
    }

    /// The junction table name for `from.attribute`: the declared name if
    /// there is one, otherwise both table names joined by the separator.
    pub fn table_name(&self, from: &Entity, to: &Entity, attribute: &Attribute) -> String {
        match attribute
            .associative_entity
            .as_ref()
            .and_then(AssociativeEntity::table_name)
        {
            Some(name) => name.to_string(),
            None => format!("{}{}{}", from.table_name, self.separator, to.table_name),
        }
    }

    /// Builds the junction entity for `key`.
    ///
    /// Returns `Ok(None)` if an entity mapped to the junction table is
    /// already in the graph.
    pub fn synthesize(&self, key: &JunctionKey) -> Result<Option<Entity>> {
        let graph = self.graph;

        let from = graph
            .entity(&key.from)
            .ok_or_else(|| err!("junction source `{}` is not in the graph", key.from))?;
        let to = graph
            .entity(&key.to)
            .ok_or_else(|| err!("junction target `{}` is not in the graph", key.to))?;
        let attribute = from.attribute(&key.attribute).ok_or_else(|| {
            err!(
                "junction source `{}` has no attribute `{}`",
                key.from,
                key.attribute
            )
        })?;

        let table = self.table_name(from, to, attribute);

        if graph
            .entities()
            .any(|entity| entity.table_name.eq_ignore_ascii_case(&table))
        {
            log::debug!("junction `{table}` already present; skipping");
            return Ok(None);
        }

        let associative = match &attribute.associative_entity {
            Some(declared) if !declared.references.is_empty() => AssociativeEntity {
                name: table.clone(),
                ..declared.clone()
            },
            _ => AssociativeEntity::default_between(&table, from, to, &attribute.name),
        };

        let ty = from.ty.sibling(&Name::new(&table).upper_camel_case());

        if let Some(existing) = graph.entity(&ty) {
            bail!(
                "junction `{table}` for `{}::{}` would be named `{ty}`, which is already mapped to table `{}`",
                key.from,
                key.attribute,
                existing.table_name
            );
        }

        let mut builder = Entity::builder(ty)
            .table(&table)
            .model(&from.model)
            .synthesized();

        for (index, reference) in associative.references.iter().enumerate() {
            let endpoint = match index {
                0 => Some(from),
                1 => Some(to),
                _ => None,
            };

            builder = builder.attribute(self.key_column(&table, reference, endpoint)?);
        }

        let junction = builder.build()?;

        log::debug!(
            "synthesized junction `{}` (table `{}`) for `{}::{}`",
            junction.ty,
            junction.table_name,
            key.from,
            key.attribute
        );

        Ok(Some(junction))
    }

    /// One key column of a junction, pointing at the column's declared
    /// entity or, when none is declared, the endpoint at its position.
    fn key_column(
        &self,
        table: &str,
        reference: &AssociativeReference,
        endpoint: Option<&Entity>,
    ) -> Result<Attribute> {
        let target = match &reference.referenced {
            Some(path) => self.graph.entity_by_path(path),
            None => endpoint,
        };

        let referenced = match (&reference.referenced, target) {
            (Some(path), None) => path.clone(),
            (_, Some(target)) => target.ty.clone(),
            (None, None) => bail!(
                "junction `{table}` column `{}` has no referenced entity",
                reference.name
            ),
        };

        let key = target.and_then(Entity::single_key);

        let mut column = Attribute::new(
            &reference.name,
            key.map_or(Type::I64, |key| key.ty.clone()),
        )
        .key()
        .foreign_key()
        .references_type(Type::Path(referenced))
        .on_delete(reference.on_delete)
        .on_update(reference.on_update);

        if let Some(key) = key {
            column = column.references_column(&key.name);
        }

        Ok(column)
    }
}

impl fmt::Display for JunctionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{} -> {}", self.from, self.attribute, self.to)
    }
}

impl fmt::Debug for JunctionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JunctionKey({self})")
    }
}
