use super::{Attribute, AttributeRef, TypePath};
use crate::{Error, Result};
use indexmap::IndexMap;

/// The model an entity belongs to when none is given.
pub const DEFAULT_MODEL: &str = "default";

/// One entity schema.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entity {
    /// Uniquely identifies the entity
    pub ty: TypePath,

    pub table_name: String,

    /// Entities are partitioned into independent models. References are only
    /// resolved within a model.
    pub model: String,

    /// Attributes in declaration order
    pub attributes: IndexMap<String, Attribute>,

    pub read_only: bool,
    pub cacheable: bool,
    pub stateless: bool,

    /// True for junction entities produced during resolution
    pub synthesized: bool,
}

#[derive(Debug)]
pub struct EntityBuilder {
    ty: TypePath,
    table_name: Option<String>,
    model: Option<String>,
    attributes: Vec<Attribute>,
    read_only: bool,
    cacheable: bool,
    stateless: bool,
    synthesized: bool,
}

impl Entity {
    pub fn builder(ty: impl Into<TypePath>) -> EntityBuilder {
        EntityBuilder {
            ty: ty.into(),
            table_name: None,
            model: None,
            attributes: vec![],
            read_only: false,
            cacheable: false,
            stateless: false,
            synthesized: false,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> + '_ {
        self.attributes.values()
    }

    pub fn key_attributes(&self) -> impl Iterator<Item = &Attribute> + '_ {
        self.attributes().filter(|attribute| attribute.key)
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &Attribute> + '_ {
        self.attributes().filter(|attribute| attribute.foreign_key)
    }

    pub fn associations(&self) -> impl Iterator<Item = &Attribute> + '_ {
        self.attributes().filter(|attribute| attribute.is_association())
    }

    /// The single key attribute, if the entity has exactly one.
    pub fn single_key(&self) -> Option<&Attribute> {
        let mut keys = self.key_attributes();
        match (keys.next(), keys.next()) {
            (Some(key), None) => Some(key),
            _ => None,
        }
    }

    pub fn attribute_ref(&self, attribute: &Attribute) -> AttributeRef {
        AttributeRef::new(&self.ty, attribute.name.clone())
    }

    pub(crate) fn verify(&self) -> Result<()> {
        if self.ty.is_empty() {
            return Err(Error::invalid_schema("entity type name must not be empty"));
        }

        for attribute in self.attributes() {
            attribute
                .verify()
                .map_err(|err| err.context(Error::invalid_schema(format!("entity `{}`", self.ty))))?;
        }

        Ok(())
    }
}

impl EntityBuilder {
    /// Table name; defaults to the simple type name.
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    pub fn model(mut self, name: impl Into<String>) -> Self {
        self.model = Some(name.into());
        self
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn cacheable(mut self) -> Self {
        self.cacheable = true;
        self
    }

    pub fn stateless(mut self) -> Self {
        self.stateless = true;
        self
    }

    pub(crate) fn synthesized(mut self) -> Self {
        self.synthesized = true;
        self
    }

    pub fn build(self) -> Result<Entity> {
        let mut attributes = IndexMap::with_capacity(self.attributes.len());

        for attribute in self.attributes {
            if attributes.contains_key(&attribute.name) {
                return Err(Error::invalid_schema(format!(
                    "entity `{}` declares attribute `{}` more than once",
                    self.ty, attribute.name
                )));
            }
            attributes.insert(attribute.name.clone(), attribute);
        }

        let entity = Entity {
            table_name: self
                .table_name
                .unwrap_or_else(|| self.ty.simple_name().to_string()),
            ty: self.ty,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            attributes,
            read_only: self.read_only,
            cacheable: self.cacheable,
            stateless: self.stateless,
            synthesized: self.synthesized,
        };

        entity.verify()?;
        Ok(entity)
    }
}
