use super::{AssociativeEntity, Cardinality, CascadeAction, ReferentialAction, Type, TypePath};
use crate::{Error, Result};
use indexmap::IndexSet;
use std::fmt;

/// One attribute of an entity: a scalar column or an association.
///
/// Attributes are value objects. Once the owning entity has been added to an
/// [`EntityGraph`](crate::EntityGraph) they are never changed; resolution
/// results are reported separately as [`Link`](crate::resolve::Link)s.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    /// The attribute name, unique within its entity
    pub name: String,

    /// Declared value type
    pub ty: Type,

    /// `None` for scalar attributes
    pub cardinality: Option<Cardinality>,

    pub foreign_key: bool,
    pub unique: bool,
    pub nullable: bool,

    /// True if the attribute is part of the entity key
    pub key: bool,

    pub generated: bool,

    /// Name of the inverse attribute on the referenced entity
    pub mapped_by: Option<String>,

    pub referenced_column: Option<String>,
    pub referenced_type: Option<Type>,
    pub referenced_table: Option<String>,

    pub delete_action: Option<ReferentialAction>,
    pub update_action: Option<ReferentialAction>,

    pub cascade: IndexSet<CascadeAction>,

    /// Junction declaration. Only valid on many-to-many attributes.
    pub associative_entity: Option<AssociativeEntity>,
}

/// Identifies an attribute across the graph.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeRef {
    pub entity: TypePath,
    pub attribute: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, ty: impl Into<Type>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            cardinality: None,
            foreign_key: false,
            unique: false,
            nullable: false,
            key: false,
            generated: false,
            mapped_by: None,
            referenced_column: None,
            referenced_type: None,
            referenced_table: None,
            delete_action: None,
            update_action: None,
            cascade: IndexSet::new(),
            associative_entity: None,
        }
    }

    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    pub fn generated(mut self) -> Self {
        self.generated = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn foreign_key(mut self) -> Self {
        self.foreign_key = true;
        self
    }

    pub fn cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = Some(cardinality);
        self
    }

    pub fn one_to_one(self) -> Self {
        self.cardinality(Cardinality::OneToOne)
    }

    pub fn one_to_many(self) -> Self {
        self.cardinality(Cardinality::OneToMany)
    }

    pub fn many_to_one(self) -> Self {
        self.cardinality(Cardinality::ManyToOne)
    }

    pub fn many_to_many(self) -> Self {
        self.cardinality(Cardinality::ManyToMany)
    }

    pub fn mapped_by(mut self, name: impl Into<String>) -> Self {
        self.mapped_by = Some(name.into());
        self
    }

    pub fn references_type(mut self, ty: impl Into<Type>) -> Self {
        self.referenced_type = Some(ty.into());
        self
    }

    pub fn references_table(mut self, table: impl Into<String>) -> Self {
        self.referenced_table = Some(table.into());
        self
    }

    pub fn references_column(mut self, column: impl Into<String>) -> Self {
        self.referenced_column = Some(column.into());
        self
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.delete_action = Some(action);
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.update_action = Some(action);
        self
    }

    pub fn cascade(mut self, action: CascadeAction) -> Self {
        self.cascade.insert(action);
        self
    }

    pub fn junction(mut self, associative: AssociativeEntity) -> Self {
        self.associative_entity = Some(associative);
        self
    }

    pub fn is_association(&self) -> bool {
        self.cardinality.is_some()
    }

    pub fn is_many_to_many(&self) -> bool {
        self.cardinality.is_some_and(Cardinality::is_many_to_many)
    }

    /// The declared type with one level of collection wrapping removed.
    pub fn element_ty(&self) -> &Type {
        self.ty.element()
    }

    pub(crate) fn verify(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::invalid_schema("attribute name must not be empty"));
        }

        if self.associative_entity.is_some() && !self.is_many_to_many() {
            return Err(Error::invalid_schema(format!(
                "attribute `{}` declares a junction table but is {}, not ManyToMany",
                self.name,
                self.cardinality
                    .map(|cardinality| cardinality.to_string())
                    .unwrap_or_else(|| "a scalar".to_string()),
            )));
        }

        Ok(())
    }
}

impl AttributeRef {
    pub fn new(entity: impl Into<TypePath>, attribute: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            attribute: attribute.into(),
        }
    }
}

impl fmt::Display for AttributeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.entity, self.attribute)
    }
}

impl fmt::Debug for AttributeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttributeRef({self})")
    }
}
