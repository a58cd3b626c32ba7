use super::{Attribute, TypePath};
use indexmap::IndexMap;

/// A value type whose attributes are flattened into the entity embedding it.
///
/// Embeddables are never relationship targets.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Embeddable {
    pub ty: TypePath,
    pub attributes: IndexMap<String, Attribute>,
}

impl Embeddable {
    pub fn new(ty: impl Into<TypePath>) -> Self {
        Self {
            ty: ty.into(),
            attributes: IndexMap::new(),
        }
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.insert(attribute.name.clone(), attribute);
        self
    }
}
