//! Entity schema descriptors
//!
//! Everything in this module is a plain value: built once from external
//! declarations (or synthesized during resolution) and never mutated after
//! being handed to an [`EntityGraph`](crate::EntityGraph).

mod associative;
pub use associative::{AssociativeEntity, AssociativeKind, AssociativeReference};

mod attribute;
pub use attribute::{Attribute, AttributeRef};

mod cardinality;
pub use cardinality::{Cardinality, CascadeAction, ReferentialAction};

mod embeddable;
pub use embeddable::Embeddable;

mod entity;
pub use entity::{Entity, EntityBuilder, DEFAULT_MODEL};

mod name;
pub use name::Name;

mod ty;
pub use ty::{Type, TypePath};
