use super::Error;

/// Error when two different declarations claim the same entity identity.
///
/// Re-adding an identical entity is not an error; the graph treats it as a
/// no-op. Synthesized junctions that collide with a resident entity are also
/// not errors, they count as already synthesized.
#[derive(Debug)]
pub(super) struct DuplicateEntityError {
    entity: Box<str>,
}

impl std::error::Error for DuplicateEntityError {}

impl core::fmt::Display for DuplicateEntityError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "entity `{}` is declared more than once with different definitions",
            self.entity
        )
    }
}

impl Error {
    /// Creates a duplicate entity error.
    pub fn duplicate_entity(entity: impl core::fmt::Display) -> Error {
        Error::from(super::ErrorKind::DuplicateEntity(DuplicateEntityError {
            entity: entity.to_string().into(),
        }))
    }

    /// Returns `true` if this error is a duplicate entity error.
    pub fn is_duplicate_entity(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::DuplicateEntity(_))
    }
}
