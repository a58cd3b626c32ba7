use super::Error;

/// Error when a declared type expression cannot be parsed.
#[derive(Debug)]
pub(super) struct InvalidTypeError {
    input: Box<str>,
    reason: Box<str>,
}

impl std::error::Error for InvalidTypeError {}

impl core::fmt::Display for InvalidTypeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid type `{}`: {}", self.input, self.reason)
    }
}

impl Error {
    /// Creates an invalid type error for the type expression `input`.
    pub fn invalid_type(input: impl Into<String>, reason: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidType(InvalidTypeError {
            input: input.into().into(),
            reason: reason.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid type error.
    pub fn is_invalid_type(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidType(_))
    }
}
