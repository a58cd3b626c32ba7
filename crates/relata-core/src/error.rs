mod adhoc;
mod duplicate_entity;
mod invalid_schema;
mod invalid_type;
mod round_limit;

use adhoc::AdhocError;
use duplicate_entity::DuplicateEntityError;
use invalid_schema::InvalidSchemaError;
use invalid_type::InvalidTypeError;
use round_limit::RoundLimitError;
use std::sync::Arc;

/// Returns early with an ad-hoc formatted [`Error`].
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Creates an ad-hoc formatted [`Error`].
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// A process-level failure of the resolution engine.
///
/// Relationship problems found while validating the entity graph are not
/// errors; they are reported as [`Diagnostic`](crate::validate::Diagnostic)
/// values. An `Error` is only returned when the process as a whole cannot
/// succeed: a malformed declaration, a runaway resolution loop, or a graph
/// that reached a fixed point with error diagnostics still present.
#[derive(Clone)]
pub struct Error {
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

impl Error {
    /// Adds context to this error.
    ///
    /// Context is displayed in reverse order: the most recently added context
    /// is shown first, followed by earlier context, ending with the root cause.
    #[inline(always)]
    pub fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let inner = consequent
            .inner
            .unwrap_or_else(|| Arc::new(ErrorInner::new(ErrorKind::Unknown)));

        // The consequent was just created by the caller, so it is normally
        // uniquely owned. When it is shared, rebuild it around a copy of the
        // message so the chain can still be attached.
        let mut inner = match Arc::try_unwrap(inner) {
            Ok(inner) => inner,
            Err(shared) => ErrorInner::new(ErrorKind::Adhoc(AdhocError::new(
                shared.kind.to_string(),
            ))),
        };

        assert!(
            inner.cause.is_none(),
            "consequent error must not already have a cause"
        );
        inner.cause = Some(self);

        Error {
            inner: Some(Arc::new(inner)),
        }
    }

    /// Creates an ad-hoc error from formatted arguments.
    ///
    /// Prefer the [`err!`] and [`bail!`] macros.
    pub fn from_args(args: core::fmt::Arguments<'_>) -> Error {
        Error::from(ErrorKind::Adhoc(AdhocError::new(args.to_string())))
    }

    /// The innermost error of the context chain.
    pub fn root(&self) -> &Error {
        let mut err = self;
        while let Some(cause) = err.inner.as_ref().and_then(|inner| inner.cause.as_ref()) {
            err = cause;
        }
        err
    }

    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        core::iter::once(err).chain(core::iter::from_fn(move || {
            err = err.inner.as_ref().and_then(|inner| inner.cause.as_ref())?;
            Some(err)
        }))
    }

    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }
}

impl ErrorInner {
    fn new(kind: ErrorKind) -> ErrorInner {
        ErrorInner { kind, cause: None }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner
            .as_ref()
            .and_then(|inner| inner.cause.as_ref())
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            let Some(ref inner) = self.inner else {
                return f.debug_struct("Error").field("kind", &"None").finish();
            };
            f.debug_struct("Error")
                .field("kind", &inner.kind)
                .field("cause", &inner.cause)
                .finish()
        }
    }
}

#[derive(Debug)]
enum ErrorKind {
    Adhoc(AdhocError),
    InvalidSchema(InvalidSchemaError),
    InvalidType(InvalidTypeError),
    DuplicateEntity(DuplicateEntityError),
    RoundLimit(RoundLimitError),
    Unknown,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self {
            Adhoc(err) => core::fmt::Display::fmt(err, f),
            InvalidSchema(err) => core::fmt::Display::fmt(err, f),
            InvalidType(err) => core::fmt::Display::fmt(err, f),
            DuplicateEntity(err) => core::fmt::Display::fmt(err, f),
            RoundLimit(err) => core::fmt::Display::fmt(err, f),
            Unknown => f.write_str("unknown relata error"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Some(Arc::new(ErrorInner::new(kind))),
        }
    }
}

/// Trait for types that can be converted into an Error.
pub trait IntoError {
    /// Converts this type into an Error.
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_size() {
        // Ensure Error stays at one word (size of pointer/Arc)
        let expected_size = core::mem::size_of::<usize>();
        assert_eq!(expected_size, core::mem::size_of::<Error>());
    }

    #[test]
    fn error_from_args() {
        let err = Error::from_args(format_args!("test error: {}", 42));
        assert_eq!(err.to_string(), "test error: 42");
    }

    #[test]
    fn error_chain_display() {
        let root = err!("root cause");
        let mid = err!("middle context");
        let top = err!("top context");

        let chained = root.context(mid).context(top);
        assert_eq!(
            chained.to_string(),
            "top context: middle context: root cause"
        );
        assert_eq!(chained.root().to_string(), "root cause");
    }

    #[test]
    fn context_on_shared_consequent() {
        let consequent = err!("while resolving");
        let _keep = consequent.clone();

        let err = err!("boom").context(consequent);
        assert_eq!(err.to_string(), "while resolving: boom");
    }

    #[test]
    fn source_follows_cause() {
        use std::error::Error as _;

        let err = err!("root").context(err!("outer"));
        let source = err.source().expect("cause is exposed as source");
        assert_eq!(source.to_string(), "root");
    }

    #[test]
    fn invalid_schema_error() {
        let err = Error::invalid_schema("`Person::groups` has no junction");
        assert!(err.is_invalid_schema());
        assert_eq!(
            err.to_string(),
            "invalid schema: `Person::groups` has no junction"
        );
    }

    #[test]
    fn invalid_type_error() {
        let err = Error::invalid_type("Vec<", "unterminated generic argument list");
        assert!(err.is_invalid_type());
        assert_eq!(
            err.to_string(),
            "invalid type `Vec<`: unterminated generic argument list"
        );
    }

    #[test]
    fn duplicate_entity_error() {
        let err = Error::duplicate_entity("app::Person");
        assert!(err.is_duplicate_entity());
        assert_eq!(
            err.to_string(),
            "entity `app::Person` is declared more than once with different definitions"
        );
    }

    #[test]
    fn round_limit_error_with_context() {
        let err = Error::round_limit(64).context(err!("resolving model `default`"));
        assert!(!err.is_round_limit());
        assert!(err.root().is_round_limit());
        assert_eq!(
            err.to_string(),
            "resolving model `default`: resolution did not reach a fixed point within 64 rounds"
        );
    }
}
