mod error;
pub use error::Error;

pub mod graph;
pub use graph::EntityGraph;

pub mod junction;
pub use junction::{JunctionKey, JunctionSynthesizer};

pub mod resolve;
pub use resolve::{Resolution, Resolver};

pub mod schema;

pub mod validate;
pub use validate::{Diagnostic, Diagnostics, Severity, Validator};

/// A Result type alias that uses relata's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
