//! Schema Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A schema definition error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for schema operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The definition file could not be read.
    #[display("cannot read schema definition: {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    /// The definition file could not be written.
    #[display("cannot write schema definition: {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
    /// The document is not valid TOML or does not have the expected shape.
    #[display("malformed schema definition")]
    Parse,
    #[display("cannot serialize schema definition")]
    Serialize,
    /// A block is structurally valid but unusable (empty name or SQL).
    #[display("invalid schema block: {_0}")]
    Invalid(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Read(_) | ErrorKind::Write(_))
    }
}
