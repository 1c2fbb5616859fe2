//! Catalog Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// [`Prepare`](Self::Prepare) points at the schema (a statement does not fit
/// the tables it runs against); [`Execute`](Self::Execute) points at the
/// data (constraint violations, duplicate ids or paths).
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("cannot open catalog database")]
    Connect,
    #[display("failed to prepare statement")]
    Prepare,
    #[display("failed to execute statement")]
    Execute,
    /// Blocks already applied to the database have since been edited.
    #[display("schema drift in blocks: {}", _0.join(", "))]
    SchemaDrift(#[error(not(source))] Vec<String>),
    /// The schema definition itself is unusable.
    #[display("invalid schema definition")]
    Schema,
    /// A value does not fit its column (or a column value its field).
    #[display("invalid catalog data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Connect)
    }
}
