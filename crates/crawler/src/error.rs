//! Crawler Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A crawler error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// [`Transport`](Self::Transport) and [`Status`](Self::Status) end a crawl;
/// [`Inspect`](Self::Inspect) only costs the record its enrichment;
/// [`Persist`](Self::Persist) is handed back to the caller.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request could not be sent or its response could not be read.
    #[display("transport error")]
    Transport,
    /// The API answered with a non-success HTTP status.
    #[display("HTTP status {_0}")]
    Status(#[error(not(source))] u16),
    /// The catalog rejected a record.
    #[display("failed to persist record {_0}")]
    Persist(#[error(not(source))] u64),
    /// A mirrored container could not be inspected.
    #[display("failed to inspect container: {_0}")]
    Inspect(#[error(not(source))] String),
    #[display("invalid API URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    #[display("invalid crawl policy: {_0}")]
    InvalidPolicy(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::Transport => true,
            ErrorKind::Status(status) => *status >= 500,
            _ => false,
        }
    }
}
