//! Extraction Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// [`Parse`](Self::Parse) means the response body could not be decoded at
/// all. Every other kind is a *populate* error: the body decoded, but it does
/// not describe a usable archive entry.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The response body is not a well-formed API payload.
    #[display("malformed response")]
    Parse,
    /// The API itself reported an error (unknown id, bad request).
    #[display("API error: {_0}")]
    Populate(#[error(not(source))] String),
    /// A required field is absent or empty.
    #[display("missing required field: {_0}")]
    MissingField(#[error(not(source))] &'static str),
    /// A field was found but could not be interpreted.
    #[display("invalid field '{field}', found value: {value}")]
    InvalidField {
        /// The field that failed to parse.
        field: &'static str,
        /// The offending value.
        value: String,
    },
}

impl ErrorKind {
    /// Returns `true` for errors that count against the crawl's populate
    /// error budget.
    pub fn is_populate_error(&self) -> bool {
        !matches!(self, ErrorKind::Parse)
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A response is either usable or it isn't; fetching it again yields
        // the same bytes.
        false
    }
}
