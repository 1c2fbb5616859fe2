//! Container Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A container error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for container operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
/// [`Read`](Self::Read) and [`Extract`](Self::Extract) are the two top-level
/// kinds callers see; the others appear beneath them in the error tree.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The container could not be opened or its directory could not be read.
    #[display("cannot read container: {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    /// A member could not be extracted. Members extracted earlier in the same
    /// call remain on disk.
    #[display("failed to extract member: {member}")]
    Extract {
        /// Name of the member that failed.
        member: String,
    },
    /// Neither the magic bytes nor the file extension identify a known format.
    #[display("unsupported container format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// The member uses a storage method (or encryption) that isn't supported.
    #[display("unsupported storage method: {_0}")]
    UnsupportedMethod(#[error(not(source))] String),
    /// The container structure is inconsistent (bad offsets, bad checksum).
    #[display("corrupt container: {_0}")]
    Corrupt(#[error(not(source))] String),
    /// No member with the requested name exists.
    #[display("no such member: {_0}")]
    MissingMember(#[error(not(source))] String),
    /// The member name would escape the extraction directory.
    #[display("unsafe member name: {_0}")]
    UnsafeName(#[error(not(source))] String),
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Io)
    }
}
