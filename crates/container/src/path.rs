//! Member name sanitization.
//!
//! Member names come from untrusted container directories; they must never
//! be allowed to write outside the extraction directory.

use crate::error::{ErrorKind, Result};
use exn::OptionExt;
use std::path::PathBuf;

/// Map a member name onto a relative path below the extraction directory.
///
/// Both `/` and `\` separate directories, since archives built on DOS use
/// the latter. Empty and `.` segments are dropped; `..` cancels the segment
/// before it but may not climb above the top. Drive specifiers (any segment
/// with a `:`), NUL bytes and names that reduce to nothing are
/// [`UnsafeName`](ErrorKind::UnsafeName).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use idmirror_container::sanitize_member_name;
/// assert!(sanitize_member_name("maps/av.wad").is_ok());
/// assert!(sanitize_member_name("../../etc/passwd").is_err());
/// assert_eq!(sanitize_member_name("/abs/./av.txt").unwrap(), Path::new("abs/av.txt"));
/// ```
pub fn sanitize(name: &str) -> Result<PathBuf> {
    let unsafe_name = || ErrorKind::UnsafeName(name.to_string());
    if name.contains('\0') {
        exn::bail!(unsafe_name());
    }
    let mut segments: Vec<&str> = Vec::new();
    for segment in name.split(['/', '\\']) {
        match segment {
            "" | "." => {},
            ".." => {
                segments.pop().ok_or_raise(unsafe_name)?;
            },
            drive if drive.contains(':') => exn::bail!(unsafe_name()),
            segment => segments.push(segment),
        }
    }
    if segments.is_empty() {
        exn::bail!(unsafe_name());
    }
    Ok(segments.iter().collect())
}
