use crate::ContainerFormat;
use std::fmt::{Display, Formatter, Result as FmtResult};

impl Display for ContainerFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl AsRef<str> for ContainerFormat {
    fn as_ref(&self) -> &'static str {
        self.as_str()
    }
}

impl ContainerFormat {
    /// Returns the canonical file extension for this format.
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::Zip => ".zip",
            ContainerFormat::Wad => ".wad",
        }
    }

    /// Returns the short name (for displaying to user).
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerFormat::Zip => "zip",
            ContainerFormat::Wad => "wad",
        }
    }
}

/// Little-endian field readers for fixed-layout directory records.
///
/// Callers guarantee `buf` is long enough; every record is length-checked
/// before any field is read.
pub(crate) fn u16_at(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

pub(crate) fn u32_at(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

pub(crate) fn i32_at(buf: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}
