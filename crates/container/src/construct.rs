use crate::ContainerFormat;
use crate::error::{Error, ErrorKind};
use std::{path::Path, str::FromStr};

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
// An empty archive is nothing but its end-of-central-directory record.
const ZIP_EMPTY_MAGIC: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];
const IWAD_MAGIC: [u8; 4] = *b"IWAD";
const PWAD_MAGIC: [u8; 4] = *b"PWAD";

impl FromStr for ContainerFormat {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zip" | "pk3" => Ok(ContainerFormat::Zip),
            "wad" | "iwad" | "pwad" => Ok(ContainerFormat::Wad),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(s.to_string())),
        }
    }
}
impl ContainerFormat {
    /// Detect the container format from a file extension.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse::<ContainerFormat>().ok())
    }

    /// Detect the container format from magic bytes.
    ///
    /// Returns `None` if no magic bytes match or if the input is too short to
    /// detect any format.
    #[must_use]
    pub fn from_magic_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&ZIP_MAGIC) || bytes.starts_with(&ZIP_EMPTY_MAGIC) {
            return Some(ContainerFormat::Zip);
        }
        if bytes.starts_with(&IWAD_MAGIC) || bytes.starts_with(&PWAD_MAGIC) {
            return Some(ContainerFormat::Wad);
        }
        None
    }

    /// Magic bytes win over the extension; a `.zip` that starts with `PWAD`
    /// is a WAD.
    pub(crate) fn detect(head: &[u8], path: &Path) -> crate::error::Result<Self> {
        match Self::from_magic_bytes(head).or_else(|| Self::from_path(path)) {
            Some(format) => Ok(format),
            None => exn::bail!(ErrorKind::UnsupportedFormat(path.display().to_string())),
        }
    }
}
