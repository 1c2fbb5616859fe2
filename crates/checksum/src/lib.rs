//! Content digests.
//!
//! A [`Checksum`] is the identity of a byte stream: the BLAKE3 hash (primary
//! identity, used for duplicate detection across the catalog), a CRC32 (cheap
//! cross-check against container directories) and the stream length.
//!
//! [`Digest`] is cumulative: every [`update`](Digest::update) extends the same
//! stream. Anything that needs independent checksums (one per schema block,
//! one per container member) must use a fresh digest or
//! [`finalize_reset`](Digest::finalize_reset) between inputs.

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use tracing::instrument;

/// Identity of a byte stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    /// Hex-encoded BLAKE3 hash.
    pub hash: String,
    pub crc32: u32,
    /// Number of bytes digested.
    pub length: u64,
}
impl Display for Checksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.hash)
    }
}
impl AsRef<str> for Checksum {
    fn as_ref(&self) -> &str {
        &self.hash
    }
}

/// Anything that can report the checksum of its own content.
pub trait ChecksumSource {
    fn checksum(&self) -> Result<Checksum>;
}

/// Cumulative digest over one logical byte stream.
#[derive(Debug, Clone, Default)]
pub struct Digest {
    blake3: blake3::Hasher,
    crc32: crc32fast::Hasher,
    length: u64,
}
impl Digest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the stream with more bytes.
    pub fn update(&mut self, bytes: &[u8]) -> &mut Self {
        self.blake3.update(bytes);
        self.crc32.update(bytes);
        // usize always fits into u64 on supported platforms.
        self.length += bytes.len() as u64;
        self
    }

    /// Extend the stream with a length-prefixed field.
    ///
    /// Framing each field keeps multi-field digests unambiguous: `("ab", "c")`
    /// and `("a", "bc")` produce different checksums.
    pub fn update_field(&mut self, field: impl AsRef<[u8]>) -> &mut Self {
        let field = field.as_ref();
        self.update(&(field.len() as u64).to_le_bytes());
        self.update(field)
    }

    /// Bytes digested so far.
    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Checksum of everything digested so far; the digest keeps accumulating.
    pub fn finalize(&self) -> Checksum {
        Checksum {
            hash: self.blake3.finalize().to_string(),
            crc32: self.crc32.clone().finalize(),
            length: self.length,
        }
    }

    /// Checksum of everything digested so far, then start a new stream.
    pub fn finalize_reset(&mut self) -> Checksum {
        let checksum = self.finalize();
        self.reset();
        checksum
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
impl Write for Digest {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Checksum of an in-memory byte slice.
pub fn checksum(bytes: impl AsRef<[u8]>) -> Checksum {
    let mut digest = Digest::new();
    digest.update(bytes.as_ref());
    digest.finalize()
}

/// Checksum of everything a reader yields, streamed without buffering it all.
pub fn checksum_reader<R: Read>(mut reader: R) -> Result<Checksum> {
    let mut digest = Digest::new();
    std::io::copy(&mut reader, &mut digest).or_raise(|| ErrorKind::Io)?;
    Ok(digest.finalize())
}

/// Checksum of the raw bytes of a file on disk.
#[instrument(fields(path = %path.as_ref().display()))]
pub fn checksum_file(path: impl AsRef<Path>) -> Result<Checksum> {
    let path = path.as_ref();
    let file = File::open(path).or_raise(|| ErrorKind::Open(path.to_path_buf()))?;
    checksum_reader(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    #[test]
    fn test_repeated_checksums_are_identical() {
        let bytes = b"PWAD\x01\x00\x00\x00";
        let mut digest = Digest::new();
        digest.update(b"some unrelated earlier content");
        digest.finalize_reset();
        digest.update(bytes);
        assert_eq!(digest.finalize(), checksum(bytes));
        assert_eq!(checksum(bytes), checksum(bytes));
    }

    #[test]
    fn test_digest_is_cumulative() {
        let mut digest = Digest::new();
        digest.update(b"hello ");
        digest.update(b"world");
        assert_eq!(digest.finalize(), checksum(b"hello world"));
        assert_eq!(digest.len(), 11);
        // Finalizing does not reset.
        digest.update(b"!");
        assert_eq!(digest.finalize(), checksum(b"hello world!"));
    }

    #[test]
    fn test_field_framing() {
        let mut a = Digest::new();
        a.update_field("ab").update_field("c");
        let mut b = Digest::new();
        b.update_field("a").update_field("bc");
        assert_ne!(a.finalize(), b.finalize());
    }

    #[rstest]
    #[case(b"")]
    #[case(b"x")]
    #[case(b"The quick brown fox jumps over the lazy dog")]
    fn test_reader_matches_slice(#[case] bytes: &[u8]) {
        let streamed = checksum_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(streamed, checksum(bytes));
        assert_eq!(streamed.crc32, crc32fast::hash(bytes));
        assert_eq!(streamed.hash, blake3::hash(bytes).to_string());
    }

    #[test]
    fn test_checksum_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"IWAD").unwrap();
        let from_file = checksum_file(file.path()).unwrap();
        assert_eq!(from_file, checksum(b"IWAD"));
        assert_eq!(from_file.to_string(), from_file.hash);
    }

    #[test]
    fn test_checksum_missing_file() {
        let err = checksum_file("/definitely/not/here.zip").unwrap_err();
        assert!(matches!(*err, ErrorKind::Open(_)));
    }
}
