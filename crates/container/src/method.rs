//! Member storage methods.

use crate::error::{ErrorKind, Result};
use bzip2::read::BzDecoder;
use flate2::read::DeflateDecoder;
use std::io::Read;

/// How a member's bytes are stored inside the container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// Raw bytes (zip method 0, every WAD lump).
    Stored,
    /// Raw deflate stream (zip method 8).
    Deflated,
    /// Bzip2 stream (zip method 12).
    Bzip2,
    /// Anything else; listed but not extractable.
    Unsupported(u16),
}
impl From<u16> for Method {
    fn from(code: u16) -> Self {
        match code {
            0 => Method::Stored,
            8 => Method::Deflated,
            12 => Method::Bzip2,
            other => Method::Unsupported(other),
        }
    }
}
impl Method {
    /// Wrap a reader over the stored bytes with the matching decoder.
    pub(crate) fn wrap_reader<'a, R: Read + 'a>(&self, reader: R) -> Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Method::Stored => Box::new(reader),
            Method::Deflated => Box::new(DeflateDecoder::new(reader)),
            Method::Bzip2 => Box::new(BzDecoder::new(reader)),
            Method::Unsupported(code) => exn::bail!(ErrorKind::UnsupportedMethod(format!("zip method {code}"))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression as Level;
    use flate2::write::DeflateEncoder;
    use rstest::rstest;
    use std::io::Write;

    #[rstest]
    #[case(0, Method::Stored)]
    #[case(8, Method::Deflated)]
    #[case(12, Method::Bzip2)]
    #[case(14, Method::Unsupported(14))]
    fn test_from_code(#[case] code: u16, #[case] expected: Method) {
        assert_eq!(Method::from(code), expected);
    }

    #[test]
    fn test_wrap_reader_deflate() {
        let original = b"E1M1 E1M2 E1M3 E1M4 E1M5 E1M6 E1M7 E1M8 E1M9";
        let mut encoder = DeflateEncoder::new(Vec::new(), Level::best());
        encoder.write_all(original).unwrap();
        let compressed = encoder.finish().unwrap();
        let mut reader = Method::Deflated.wrap_reader(compressed.as_slice()).unwrap();
        let mut decompressed = Vec::new();
        reader.read_to_end(&mut decompressed).unwrap();
        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_wrap_reader_unsupported() {
        let err = Method::Unsupported(99).wrap_reader(&b""[..]).err().unwrap();
        assert!(matches!(*err, ErrorKind::UnsupportedMethod(_)));
    }
}
