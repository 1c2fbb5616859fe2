//! Container inspection with automatic format detection.
//!
//! This crate hides two very different container formats behind a single
//! [`Container`] type:
//!
//! - **Zip** archives (`.zip`, `.pk3`): a central directory of stored,
//!   deflated or bzip2-compressed members.
//! - **WAD** files (`IWAD`/`PWAD`): a flat directory of named,
//!   offset-addressed lumps with no compression.
//!
//! Opening is an explicit, one-time operation ([`Container::open`]): it reads
//! the member directory, caches it for the lifetime of the value, and computes
//! the whole-file [`Checksum`](idmirror_checksum::Checksum) over the raw
//! bytes on disk. Extraction re-reads member data on demand but never the
//! directory.

mod construct;
mod container;
pub mod error;
mod extract;
mod levels;
mod method;
mod path;
mod util;
mod wad;
mod zip;

pub use crate::container::{Container, ContainerMember};
pub use crate::extract::{ExtractedMember, Extraction};
pub use crate::levels::is_level_marker;
pub use crate::path::sanitize as sanitize_member_name;

/// A supported container format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    /// Zip archive (.zip, .pk3)
    Zip,
    /// Doom engine WAD (.wad)
    Wad,
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! In-memory builders for test containers.

    use bzip2::write::BzEncoder;
    use flate2::Compression as Level;
    use flate2::write::DeflateEncoder;
    use std::io::Write;

    /// Build a WAD from `(name, data)` lumps.
    pub fn wad(kind: &[u8; 4], lumps: &[(&str, &[u8])]) -> Vec<u8> {
        let mut data = Vec::new();
        let mut directory = Vec::new();
        let mut offset = 12u32;
        for (name, bytes) in lumps {
            directory.extend_from_slice(&offset.to_le_bytes());
            directory.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            let mut padded = [0u8; 8];
            padded[..name.len()].copy_from_slice(name.as_bytes());
            directory.extend_from_slice(&padded);
            data.extend_from_slice(bytes);
            offset += bytes.len() as u32;
        }
        let mut out = Vec::new();
        out.extend_from_slice(kind);
        out.extend_from_slice(&(lumps.len() as u32).to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&data);
        out.extend_from_slice(&directory);
        out
    }

    /// A zip member to be written by [`zip`].
    pub struct Entry<'a> {
        pub name: &'a str,
        pub data: &'a [u8],
        /// Zip method code: 0 (stored), 8 (deflate) or 12 (bzip2).
        pub method: u16,
        pub encrypted: bool,
        /// Overrides the CRC32 recorded in the directory.
        pub crc32: Option<u32>,
    }
    impl<'a> Entry<'a> {
        pub fn stored(name: &'a str, data: &'a [u8]) -> Self {
            Self { name, data, method: 0, encrypted: false, crc32: None }
        }

        pub fn deflated(name: &'a str, data: &'a [u8]) -> Self {
            Self { method: 8, ..Self::stored(name, data) }
        }

        pub fn bzip2(name: &'a str, data: &'a [u8]) -> Self {
            Self { method: 12, ..Self::stored(name, data) }
        }

        pub fn with_bad_crc(mut self) -> Self {
            self.crc32 = Some(crc32fast::hash(self.data) ^ 0xFFFF_FFFF);
            self
        }

        /// Sets the encryption flag; the payload itself stays readable.
        pub fn encrypted(mut self) -> Self {
            self.encrypted = true;
            self
        }

        fn payload(&self) -> Vec<u8> {
            match self.method {
                8 => {
                    let mut encoder = DeflateEncoder::new(Vec::new(), Level::default());
                    encoder.write_all(self.data).unwrap();
                    encoder.finish().unwrap()
                },
                12 => {
                    let mut encoder = BzEncoder::new(Vec::new(), bzip2::Compression::default());
                    encoder.write_all(self.data).unwrap();
                    encoder.finish().unwrap()
                },
                _ => self.data.to_vec(),
            }
        }
    }

    /// Build a zip archive from entries.
    pub fn zip(entries: &[Entry<'_>]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();
        for entry in entries {
            let payload = entry.payload();
            let method = entry.method;
            let flags: u16 = if entry.encrypted { 1 } else { 0 };
            let crc = entry.crc32.unwrap_or_else(|| crc32fast::hash(entry.data));
            let offset = out.len() as u32;
            out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
            out.extend_from_slice(&20u16.to_le_bytes());
            out.extend_from_slice(&flags.to_le_bytes());
            out.extend_from_slice(&method.to_le_bytes());
            out.extend_from_slice(&[0u8; 4]);
            out.extend_from_slice(&crc.to_le_bytes());
            out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            out.extend_from_slice(&(entry.data.len() as u32).to_le_bytes());
            out.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(entry.name.as_bytes());
            out.extend_from_slice(&payload);

            central.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
            central.extend_from_slice(&20u16.to_le_bytes());
            central.extend_from_slice(&20u16.to_le_bytes());
            central.extend_from_slice(&flags.to_le_bytes());
            central.extend_from_slice(&method.to_le_bytes());
            central.extend_from_slice(&[0u8; 4]);
            central.extend_from_slice(&crc.to_le_bytes());
            central.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            central.extend_from_slice(&(entry.data.len() as u32).to_le_bytes());
            central.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
            central.extend_from_slice(&[0u8; 12]);
            central.extend_from_slice(&offset.to_le_bytes());
            central.extend_from_slice(entry.name.as_bytes());
        }
        let central_offset = out.len() as u32;
        out.extend_from_slice(&central);
        out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
        out.extend_from_slice(&[0u8; 4]);
        out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        out.extend_from_slice(&(central.len() as u32).to_le_bytes());
        out.extend_from_slice(&central_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }
}
