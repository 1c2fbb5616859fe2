//! WAD directory parsing.
//!
//! Layout: a 12-byte header (`IWAD`/`PWAD`, lump count, directory offset)
//! and a directory of 16-byte entries (data offset, size, NUL-padded name).
//! All integers are little-endian and signed; lumps are never compressed.

use crate::container::{ContainerMember, Location};
use crate::error::{ErrorKind, Result};
use crate::util::i32_at;
use exn::ResultExt;
use std::io::{Read, Seek, SeekFrom};

const HEADER_SIZE: usize = 12;
const ENTRY_SIZE: u64 = 16;
const NAME_SIZE: usize = 8;

/// Read the lump directory of a WAD of `file_size` bytes.
pub(crate) fn read_index<R: Read + Seek>(reader: &mut R, file_size: u64) -> Result<Vec<ContainerMember>> {
    reader.seek(SeekFrom::Start(0)).or_raise(|| ErrorKind::Io)?;
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header).or_raise(|| ErrorKind::Corrupt("truncated WAD header".to_string()))?;
    let count = u64::try_from(i32_at(&header, 4)).or_raise(|| ErrorKind::Corrupt("negative lump count".to_string()))?;
    let offset =
        u64::try_from(i32_at(&header, 8)).or_raise(|| ErrorKind::Corrupt("negative directory offset".to_string()))?;
    let directory_size = count * ENTRY_SIZE;
    if offset.saturating_add(directory_size) > file_size {
        exn::bail!(ErrorKind::Corrupt("lump directory runs past end of file".to_string()));
    }
    reader.seek(SeekFrom::Start(offset)).or_raise(|| ErrorKind::Io)?;
    let mut directory = Vec::new();
    (&mut *reader).take(directory_size).read_to_end(&mut directory).or_raise(|| ErrorKind::Io)?;

    directory
        .chunks_exact(ENTRY_SIZE as usize)
        .enumerate()
        .map(|(index, entry)| {
            let name = lump_name(&entry[8..8 + NAME_SIZE]);
            let position = u64::try_from(i32_at(entry, 0))
                .or_raise(|| ErrorKind::Corrupt(format!("negative offset for lump {name}")))?;
            let size =
                u64::try_from(i32_at(entry, 4)).or_raise(|| ErrorKind::Corrupt(format!("negative size for lump {name}")))?;
            // Markers (map headers, F_START...) are zero-sized and their
            // offsets are frequently garbage; only data-carrying lumps matter.
            if size > 0 && position.saturating_add(size) > file_size {
                exn::bail!(ErrorKind::Corrupt(format!("lump {name} runs past end of file")));
            }
            Ok(ContainerMember {
                name,
                index,
                size,
                compressed_size: size,
                crc32: None,
                location: Location::Lump { offset: position },
            })
        })
        .collect()
}

fn lump_name(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use std::io::Cursor;

    #[test]
    fn test_read_index() {
        let bytes = fixtures::wad(
            b"IWAD",
            &[("E1M1", b"".as_slice()), ("THINGS", b"\x01\x02\x03".as_slice()), ("PLAYPAL", b"rgb".as_slice())],
        );
        let members = read_index(&mut Cursor::new(&bytes), bytes.len() as u64).unwrap();
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["E1M1", "THINGS", "PLAYPAL"]);
        assert_eq!(members[1].size, 3);
        assert_eq!(members[1].location, Location::Lump { offset: 12 });
        assert_eq!(members[2].location, Location::Lump { offset: 15 });
    }

    #[test]
    fn test_full_length_name() {
        assert_eq!(lump_name(b"SIDEDEFS"), "SIDEDEFS");
        assert_eq!(lump_name(b"MAP01\0\0\0"), "MAP01");
    }

    #[test]
    fn test_directory_past_end() {
        let mut bytes = fixtures::wad(b"PWAD", &[("MAP01", b"".as_slice())]);
        // Claim a thousand lumps.
        bytes[4..8].copy_from_slice(&1000i32.to_le_bytes());
        let err = read_index(&mut Cursor::new(&bytes), bytes.len() as u64).unwrap_err();
        assert!(matches!(*err, ErrorKind::Corrupt(_)));
    }

    #[test]
    fn test_lump_past_end() {
        let mut bytes = fixtures::wad(b"PWAD", &[("DEHACKED", b"Patch File".as_slice())]);
        let len = bytes.len();
        // Directory entry is the last 16 bytes; bump the lump size.
        bytes[len - 12..len - 8].copy_from_slice(&9999i32.to_le_bytes());
        let err = read_index(&mut Cursor::new(&bytes), bytes.len() as u64).unwrap_err();
        assert!(matches!(*err, ErrorKind::Corrupt(_)));
    }

    #[test]
    fn test_negative_count() {
        let mut bytes = fixtures::wad(b"PWAD", &[]);
        bytes[4..8].copy_from_slice(&(-1i32).to_le_bytes());
        assert!(read_index(&mut Cursor::new(&bytes), bytes.len() as u64).is_err());
    }
}
