//! Zip central directory parsing.
//!
//! Only the directory is read here; member data is located (via the local
//! header) and decoded at extraction time.

use crate::container::{ContainerMember, Location};
use crate::error::{ErrorKind, Result};
use crate::method::Method;
use crate::util::{u16_at, u32_at};
use exn::{OptionExt, ResultExt};
use std::io::{Read, Seek, SeekFrom};

const EOCD_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];
const EOCD_SIZE: usize = 22;
const MAX_COMMENT_SIZE: usize = u16::MAX as usize;
const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;
const CENTRAL_HEADER_SIZE: usize = 46;
const FLAG_ENCRYPTED: u16 = 0x0001;
const ZIP64_MARKER_U16: u16 = 0xFFFF;
const ZIP64_MARKER_U32: u32 = 0xFFFF_FFFF;

/// Read the central directory of a zip archive of `file_size` bytes.
pub(crate) fn read_index<R: Read + Seek>(reader: &mut R, file_size: u64) -> Result<Vec<ContainerMember>> {
    let (entries, directory_size, directory_offset) = read_end_of_directory(reader, file_size)?;
    if directory_offset.saturating_add(directory_size) > file_size {
        exn::bail!(ErrorKind::Corrupt("central directory runs past end of file".to_string()));
    }
    reader.seek(SeekFrom::Start(directory_offset)).or_raise(|| ErrorKind::Io)?;
    let mut directory = Vec::new();
    (&mut *reader).take(directory_size).read_to_end(&mut directory).or_raise(|| ErrorKind::Io)?;

    let mut members = Vec::with_capacity(usize::from(entries));
    let mut cursor = 0usize;
    for _ in 0..entries {
        let header = directory
            .get(cursor..cursor + CENTRAL_HEADER_SIZE)
            .ok_or_raise(|| ErrorKind::Corrupt("truncated central directory".to_string()))?;
        if u32_at(header, 0) != CENTRAL_HEADER_SIGNATURE {
            exn::bail!(ErrorKind::Corrupt(format!("bad central directory signature at entry {}", members.len())));
        }
        let flags = u16_at(header, 8);
        let method = u16_at(header, 10);
        let crc32 = u32_at(header, 16);
        let compressed_size = u32_at(header, 20);
        let size = u32_at(header, 24);
        let name_len = usize::from(u16_at(header, 28));
        let extra_len = usize::from(u16_at(header, 30));
        let comment_len = usize::from(u16_at(header, 32));
        let header_offset = u32_at(header, 42);
        if [compressed_size, size, header_offset].contains(&ZIP64_MARKER_U32) {
            exn::bail!(ErrorKind::UnsupportedFormat("zip64".to_string()));
        }
        let name_start = cursor + CENTRAL_HEADER_SIZE;
        let name = directory
            .get(name_start..name_start + name_len)
            .ok_or_raise(|| ErrorKind::Corrupt("truncated member name".to_string()))?;
        let name = String::from_utf8_lossy(name).into_owned();
        cursor = name_start + name_len + extra_len + comment_len;
        // Directory entries carry no data of their own.
        if name.ends_with('/') {
            continue;
        }
        members.push(ContainerMember {
            index: members.len(),
            name,
            size: u64::from(size),
            compressed_size: u64::from(compressed_size),
            crc32: Some(crc32),
            location: Location::Zip {
                header_offset: u64::from(header_offset),
                method: Method::from(method),
                encrypted: flags & FLAG_ENCRYPTED != 0,
            },
        });
    }
    Ok(members)
}

/// Locate the end-of-central-directory record by scanning backwards over
/// the (optional, variable-length) archive comment.
///
/// Returns `(entry count, directory size, directory offset)`.
fn read_end_of_directory<R: Read + Seek>(reader: &mut R, file_size: u64) -> Result<(u16, u64, u64)> {
    let tail_size = file_size.min((EOCD_SIZE + MAX_COMMENT_SIZE) as u64);
    if tail_size < EOCD_SIZE as u64 {
        exn::bail!(ErrorKind::Corrupt("too small to be a zip archive".to_string()));
    }
    reader.seek(SeekFrom::Start(file_size - tail_size)).or_raise(|| ErrorKind::Io)?;
    let mut tail = Vec::new();
    (&mut *reader).take(tail_size).read_to_end(&mut tail).or_raise(|| ErrorKind::Io)?;
    let position = (0..=tail.len() - EOCD_SIZE)
        .rev()
        .find(|&i| tail[i..i + 4] == EOCD_SIGNATURE)
        .ok_or_raise(|| ErrorKind::Corrupt("end of central directory not found".to_string()))?;
    let record = &tail[position..position + EOCD_SIZE];
    let entries = u16_at(record, 10);
    let directory_size = u32_at(record, 12);
    let directory_offset = u32_at(record, 16);
    if entries == ZIP64_MARKER_U16 || directory_offset == ZIP64_MARKER_U32 {
        exn::bail!(ErrorKind::UnsupportedFormat("zip64".to_string()));
    }
    Ok((entries, u64::from(directory_size), u64::from(directory_offset)))
}
