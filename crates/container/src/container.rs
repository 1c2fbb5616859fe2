use crate::error::{ErrorKind, Result};
use crate::method::Method;
use crate::{ContainerFormat, levels, wad, zip};
use exn::{OptionExt, ResultExt};
use idmirror_checksum::{Checksum, ChecksumSource, checksum_reader};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::instrument;

const ZIP_LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
const ZIP_LOCAL_HEADER_SIZE: usize = 30;

/// Where a member's stored bytes live inside the container file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Location {
    /// WAD lump data starts directly at `offset`.
    Lump { offset: u64 },
    /// Zip member data follows a variable-length local header.
    Zip { header_offset: u64, method: Method, encrypted: bool },
}

/// One entry of a container's member directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerMember {
    /// Name as recorded in the directory (zip path or 8-character lump name).
    pub name: String,
    /// Position in the directory.
    pub index: usize,
    /// Size once extracted.
    pub size: u64,
    /// Size as stored in the container; equal to `size` for stored members.
    pub compressed_size: u64,
    /// CRC32 recorded by the directory (zip only).
    pub crc32: Option<u32>,
    pub(crate) location: Location,
}

/// An opened container with its member directory cached.
///
/// Construct with [`Container::open`]; the directory is read exactly once
/// and is immutable afterwards.
#[derive(Debug, Clone)]
pub struct Container {
    path: PathBuf,
    format: ContainerFormat,
    size: u64,
    checksum: Checksum,
    members: Vec<ContainerMember>,
}
impl Container {
    /// Open a container, read its member directory, and checksum the raw file.
    ///
    /// The format is detected from magic bytes first and the file extension
    /// second.
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::open_inner(path).or_raise(|| ErrorKind::Read(path.to_path_buf()))
    }

    fn open_inner(path: &Path) -> Result<Self> {
        let mut file = File::open(path).or_raise(|| ErrorKind::Io)?;
        let size = file.metadata().or_raise(|| ErrorKind::Io)?.len();
        let mut head = Vec::with_capacity(4);
        (&mut file).take(4).read_to_end(&mut head).or_raise(|| ErrorKind::Io)?;
        let format = ContainerFormat::detect(&head, path)?;
        let members = match format {
            ContainerFormat::Zip => zip::read_index(&mut file, size)?,
            ContainerFormat::Wad => wad::read_index(&mut file, size)?,
        };
        // Identity is always the raw bytes on disk, never decoded content.
        file.seek(SeekFrom::Start(0)).or_raise(|| ErrorKind::Io)?;
        let checksum = checksum_reader(BufReader::new(&mut file)).or_raise(|| ErrorKind::Io)?;
        tracing::debug!(%format, members = members.len(), checksum = %checksum, "Container opened");
        Ok(Self { path: path.to_path_buf(), format, size, checksum, members })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    /// Size of the raw container file in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Checksum of the raw container file.
    pub fn file_checksum(&self) -> &Checksum {
        &self.checksum
    }

    pub fn members(&self) -> &[ContainerMember] {
        &self.members
    }

    /// Find a member by name: an exact match wins, otherwise the first
    /// ASCII case-insensitive match. WAD directories routinely repeat lump
    /// names (every map has its own `THINGS`); the first one is returned.
    pub fn member(&self, name: &str) -> Option<&ContainerMember> {
        self.members
            .iter()
            .find(|m| m.name == name)
            .or_else(|| self.members.iter().find(|m| m.name.eq_ignore_ascii_case(name)))
    }

    /// Level markers in directory order. Zip archives have none of their own;
    /// extract their WADs and open those instead.
    pub fn levels(&self) -> Vec<String> {
        match self.format {
            ContainerFormat::Wad => {
                self.members.iter().filter(|m| levels::is_level_marker(&m.name)).map(|m| m.name.clone()).collect()
            },
            ContainerFormat::Zip => Vec::new(),
        }
    }

    /// Members that are WAD files themselves (by extension).
    pub fn wads(&self) -> Vec<&ContainerMember> {
        self.members
            .iter()
            .filter(|m| {
                Path::new(&m.name)
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("wad"))
            })
            .collect()
    }

    /// Checksum of a member's decoded content, without writing it anywhere.
    #[instrument(skip(self), fields(container = %self.path.display()))]
    pub fn member_checksum(&self, name: &str) -> Result<Checksum> {
        let member = self.member(name).ok_or_raise(|| ErrorKind::MissingMember(name.to_string()))?;
        let mut file = File::open(&self.path).or_raise(|| ErrorKind::Read(self.path.clone()))?;
        let reader = self.open_member(&mut file, member)?;
        let checksum = checksum_reader(reader.take(member.size.saturating_add(1))).or_raise(|| ErrorKind::Io)?;
        verify(member, &checksum)?;
        Ok(checksum)
    }

    /// Position `file` at the member's stored bytes and wrap them with the
    /// matching decoder.
    pub(crate) fn open_member<'a>(&self, file: &'a mut File, member: &ContainerMember) -> Result<Box<dyn Read + 'a>> {
        match member.location {
            Location::Lump { offset } => {
                file.seek(SeekFrom::Start(offset)).or_raise(|| ErrorKind::Io)?;
                Method::Stored.wrap_reader(file.take(member.compressed_size))
            },
            Location::Zip { encrypted: true, .. } => {
                exn::bail!(ErrorKind::UnsupportedMethod("encrypted member".to_string()))
            },
            Location::Zip { header_offset, method, .. } => {
                file.seek(SeekFrom::Start(header_offset)).or_raise(|| ErrorKind::Io)?;
                let mut header = [0u8; ZIP_LOCAL_HEADER_SIZE];
                file.read_exact(&mut header)
                    .or_raise(|| ErrorKind::Corrupt(format!("truncated local header for {}", member.name)))?;
                if crate::util::u32_at(&header, 0) != ZIP_LOCAL_HEADER_SIGNATURE {
                    exn::bail!(ErrorKind::Corrupt(format!("bad local header signature for {}", member.name)));
                }
                let name_len = u64::from(crate::util::u16_at(&header, 26));
                let extra_len = u64::from(crate::util::u16_at(&header, 28));
                let data_offset = header_offset + ZIP_LOCAL_HEADER_SIZE as u64 + name_len + extra_len;
                if data_offset.saturating_add(member.compressed_size) > self.size {
                    exn::bail!(ErrorKind::Corrupt(format!("data for {} runs past end of file", member.name)));
                }
                file.seek(SeekFrom::Start(data_offset)).or_raise(|| ErrorKind::Io)?;
                method.wrap_reader(file.take(member.compressed_size))
            },
        }
    }
}
impl ChecksumSource for Container {
    fn checksum(&self) -> idmirror_checksum::error::Result<Checksum> {
        Ok(self.checksum.clone())
    }
}

/// Decoded content must match the directory's size and (if recorded) CRC32.
pub(crate) fn verify(member: &ContainerMember, checksum: &Checksum) -> Result<()> {
    if checksum.length != member.size {
        exn::bail!(ErrorKind::Corrupt(format!(
            "{}: expected {} bytes, decoded {}",
            member.name, member.size, checksum.length
        )));
    }
    if let Some(expected) = member.crc32
        && expected != checksum.crc32
    {
        exn::bail!(ErrorKind::Corrupt(format!("{}: crc32 mismatch", member.name)));
    }
    Ok(())
}
