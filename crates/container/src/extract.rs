//! Member extraction.

use crate::container::{Container, ContainerMember, verify};
use crate::error::{ErrorKind, Result};
use crate::path::sanitize;
use exn::{OptionExt, ResultExt};
use idmirror_checksum::{Checksum, Digest};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::instrument;

/// A member written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMember {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    /// Checksum of the decoded content that was written.
    pub checksum: Checksum,
}

/// Result of one extraction call.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Extracted members, in the order they were requested.
    pub members: Vec<ExtractedMember>,
    pub elapsed: Duration,
}

impl Container {
    /// Extract the named members into `destination`, in the order given.
    ///
    /// Extraction stops at the first failure, which is reported as
    /// [`ErrorKind::Extract`] naming the failing member. Members written
    /// before the failure are left in place; the failing member's partial
    /// output is removed and later members are never touched.
    #[instrument(skip(self, names, destination), fields(
        container = %self.path().display(),
        destination = %destination.as_ref().display(),
        requested = names.len(),
    ))]
    pub fn extract_to<S: AsRef<str>>(&self, names: &[S], destination: impl AsRef<Path>) -> Result<Extraction> {
        let started = Instant::now();
        let destination = destination.as_ref();
        let mut file = File::open(self.path()).or_raise(|| ErrorKind::Read(self.path().to_path_buf()))?;
        let mut members = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let extracted = self
                .extract_member(&mut file, name, destination)
                .or_raise(|| ErrorKind::Extract { member: name.to_string() })?;
            tracing::trace!(member = name, size = extracted.size, "Member extracted");
            members.push(extracted);
        }
        let elapsed = started.elapsed();
        tracing::debug!(members = members.len(), elapsed_ms = elapsed.as_millis() as u64, "Extraction finished");
        Ok(Extraction { members, elapsed })
    }

    /// Extract the named members into a fresh temporary directory.
    ///
    /// The directory (and everything in it) is deleted when the returned
    /// [`TempDir`] is dropped.
    pub fn extract<S: AsRef<str>>(&self, names: &[S]) -> Result<(TempDir, Extraction)> {
        let directory = tempfile::tempdir().or_raise(|| ErrorKind::Io)?;
        let extraction = self.extract_to(names, directory.path())?;
        Ok((directory, extraction))
    }

    fn extract_member(&self, file: &mut File, name: &str, destination: &Path) -> Result<ExtractedMember> {
        let member = self.member(name).ok_or_raise(|| ErrorKind::MissingMember(name.to_string()))?;
        let target = destination.join(sanitize(&member.name)?);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).or_raise(|| ErrorKind::Io)?;
        }
        let reader = self.open_member(file, member)?;
        let checksum = match write_member(reader, member, &target) {
            Ok(checksum) => checksum,
            Err(err) => {
                let _ = fs::remove_file(&target);
                return Err(err);
            },
        };
        Ok(ExtractedMember { name: member.name.clone(), path: target, size: checksum.length, checksum })
    }
}

/// Writes to the output while digesting the same bytes.
struct Tee<W> {
    writer: W,
    digest: Digest,
}
impl<W: Write> Write for Tee<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.writer.write(buf)?;
        self.digest.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

fn write_member(reader: Box<dyn Read + '_>, member: &ContainerMember, target: &Path) -> Result<Checksum> {
    let output = File::create(target).or_raise(|| ErrorKind::Io)?;
    let mut tee = Tee { writer: BufWriter::new(output), digest: Digest::new() };
    // One byte past the declared size is enough to notice an overlong stream.
    io::copy(&mut reader.take(member.size.saturating_add(1)), &mut tee).or_raise(|| ErrorKind::Io)?;
    tee.flush().or_raise(|| ErrorKind::Io)?;
    let checksum = tee.digest.finalize();
    verify(member, &checksum)?;
    Ok(checksum)
}
