//! Inspecting mirrored containers to complete catalog records.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use idmirror_container::{Container, sanitize_member_name};
use idmirror_extract::{ArchiveRecord, PathResolver};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// What inspecting one container found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    /// Checksum of the raw container file.
    pub checksum: String,
    /// Level markers, from the container itself and from every WAD inside
    /// it, in directory order.
    pub levels: Vec<String>,
}

/// Looks records up in a local mirror of the archive's files.
#[derive(Debug, Clone)]
pub struct Enricher {
    root: PathBuf,
}

impl Enricher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Where the record's container would be in the mirror.
    pub fn locate(&self, record: &impl PathResolver) -> Result<PathBuf> {
        let path = record.path();
        let relative = sanitize_member_name(&path).or_raise(|| ErrorKind::Inspect(path.clone()))?;
        Ok(self.root.join(relative))
    }

    /// Inspect the record's container, if the mirror has it.
    ///
    /// Container work is blocking I/O and runs off the async runtime.
    pub async fn inspect(&self, record: &ArchiveRecord) -> Result<Option<Inspection>> {
        let path = self.locate(record)?;
        let label = record.path();
        tokio::task::spawn_blocking(move || inspect(&path))
            .await
            .or_raise(|| ErrorKind::Inspect(label.clone()))?
            .or_raise(|| ErrorKind::Inspect(label))
    }
}

#[instrument(level = "debug", fields(path = %path.display()))]
fn inspect(path: &Path) -> Result<Option<Inspection>> {
    if !path.is_file() {
        tracing::debug!("Not mirrored");
        return Ok(None);
    }
    let label = || ErrorKind::Inspect(path.display().to_string());
    let container = Container::open(path).or_raise(label)?;
    let mut levels = container.levels();
    let wads: Vec<String> = container.wads().into_iter().map(|member| member.name.clone()).collect();
    if !wads.is_empty() {
        let (_scratch, extraction) = container.extract(&wads).or_raise(label)?;
        for member in &extraction.members {
            let inner = Container::open(&member.path).or_raise(label)?;
            levels.extend(inner.levels());
        }
        tracing::debug!(wads = wads.len(), elapsed_ms = extraction.elapsed.as_millis() as u64, "WADs inspected");
    }
    Ok(Some(Inspection { checksum: container.file_checksum().hash.clone(), levels }))
}
