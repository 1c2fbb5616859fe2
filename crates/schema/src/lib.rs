//! Schema definitions: named blocks of DDL with content checksums.
//!
//! A definition document is TOML with one table per block:
//!
//! ```toml
//! [files]
//! description = "One row per archive entry"
//! notes = ""
//! sql = "CREATE TABLE files (id INTEGER PRIMARY KEY);"
//! checksum = "…"
//! ```
//!
//! Blocks are kept (and written) in lexicographic order of their names,
//! which is also the order they are applied in. The recorded `checksum` is
//! advisory: it is recomputed on load and [`SchemaDefinition::verify`]
//! reports the blocks whose recorded value disagrees.

mod block;
pub mod error;

pub use crate::block::SchemaBlock;

use crate::error::{ErrorKind, Result};
use derive_more::Display;
use exn::ResultExt;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::instrument;

/// How a block differs between two definitions.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    #[display("added")]
    Added,
    #[display("removed")]
    Removed,
    #[display("changed")]
    Changed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    pub name: String,
    pub change: Change,
}

/// An ordered collection of named schema blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDefinition {
    blocks: BTreeMap<String, SchemaBlock>,
}

impl SchemaDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a block.
    pub fn insert(&mut self, name: impl Into<String>, block: SchemaBlock) -> Option<SchemaBlock> {
        self.blocks.insert(name.into(), block)
    }

    pub fn from_toml_str(document: &str) -> Result<Self> {
        let blocks: BTreeMap<String, SchemaBlock> = toml::from_str(document).or_raise(|| ErrorKind::Parse)?;
        for (name, block) in &blocks {
            if name.trim().is_empty() {
                exn::bail!(ErrorKind::Invalid("block name is empty".to_string()));
            }
            if block.sql.trim().is_empty() {
                exn::bail!(ErrorKind::Invalid(format!("{name}: no SQL")));
            }
        }
        Ok(Self { blocks })
    }

    /// Load a definition file.
    ///
    /// Blocks whose recorded checksum is missing or stale are logged, not
    /// rejected; see [`verify`](Self::verify).
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
        let definition = Self::from_toml_str(&document).or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
        for name in definition.verify() {
            tracing::warn!(block = name, "Recorded checksum does not match block content");
        }
        tracing::debug!(blocks = definition.blocks.len(), "Schema definition loaded");
        Ok(definition)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(&self.blocks).or_raise(|| ErrorKind::Serialize)
    }

    /// Write the definition exactly as held; call
    /// [`checksummed`](Self::checksummed) first to refresh checksums.
    #[instrument(skip(self), fields(path = %path.as_ref().display(), blocks = self.blocks.len()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let document = self.to_toml_string()?;
        std::fs::write(path, document).or_raise(|| ErrorKind::Write(path.to_path_buf()))
    }

    /// Blocks in application order.
    pub fn blocks(&self) -> impl Iterator<Item = (&str, &SchemaBlock)> {
        self.blocks.iter().map(|(name, block)| (name.as_str(), block))
    }

    pub fn get(&self, name: &str) -> Option<&SchemaBlock> {
        self.blocks.get(name)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Names of blocks whose recorded checksum is missing or disagrees with
    /// their content.
    pub fn verify(&self) -> Vec<&str> {
        self.blocks().filter(|(_, block)| !block.is_current()).map(|(name, _)| name).collect()
    }

    /// Copy of the definition with every recorded checksum refreshed.
    pub fn checksummed(&self) -> Self {
        Self { blocks: self.blocks.iter().map(|(name, block)| (name.clone(), block.checksummed())).collect() }
    }

    /// Compare block content against an earlier definition.
    pub fn drift(&self, previous: &SchemaDefinition) -> Vec<Drift> {
        let mut drift = Vec::new();
        for (name, block) in &self.blocks {
            let change = match previous.blocks.get(name) {
                None => Change::Added,
                Some(old) if old.compute() != block.compute() => Change::Changed,
                Some(_) => continue,
            };
            drift.push(Drift { name: name.clone(), change });
        }
        drift.extend(
            previous
                .blocks
                .keys()
                .filter(|name| !self.blocks.contains_key(*name))
                .map(|name| Drift { name: name.clone(), change: Change::Removed }),
        );
        drift.sort_by(|a, b| a.name.cmp(&b.name));
        drift
    }
}
