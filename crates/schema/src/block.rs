use idmirror_checksum::{Checksum, ChecksumSource, Digest};
use serde::{Deserialize, Serialize};

/// One named unit of DDL with its human-facing documentation.
///
/// The checksum identifies the block's *content*: it is computed over
/// exactly `description`, `notes` and `sql`, each length-framed, with a
/// digest that starts empty for every block. Two blocks with the same
/// fields always share a checksum, whatever was computed before them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaBlock {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    pub sql: String,
    /// Checksum as recorded in the document; `None` if never written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl SchemaBlock {
    /// Build a block with its checksum already filled in.
    pub fn new(description: impl Into<String>, notes: impl Into<String>, sql: impl Into<String>) -> Self {
        let mut block = Self { description: description.into(), notes: notes.into(), sql: sql.into(), checksum: None };
        block.checksum = Some(block.compute().hash);
        block
    }

    /// Content checksum of this block.
    pub fn compute(&self) -> Checksum {
        Digest::new().update_field(&self.description).update_field(&self.notes).update_field(&self.sql).finalize()
    }

    /// Whether the recorded checksum matches the content.
    pub fn is_current(&self) -> bool {
        self.checksum.as_deref() == Some(self.compute().hash.as_str())
    }

    /// Copy of the block with the recorded checksum refreshed.
    pub fn checksummed(&self) -> Self {
        Self { checksum: Some(self.compute().hash), ..self.clone() }
    }
}

impl ChecksumSource for SchemaBlock {
    fn checksum(&self) -> idmirror_checksum::error::Result<Checksum> {
        Ok(self.compute())
    }
}
