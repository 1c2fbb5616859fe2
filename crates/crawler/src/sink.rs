use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use idmirror_catalog::Repository;
use idmirror_extract::ArchiveRecord;

/// What persisting a record did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persisted {
    Inserted,
    /// The id was already in the catalog; nothing was written.
    AlreadyCataloged,
}

/// Where populated records go.
#[async_trait]
pub trait RecordSink: Send {
    async fn persist(&mut self, record: &ArchiveRecord) -> Result<Persisted>;
}

/// The catalog only inserts, so re-syncing over an already cataloged range
/// checks for the id first.
#[async_trait]
impl RecordSink for Repository {
    async fn persist(&mut self, record: &ArchiveRecord) -> Result<Persisted> {
        if self.contains(record.id).await.or_raise(|| ErrorKind::Persist(record.id))? {
            return Ok(Persisted::AlreadyCataloged);
        }
        for original in duplicates(self, record).await? {
            tracing::info!(id = record.id, duplicate_of = original, "Container already cataloged under another id");
        }
        self.add_file(record).await.or_raise(|| ErrorKind::Persist(record.id))?;
        Ok(Persisted::Inserted)
    }
}

/// Ids of other cataloged records with the same container checksum. Empty
/// for records that were never inspected.
pub async fn duplicates(repo: &mut Repository, record: &ArchiveRecord) -> Result<Vec<u64>> {
    let Some(checksum) = record.checksum.as_deref() else {
        return Ok(Vec::new());
    };
    let matches = repo.get_by_checksum(checksum).await.or_raise(|| ErrorKind::Persist(record.id))?;
    Ok(matches.into_iter().map(|other| other.id).filter(|id| *id != record.id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use idmirror_catalog::{Database, default_schema};

    #[tokio::test]
    async fn test_repository_sink_is_idempotent() {
        let db = Database::connect_in_memory(&default_schema().unwrap()).await.unwrap();
        let mut repo = Repository::from(db);
        let record = ArchiveRecord::new(42, "levels/doom2/", "map42.zip");
        assert_eq!(repo.persist(&record).await.unwrap(), Persisted::Inserted);
        assert_eq!(repo.persist(&record).await.unwrap(), Persisted::AlreadyCataloged);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_containers() {
        let db = Database::connect_in_memory(&default_schema().unwrap()).await.unwrap();
        let mut repo = Repository::from(db);
        let first = ArchiveRecord::new(10, "levels/doom/", "e1.zip").with_inspection("af1349b9", Vec::new());
        let reupload = ArchiveRecord::new(11, "levels/doom/", "e1v2.zip").with_inspection("af1349b9", Vec::new());
        let unrelated = ArchiveRecord::new(12, "levels/doom/", "e2.zip").with_inspection("0b5e31a7", Vec::new());
        assert!(duplicates(&mut repo, &first).await.unwrap().is_empty());
        repo.persist(&first).await.unwrap();
        assert_eq!(duplicates(&mut repo, &reupload).await.unwrap(), vec![10]);
        assert_eq!(repo.persist(&reupload).await.unwrap(), Persisted::Inserted);
        assert!(duplicates(&mut repo, &unrelated).await.unwrap().is_empty());
        assert!(duplicates(&mut repo, &ArchiveRecord::new(13, "a/", "b.zip")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repository_sink_reports_conflicts() {
        let db = Database::connect_in_memory(&default_schema().unwrap()).await.unwrap();
        let mut repo = Repository::from(db);
        repo.persist(&ArchiveRecord::new(1, "a/", "b.zip")).await.unwrap();
        // Same path under a new id.
        let err = repo.persist(&ArchiveRecord::new(2, "a/", "b.zip")).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Persist(2));
    }
}
