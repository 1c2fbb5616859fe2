//! Archive records, their reviews and their levels.
//!
//! The three are written together and read back together: a record is only
//! ever observed with all of its reviews and levels, or not at all.

use crate::Database;
use crate::db::prepare;
use crate::error::{ErrorKind, Result};
use crate::models::{CatalogRow, VoteRow};
use exn::ResultExt;
use idmirror_extract::{ArchiveRecord, Review};
use sqlx::{Connection, SqliteConnection, Statement};
use tracing::instrument;

/// Repository for archive records in the catalog.
///
/// Writes are insert-only: adding a record whose `id` or `(dir, filename)`
/// is already cataloged fails with [`ErrorKind::Execute`] and changes
/// nothing. Callers wanting idempotent re-syncs check
/// [`contains`](Self::contains) first.
#[derive(Debug)]
pub struct Repository {
    db: Database,
}
impl From<Database> for Repository {
    fn from(db: Database) -> Self {
        Self { db }
    }
}
impl Repository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&mut self) -> &mut Database {
        &mut self.db
    }

    pub async fn close(self) -> Result<()> {
        self.db.close().await
    }

    fn conn(&mut self) -> &mut SqliteConnection {
        self.db.connection()
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Insert a record with its reviews and levels, in one transaction.
    ///
    /// The `files` row goes first, then one `votes` row per review (numbered
    /// from 1 in review order), then one `levels` row per level. The
    /// transient `url` and `idgames_url` are not stored.
    #[instrument(skip(self, record), fields(id = record.id, dir = %record.dir, filename = %record.filename))]
    pub async fn add_file(&mut self, record: &ArchiveRecord) -> Result<()> {
        let row = CatalogRow::try_from(record)?;
        let votes =
            record.reviews.iter().enumerate().map(|(i, review)| VoteRow::new(i, review)).collect::<Result<Vec<_>>>()?;
        let file_id = row.id;

        let mut tx = self.conn().begin().await.or_raise(|| ErrorKind::Execute)?;
        let statement = prepare(&mut tx, include_str!("../queries/insert_file.sql")).await?;
        statement
            .query()
            .bind(row.id)
            .bind(row.title)
            .bind(row.dir)
            .bind(row.filename)
            .bind(row.size)
            .bind(row.age)
            .bind(row.date)
            .bind(row.author)
            .bind(row.email)
            .bind(row.description)
            .bind(row.credits)
            .bind(row.base)
            .bind(row.buildtime)
            .bind(row.editors)
            .bind(row.bugs)
            .bind(row.rating)
            .bind(row.vote_count)
            .bind(row.checksum)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Execute)?;

        let statement = prepare(&mut tx, include_str!("../queries/insert_vote.sql")).await?;
        for vote in votes {
            statement
                .query()
                .bind(vote.vote_id)
                .bind(file_id)
                .bind(vote.text)
                .bind(vote.vote)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Execute)?;
        }

        let statement = prepare(&mut tx, include_str!("../queries/insert_level.sql")).await?;
        for (position, name) in record.levels.iter().enumerate() {
            let position = i64::try_from(position).or_raise(|| ErrorKind::InvalidData("level position"))?;
            statement
                .query()
                .bind(file_id)
                .bind(position)
                .bind(name.as_str())
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Execute)?;
        }

        tx.commit().await.or_raise(|| ErrorKind::Execute)?;
        tracing::debug!(reviews = record.reviews.len(), levels = record.levels.len(), "Record cataloged");
        Ok(())
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    pub async fn get_by_id(&mut self, id: u64) -> Result<Option<ArchiveRecord>> {
        let id = i64::try_from(id).or_raise(|| ErrorKind::InvalidData("id"))?;
        let statement = prepare(self.conn(), include_str!("../queries/get_by_id.sql")).await?;
        let row: Option<CatalogRow> =
            statement.query_as().bind(id).fetch_optional(self.conn()).await.or_raise(|| ErrorKind::Execute)?;
        self.hydrate(row).await
    }

    /// Look a record up by its canonical path.
    pub async fn get_by_path(&mut self, dir: &str, filename: &str) -> Result<Option<ArchiveRecord>> {
        let statement = prepare(self.conn(), include_str!("../queries/get_by_path.sql")).await?;
        let row: Option<CatalogRow> = statement
            .query_as()
            .bind(dir)
            .bind(filename)
            .fetch_optional(self.conn())
            .await
            .or_raise(|| ErrorKind::Execute)?;
        self.hydrate(row).await
    }

    /// All records whose container has the given checksum, by ascending id.
    ///
    /// More than one result means the same container was uploaded more than
    /// once.
    pub async fn get_by_checksum(&mut self, checksum: &str) -> Result<Vec<ArchiveRecord>> {
        let statement = prepare(self.conn(), include_str!("../queries/get_by_checksum.sql")).await?;
        let rows: Vec<CatalogRow> =
            statement.query_as().bind(checksum).fetch_all(self.conn()).await.or_raise(|| ErrorKind::Execute)?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(record) = self.hydrate(Some(row)).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    pub async fn contains(&mut self, id: u64) -> Result<bool> {
        let id = i64::try_from(id).or_raise(|| ErrorKind::InvalidData("id"))?;
        let statement = prepare(self.conn(), include_str!("../queries/contains.sql")).await?;
        let exists: i64 =
            statement.query_scalar().bind(id).fetch_one(self.conn()).await.or_raise(|| ErrorKind::Execute)?;
        Ok(exists != 0)
    }

    /// Attach reviews and levels to a `files` row.
    async fn hydrate(&mut self, row: Option<CatalogRow>) -> Result<Option<ArchiveRecord>> {
        let Some(row) = row else {
            return Ok(None);
        };
        let file_id = row.id;
        let mut record = ArchiveRecord::try_from(row)?;

        let statement = prepare(self.conn(), include_str!("../queries/get_votes.sql")).await?;
        let votes: Vec<VoteRow> =
            statement.query_as().bind(file_id).fetch_all(self.conn()).await.or_raise(|| ErrorKind::Execute)?;
        record.reviews = votes.into_iter().map(Review::try_from).collect::<Result<Vec<_>>>()?;

        let statement = prepare(self.conn(), include_str!("../queries/get_levels.sql")).await?;
        record.levels =
            statement.query_scalar().bind(file_id).fetch_all(self.conn()).await.or_raise(|| ErrorKind::Execute)?;
        Ok(Some(record))
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// Every cataloged `(id, dir + filename)`, by ascending id.
    pub async fn list_paths(&mut self) -> Result<Vec<(u64, String)>> {
        let statement = prepare(self.conn(), include_str!("../queries/list_paths.sql")).await?;
        let rows: Vec<(i64, String)> =
            statement.query_as().fetch_all(self.conn()).await.or_raise(|| ErrorKind::Execute)?;
        rows.into_iter()
            .map(|(id, path)| Ok((u64::try_from(id).or_raise(|| ErrorKind::InvalidData("id"))?, path)))
            .collect()
    }

    pub async fn count(&mut self) -> Result<u64> {
        let statement = prepare(self.conn(), include_str!("../queries/count.sql")).await?;
        let count: i64 = statement.query_scalar().fetch_one(self.conn()).await.or_raise(|| ErrorKind::Execute)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_schema;
    use time::{Date, Month};

    async fn repository() -> Repository {
        Repository::from(Database::connect_in_memory(&default_schema().unwrap()).await.unwrap())
    }

    fn alien_vendetta() -> ArchiveRecord {
        let mut record = ArchiveRecord::new(15156, "levels/doom2/Ports/megawads/", "av.zip")
            .with_inspection("9e1c4c52f1", vec!["MAP01".to_string(), "MAP02".to_string(), "MAP32".to_string()]);
        record.title = "Alien Vendetta".to_string();
        record.size = 7_591_291;
        record.age = 1_014_789_600;
        record.date = Some(Date::from_calendar_date(2002, Month::February, 27).unwrap());
        record.author = "Various".to_string();
        record.description = "32 new levels for Doom II".to_string();
        record.base = "New from scratch".to_string();
        record.editors = "DeePsea, WadAuthor".to_string();
        record.bugs = "None known".to_string();
        record.rating = 4.6154;
        record.vote_count = 13;
        record.reviews = vec![Review::new("Superb", 5), Review::new("Too hard", 3), Review::new("", 0)];
        record.url = Some("https://example.org/av.zip".to_string());
        record.idgames_url = Some("idgames://15156".to_string());
        record
    }

    async fn rows(repo: &mut Repository, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}")).fetch_one(repo.conn()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_then_lookup_round_trip() {
        let mut repo = repository().await;
        let record = alien_vendetta();
        repo.add_file(&record).await.unwrap();
        let expected = record.without_transient();
        assert_eq!(repo.get_by_id(15156).await.unwrap(), Some(expected.clone()));
        assert_eq!(repo.get_by_path("levels/doom2/Ports/megawads/", "av.zip").await.unwrap(), Some(expected));
    }

    #[tokio::test]
    async fn test_lookup_missing() {
        let mut repo = repository().await;
        assert_eq!(repo.get_by_id(1).await.unwrap(), None);
        assert_eq!(repo.get_by_path("a/", "b.zip").await.unwrap(), None);
        assert!(!repo.contains(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let mut repo = repository().await;
        let record = alien_vendetta();
        repo.add_file(&record).await.unwrap();
        let err = repo.add_file(&record).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Execute);
        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(rows(&mut repo, "votes").await, 3);
    }

    #[tokio::test]
    async fn test_duplicate_path_rejected() {
        let mut repo = repository().await;
        repo.add_file(&alien_vendetta()).await.unwrap();
        let mut copy = alien_vendetta();
        copy.id = 15157;
        let err = repo.add_file(&copy).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Execute);
        assert!(!repo.contains(15157).await.unwrap());
    }

    #[tokio::test]
    async fn test_zero_reviews() {
        let mut repo = repository().await;
        let record = ArchiveRecord::new(2, "levels/doom/", "e1.zip");
        repo.add_file(&record).await.unwrap();
        assert_eq!(rows(&mut repo, "votes").await, 0);
        assert_eq!(rows(&mut repo, "levels").await, 0);
        let stored = repo.get_by_id(2).await.unwrap().unwrap();
        assert!(stored.reviews.is_empty());
        assert_eq!(stored, record);
    }

    #[tokio::test]
    async fn test_failed_review_rolls_back_record() {
        let mut repo = repository().await;
        let mut record = ArchiveRecord::new(3, "levels/doom/", "broken.zip");
        // Violates the vote range check after the files row is written.
        record.reviews = vec![Review::new("ok", 4), Review::new("out of range", 9)];
        let err = repo.add_file(&record).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Execute);
        assert_eq!(repo.count().await.unwrap(), 0);
        assert_eq!(rows(&mut repo, "votes").await, 0);
    }

    #[tokio::test]
    async fn test_get_by_checksum() {
        let mut repo = repository().await;
        repo.add_file(&alien_vendetta()).await.unwrap();
        let reupload = ArchiveRecord::new(20001, "levels/doom2/megawads/", "av.zip")
            .with_inspection("9e1c4c52f1", vec!["MAP01".to_string()]);
        repo.add_file(&reupload).await.unwrap();
        repo.add_file(&ArchiveRecord::new(5, "levels/doom/", "e1.zip")).await.unwrap();
        let ids: Vec<_> = repo.get_by_checksum("9e1c4c52f1").await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![15156, 20001]);
    }

    #[tokio::test]
    async fn test_list_paths_sorted_by_id() {
        let mut repo = repository().await;
        for (id, filename) in [(100, "c.zip"), (9, "b.zip"), (10, "a.zip")] {
            repo.add_file(&ArchiveRecord::new(id, "misc/", filename)).await.unwrap();
        }
        assert_eq!(
            repo.list_paths().await.unwrap(),
            vec![(9, "misc/b.zip".to_string()), (10, "misc/a.zip".to_string()), (100, "misc/c.zip".to_string())]
        );
        assert_eq!(repo.count().await.unwrap(), 3);
    }
}
