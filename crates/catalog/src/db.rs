//! Database connection and schema bootstrap.

use exn::ResultExt;
use idmirror_schema::{Change, Drift, SchemaDefinition};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteStatement, SqliteSynchronous};
use sqlx::{ConnectOptions, Connection, Executor, SqliteConnection, Statement};
use std::collections::BTreeMap;
use std::path::Path;
use time::UtcDateTime;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Bookkeeping for applied schema blocks. Not part of any schema definition,
/// so it can never drift itself.
const SCHEMA_BLOCKS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_blocks (
        name TEXT PRIMARY KEY NOT NULL,
        checksum TEXT NOT NULL,
        applied_at INTEGER NOT NULL
    );
"#;

/// The catalog schema compiled into the binary.
pub fn default_schema() -> Result<SchemaDefinition> {
    SchemaDefinition::from_toml_str(include_str!("../schema.toml")).or_raise(|| ErrorKind::Schema)
}

/// Prepare a statement, keeping schema problems apart from data problems.
pub(crate) async fn prepare<'q>(conn: &mut SqliteConnection, sql: &'q str) -> Result<SqliteStatement<'q>> {
    Executor::prepare(conn, sql).await.or_raise(|| ErrorKind::Prepare)
}

/// The catalog database.
///
/// Owns a single connection for its whole lifetime: there is only ever one
/// writer, so there is nothing to pool.
#[derive(Debug)]
pub struct Database {
    conn: SqliteConnection,
}

impl Database {
    async fn open(options: SqliteConnectOptions) -> Result<Self> {
        let mut conn = options.connect().await.or_raise(|| ErrorKind::Connect)?;
        Self::apply_pragmas(&mut conn).await.or_raise(|| ErrorKind::Connect)?;
        sqlx::raw_sql(SCHEMA_BLOCKS_TABLE).execute(&mut conn).await.or_raise(|| ErrorKind::Execute)?;
        Ok(Self { conn })
    }

    /// Open (creating if missing) the catalog at `path` and bring it up to
    /// date with `schema`.
    ///
    /// Fails with [`ErrorKind::SchemaDrift`] if any block this database has
    /// already applied has changed since.
    pub async fn connect(path: impl AsRef<Path>, schema: &SchemaDefinition) -> Result<Self> {
        let options = Self::base_options().filename(path.as_ref()).create_if_missing(true);
        let mut db = Self::open(options).await?;
        db.bootstrap(schema).await?;
        Ok(db)
    }

    /// Connect to an in-memory database (useful for testing).
    ///
    /// Note: in-memory databases are destroyed when the connection closes.
    pub async fn connect_in_memory(schema: &SchemaDefinition) -> Result<Self> {
        let mut db = Self::open(Self::base_options().filename(":memory:")).await?;
        db.bootstrap(schema).await?;
        Ok(db)
    }

    /// Open the catalog at `path` without applying or checking any schema
    /// blocks; for reporting [`drift`](Self::drift) on a database that
    /// [`connect`](Self::connect) refuses.
    pub async fn connect_unchecked(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(Self::base_options().filename(path.as_ref()).create_if_missing(true)).await
    }

    fn base_options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_millis(1500))
    }

    /// Apply additional PRAGMA settings that aren't exposed via SqliteConnectOptions.
    async fn apply_pragmas(conn: &mut SqliteConnection) -> sqlx::Result<()> {
        sqlx::raw_sql(
            r#"
                PRAGMA wal_autocheckpoint = 800;
                PRAGMA cache_size = -8192;
                PRAGMA temp_store = MEMORY;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Checksums of the blocks this database has applied, by name.
    async fn applied_blocks(&mut self) -> Result<BTreeMap<String, String>> {
        let statement = prepare(&mut self.conn, include_str!("../queries/list_schema_blocks.sql")).await?;
        let rows: Vec<(String, String)> =
            statement.query_as().fetch_all(&mut self.conn).await.or_raise(|| ErrorKind::Execute)?;
        Ok(rows.into_iter().collect())
    }

    /// Apply every block not yet recorded, in name order, each in its own
    /// transaction together with its bookkeeping row.
    #[instrument(skip(self, schema), fields(blocks = schema.len()))]
    async fn bootstrap(&mut self, schema: &SchemaDefinition) -> Result<()> {
        let applied = self.applied_blocks().await?;
        let drifted: Vec<String> = schema
            .blocks()
            .filter(|(name, block)| applied.get(*name).is_some_and(|checksum| *checksum != block.compute().hash))
            .map(|(name, _)| name.to_string())
            .collect();
        if !drifted.is_empty() {
            exn::bail!(ErrorKind::SchemaDrift(drifted));
        }
        for (name, block) in schema.blocks().filter(|(name, _)| !applied.contains_key(*name)) {
            let checksum = block.compute().hash;
            let mut tx = self.conn.begin().await.or_raise(|| ErrorKind::Execute)?;
            // Blocks are multi-statement scripts; they run as-is rather than
            // through a single prepared statement.
            sqlx::raw_sql(&block.sql).execute(&mut *tx).await.or_raise(|| ErrorKind::Execute)?;
            let statement = prepare(&mut tx, include_str!("../queries/record_schema_block.sql")).await?;
            statement
                .query()
                .bind(name)
                .bind(checksum.as_str())
                .bind(UtcDateTime::now().unix_timestamp())
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Execute)?;
            tx.commit().await.or_raise(|| ErrorKind::Execute)?;
            tracing::info!(block = name, %checksum, "Schema block applied");
        }
        for name in applied.keys().filter(|name| schema.get(name).is_none()) {
            tracing::warn!(block = name.as_str(), "Applied schema block is no longer defined");
        }
        Ok(())
    }

    /// Compare `schema` against the blocks this database has applied:
    /// `Added` blocks are pending, `Removed` ones were applied but are no
    /// longer defined, `Changed` ones would make [`connect`](Self::connect)
    /// fail.
    pub async fn drift(&mut self, schema: &SchemaDefinition) -> Result<Vec<Drift>> {
        let applied = self.applied_blocks().await?;
        let mut drift = Vec::new();
        for (name, block) in schema.blocks() {
            let change = match applied.get(name) {
                None => Change::Added,
                Some(checksum) if *checksum != block.compute().hash => Change::Changed,
                Some(_) => continue,
            };
            drift.push(Drift { name: name.to_string(), change });
        }
        drift.extend(
            applied
                .keys()
                .filter(|name| schema.get(name).is_none())
                .map(|name| Drift { name: name.clone(), change: Change::Removed }),
        );
        drift.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(drift)
    }

    /// The underlying connection, for running custom queries.
    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }

    /// Close the connection, letting SQLite update query planner statistics
    /// first.
    pub async fn close(mut self) -> Result<()> {
        _ = sqlx::raw_sql("PRAGMA optimize").execute(&mut self.conn).await;
        self.conn.close().await.or_raise(|| ErrorKind::Connect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idmirror_schema::SchemaBlock;

    async fn count(db: &mut Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}")).fetch_one(db.connection()).await.unwrap()
    }

    #[test]
    fn test_default_schema() {
        let schema = default_schema().unwrap();
        let names: Vec<_> = schema.blocks().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["files", "levels", "votes"]);
    }

    #[tokio::test]
    async fn test_connect_in_memory_applies_blocks() {
        let mut db = Database::connect_in_memory(&default_schema().unwrap()).await.unwrap();
        assert_eq!(count(&mut db, "schema_blocks").await, 3);
        assert_eq!(count(&mut db, "files").await, 0);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_pragmas_are_applied() {
        let mut db = Database::connect_in_memory(&default_schema().unwrap()).await.unwrap();
        let row: (i64,) = sqlx::query_as("PRAGMA foreign_keys").fetch_one(db.connection()).await.unwrap();
        assert_eq!(row.0, 1, "foreign_keys should be ON");
        let row: (i64,) = sqlx::query_as("PRAGMA wal_autocheckpoint").fetch_one(db.connection()).await.unwrap();
        assert_eq!(row.0, 800, "WAL checkpoint should be 800");
    }

    #[tokio::test]
    async fn test_reconnect_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        let schema = default_schema().unwrap();
        Database::connect(&path, &schema).await.unwrap().close().await.unwrap();
        let mut db = Database::connect(&path, &schema).await.unwrap();
        assert_eq!(count(&mut db, "schema_blocks").await, 3);
        assert!(db.drift(&schema).await.unwrap().is_empty());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_new_blocks_are_applied_later() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        let mut schema = default_schema().unwrap();
        Database::connect(&path, &schema).await.unwrap().close().await.unwrap();
        schema.insert("mirrors", SchemaBlock::new("Mirrors", "", "CREATE TABLE mirrors (url TEXT NOT NULL);"));
        let mut db = Database::connect_unchecked(&path).await.unwrap();
        assert_eq!(db.drift(&schema).await.unwrap(), vec![Drift { name: "mirrors".to_string(), change: Change::Added }]);
        db.close().await.unwrap();
        let mut db = Database::connect(&path, &schema).await.unwrap();
        assert_eq!(count(&mut db, "mirrors").await, 0);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_edited_block_is_drift() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        let original = default_schema().unwrap();
        Database::connect(&path, &original).await.unwrap().close().await.unwrap();

        let mut edited = SchemaDefinition::new();
        for (name, block) in original.blocks() {
            let mut block = block.clone();
            if name == "votes" {
                block.notes = "Edited after the fact.".to_string();
            }
            edited.insert(name, block);
        }
        let err = Database::connect(&path, &edited).await.unwrap_err();
        assert_eq!(*err, ErrorKind::SchemaDrift(vec!["votes".to_string()]));

        let mut db = Database::connect_unchecked(&path).await.unwrap();
        let drift = db.drift(&edited).await.unwrap();
        assert_eq!(drift, vec![Drift { name: "votes".to_string(), change: Change::Changed }]);
        db.close().await.unwrap();
    }
}
