//! SQLite catalog of the mirrored archive.
//!
//! The catalog is the local copy of the archive's metadata: one `files` row
//! per archive entry, its reviews in `votes` and the levels found in its
//! container in `levels`. The tables themselves come from a
//! [`SchemaDefinition`](idmirror_schema::SchemaDefinition); the database
//! remembers which blocks it has applied (and their checksums) so edits to an
//! applied block are caught as drift instead of silently diverging.
//!
//! # Architecture
//! - [`Database`] owns the one connection and bootstraps the schema.
//! - [`Repository`] reads and writes records through it. Every statement is
//!   prepared explicitly before it runs, so a statement that does not fit the
//!   schema fails with [`ErrorKind::Prepare`](error::ErrorKind::Prepare) and
//!   bad data fails with [`ErrorKind::Execute`](error::ErrorKind::Execute).

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::{Database, default_schema};
pub use crate::repo::Repository;
