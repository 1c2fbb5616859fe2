pub mod crawl;
pub mod inspect;
pub mod lookup;
pub mod schema;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use idmirror_catalog::{Repository, default_schema};
use idmirror_config::Config;
use idmirror_schema::SchemaDefinition;
use std::path::Path;

pub(crate) fn load_config(file: Option<&Path>) -> Result<Config> {
    Config::load(file).or_raise(|| ErrorKind::Config)
}

/// The configured schema document, or the built-in one.
pub(crate) fn load_schema(config: &Config) -> Result<SchemaDefinition> {
    match &config.schema {
        Some(path) => SchemaDefinition::load(path).or_raise(|| ErrorKind::Schema),
        None => default_schema().or_raise(|| ErrorKind::Schema),
    }
}

pub(crate) async fn open_catalog(config: &Config) -> Result<Repository> {
    let schema = load_schema(config)?;
    if let Some(parent) = config.database.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Catalog)?;
    }
    let db = idmirror_catalog::Database::connect(&config.database, &schema).await.or_raise(|| ErrorKind::Catalog)?;
    Ok(Repository::from(db))
}
