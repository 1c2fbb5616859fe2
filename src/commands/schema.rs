use crate::cli::SchemaArgs;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use idmirror_catalog::Database;
use std::path::Path;

pub async fn run(config: Option<&Path>, args: SchemaArgs) -> Result<()> {
    let config = super::load_config(config)?;
    let schema = super::load_schema(&config)?;
    for (name, block) in schema.blocks() {
        let state = if block.is_current() { "" } else { " (recorded checksum is stale)" };
        println!("{name} {}{state}", block.compute());
    }

    if config.database.is_file() {
        let mut db = Database::connect_unchecked(&config.database).await.or_raise(|| ErrorKind::Catalog)?;
        let drift = db.drift(&schema).await.or_raise(|| ErrorKind::Catalog)?;
        db.close().await.or_raise(|| ErrorKind::Catalog)?;
        if drift.is_empty() {
            println!("catalog {} is up to date", config.database.display());
        }
        for entry in drift {
            println!("{} {}", entry.change, entry.name);
        }
    }

    if let Some(path) = &args.write {
        schema.checksummed().save(path).or_raise(|| ErrorKind::Schema)?;
        tracing::info!(path = %path.display(), "Schema definition written");
    }
    Ok(())
}
