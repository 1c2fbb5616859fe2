use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "idmirror", version, about = "Mirror an archive's metadata into a local catalog")]
pub struct Cli {
    /// Configuration file (defaults to idmirror.toml in the user config directory).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Walk the archive's id space and catalog every entry found.
    Crawl(CrawlArgs),
    /// List a container's members and levels, optionally extracting some.
    Inspect(InspectArgs),
    /// Show schema block checksums and drift against the catalog.
    Schema(SchemaArgs),
    /// Print one cataloged entry.
    Lookup(LookupArgs),
}

#[derive(Debug, Args)]
pub struct CrawlArgs {
    #[arg(long)]
    pub start_id: Option<u64>,
    /// Stop after a small number of requests.
    #[arg(long)]
    pub debug: bool,
    /// Keep going however many ids come back empty.
    #[arg(long)]
    pub no_error_budget: bool,
    /// Upper bound of the pause between requests, in seconds.
    #[arg(long)]
    pub jitter: Option<f64>,
    /// Write `<id>:<path>` lines here instead of standard output.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    pub path: PathBuf,
    /// Member to extract; repeat for several, extracted in the order given.
    #[arg(long, short = 'x', value_name = "NAME")]
    pub extract: Vec<String>,
    /// Directory to extract into.
    #[arg(long, default_value = ".")]
    pub to: PathBuf,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Write the definition back with fresh checksums.
    #[arg(long, value_name = "PATH")]
    pub write: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct LookupArgs {
    pub id: u64,
}
