//! Sequential crawl of the archive's id space.
//!
//! Each id is fetched, parsed and populated into an
//! [`ArchiveRecord`](idmirror_extract::ArchiveRecord), optionally enriched
//! from a local mirror, and handed to a [`RecordSink`]. Exactly one request
//! is in flight at a time, with a random pause between requests.

mod crawl;
mod enrich;
pub mod error;
mod fetch;
mod policy;
mod report;
mod sink;

pub use crate::crawl::{Crawler, Outcome};
pub use crate::enrich::{Enricher, Inspection};
pub use crate::fetch::{Fetcher, HttpFetcher};
pub use crate::policy::{CrawlPolicy, POPULATE_ERROR_THRESHOLD};
pub use crate::report::{CrawlReport, Termination};
pub use crate::sink::{Persisted, RecordSink, duplicates};
