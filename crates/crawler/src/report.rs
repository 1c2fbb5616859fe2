use derive_more::Display;
use std::collections::BTreeMap;

/// Where a crawl stands.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    #[display("continuing")]
    Continuing,
    /// A request failed or the API answered with an error status.
    #[display("stopped: transport failure")]
    Transport,
    /// Too many populate errors with the error budget enabled.
    #[display("stopped: error budget exhausted")]
    ErrorBudget,
    /// The configured request cap was reached.
    #[display("stopped: request cap reached")]
    DebugCap,
    #[display("stopped: cancelled")]
    Cancelled,
}

/// Summary of a crawl, or a snapshot of one in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub termination: Termination,
    /// The id the crawl would request next.
    pub next_id: u64,
    pub requests: u64,
    pub parse_errors: u64,
    pub populate_errors: u64,
    /// Successfully populated ids and their archive paths.
    pub cataloged: BTreeMap<u64, String>,
    /// The error behind a [`Transport`](Termination::Transport) or
    /// [`ErrorBudget`](Termination::ErrorBudget) stop.
    pub failure: Option<String>,
}

impl CrawlReport {
    /// Whether the crawl stopped on an error rather than by request or cap.
    pub fn is_failure(&self) -> bool {
        matches!(self.termination, Termination::Transport | Termination::ErrorBudget)
    }

    /// One `<id>:<dir><filename>` line per cataloged id, by ascending id.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.cataloged.iter().map(|(id, path)| format!("{id}:{path}"))
    }
}
