//! The sequential crawl loop.

use crate::enrich::Enricher;
use crate::error::{ErrorKind, Result};
use crate::fetch::Fetcher;
use crate::policy::{CrawlPolicy, Jitter, POPULATE_ERROR_THRESHOLD};
use crate::report::{CrawlReport, Termination};
use crate::sink::{Persisted, RecordSink};
use idmirror_extract::{PathResolver, ResponseParser, populate};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::Span;

/// What one [`Crawler::step`] did with its id.
#[derive(Debug)]
pub enum Outcome {
    Cataloged { id: u64, path: String, persisted: Persisted },
    /// The body could not be decoded; counted and skipped.
    ParseFailed { id: u64, error: idmirror_extract::error::Error },
    /// The body decoded but held no usable entry; counts against the error
    /// budget.
    PopulateFailed { id: u64, error: idmirror_extract::error::Error },
    /// Ends the crawl when running under [`Crawler::run`].
    TransportFailed { id: u64, error: crate::error::Error },
}

/// Walks the archive's id space one request at a time.
///
/// Every event is parented on the span given to [`with_span`](Self::with_span)
/// rather than on whatever span happens to be current.
pub struct Crawler<F, P> {
    fetcher: F,
    parser: P,
    policy: CrawlPolicy,
    jitter: Jitter,
    enricher: Option<Enricher>,
    span: Span,
    cancel: CancellationToken,
    next_id: u64,
    requests: u64,
    parse_errors: u64,
    populate_errors: u64,
    cataloged: BTreeMap<u64, String>,
    termination: Termination,
    failure: Option<String>,
}

impl<F: Fetcher, P: ResponseParser> Crawler<F, P> {
    pub fn new(fetcher: F, parser: P, policy: CrawlPolicy) -> Result<Self> {
        if policy.start_id == 0 {
            exn::bail!(ErrorKind::InvalidPolicy("ids start at 1"));
        }
        if policy.max_requests == Some(0) {
            exn::bail!(ErrorKind::InvalidPolicy("request cap must be at least 1"));
        }
        Ok(Self {
            fetcher,
            parser,
            jitter: Jitter::new(policy.jitter),
            enricher: None,
            span: Span::none(),
            cancel: CancellationToken::new(),
            next_id: policy.start_id,
            requests: 0,
            parse_errors: 0,
            populate_errors: 0,
            cataloged: BTreeMap::new(),
            termination: Termination::Continuing,
            failure: None,
            policy,
        })
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Inspect each record's container in a local mirror before persisting.
    pub fn with_enricher(mut self, enricher: Enricher) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Make the inter-request delays reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.jitter = Jitter::seeded(self.policy.jitter, seed);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn report(&self) -> CrawlReport {
        CrawlReport {
            termination: self.termination,
            next_id: self.next_id,
            requests: self.requests,
            parse_errors: self.parse_errors,
            populate_errors: self.populate_errors,
            cataloged: self.cataloged.clone(),
            failure: self.failure.clone(),
        }
    }

    /// Request the next id and catalog whatever comes back.
    ///
    /// The id advances whatever the outcome. Only a failure to persist is an
    /// `Err`.
    pub async fn step<S: RecordSink + ?Sized>(&mut self, sink: &mut S) -> Result<Outcome> {
        let id = self.next_id;
        self.next_id += 1;
        self.requests += 1;

        let body = match self.fetcher.fetch(id).await {
            Ok(body) => body,
            Err(error) => {
                tracing::warn!(parent: &self.span, id, error = ?error, "Request failed");
                return Ok(Outcome::TransportFailed { id, error });
            },
        };
        let response = match self.parser.parse(&body) {
            Ok(response) => response,
            Err(error) => {
                self.parse_errors += 1;
                tracing::warn!(parent: &self.span, id, error = ?error, "Unparseable response");
                return Ok(Outcome::ParseFailed { id, error });
            },
        };
        let mut record = match populate(response, id) {
            Ok(record) => record,
            Err(error) => {
                self.populate_errors += 1;
                tracing::info!(
                    parent: &self.span,
                    id,
                    error = ?error,
                    populate_errors = self.populate_errors,
                    "No usable entry"
                );
                return Ok(Outcome::PopulateFailed { id, error });
            },
        };

        if let Some(enricher) = &self.enricher {
            match enricher.inspect(&record).await {
                Ok(Some(inspection)) => record = record.with_inspection(inspection.checksum, inspection.levels),
                Ok(None) => {},
                Err(error) => tracing::warn!(parent: &self.span, id, error = ?error, "Cataloging without inspection"),
            }
        }

        let persisted = match sink.persist(&record).await {
            Ok(persisted) => persisted,
            Err(error) => {
                tracing::error!(parent: &self.span, id, error = ?error, "Catalog rejected record");
                return Err(error);
            },
        };
        let path = record.path();
        tracing::info!(parent: &self.span, id, path = path.as_str(), ?persisted, "Cataloged");
        self.cataloged.insert(id, path.clone());
        Ok(Outcome::Cataloged { id, path, persisted })
    }

    /// Step until the crawl reaches a terminal state.
    pub async fn run<S: RecordSink + ?Sized>(&mut self, sink: &mut S) -> Result<CrawlReport> {
        tracing::info!(parent: &self.span, start_id = self.next_id, "Crawl started");
        self.termination = Termination::Continuing;
        self.failure = None;
        while self.termination == Termination::Continuing {
            self.termination = self.advance(sink).await?;
        }
        tracing::info!(
            parent: &self.span,
            termination = %self.termination,
            next_id = self.next_id,
            requests = self.requests,
            cataloged = self.cataloged.len(),
            parse_errors = self.parse_errors,
            populate_errors = self.populate_errors,
            "Crawl finished"
        );
        Ok(self.report())
    }

    async fn advance<S: RecordSink + ?Sized>(&mut self, sink: &mut S) -> Result<Termination> {
        if self.cancel.is_cancelled() {
            return Ok(Termination::Cancelled);
        }
        match self.step(sink).await? {
            Outcome::TransportFailed { id, error } => {
                self.failure = Some(format!("request for id {id} failed: {error:?}"));
                return Ok(Termination::Transport);
            },
            Outcome::PopulateFailed { id, error }
                if self.policy.error_budget && self.populate_errors > POPULATE_ERROR_THRESHOLD =>
            {
                self.failure = Some(format!(
                    "{} populate errors, the last for id {id}: {error:?}",
                    self.populate_errors
                ));
                return Ok(Termination::ErrorBudget);
            },
            _ => {},
        }
        if self.policy.max_requests.is_some_and(|max| self.requests >= max) {
            return Ok(Termination::DebugCap);
        }
        if !self.pause().await {
            return Ok(Termination::Cancelled);
        }
        Ok(Termination::Continuing)
    }

    /// Sleep for a jittered delay; `false` if cancelled meanwhile.
    async fn pause(&mut self) -> bool {
        let delay = self.jitter.next_delay();
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }
}
