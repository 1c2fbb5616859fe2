use crate::cli::CrawlArgs;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use idmirror_config::Config;
use idmirror_crawler::{CrawlPolicy, CrawlReport, Crawler, Enricher, HttpFetcher};
use idmirror_extract::{JsonParser, ResponseParser};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tokio_util::sync::CancellationToken;

pub async fn run(config: Option<&Path>, args: CrawlArgs) -> Result<()> {
    let mut config = super::load_config(config)?;
    apply(&mut config, &args);
    config.validate().or_raise(|| ErrorKind::Config)?;
    let parser = JsonParser;
    check_format(&config, &parser)?;

    let mut repo = super::open_catalog(&config).await?;
    let fetcher =
        HttpFetcher::new(&config.api_url, parser.wants_json(), config.timeout()).or_raise(|| ErrorKind::Crawl)?;
    let policy = CrawlPolicy {
        start_id: config.start_id,
        jitter: config.jitter(),
        max_requests: config.request_cap(),
        error_budget: config.error_budget,
    };
    let cancel = CancellationToken::new();
    let mut crawler = Crawler::new(fetcher, parser, policy)
        .or_raise(|| ErrorKind::Crawl)?
        .with_span(tracing::info_span!("crawl", api = config.api_url.as_str()))
        .with_cancellation(cancel.clone());
    if let Some(mirror) = &config.mirror {
        crawler = crawler.with_enricher(Enricher::new(mirror));
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted; stopping after the current request");
            cancel.cancel();
        }
    });

    // Whatever was committed before a catalog failure is still reported.
    let result = crawler.run(&mut repo).await;
    let report = crawler.report();
    let closed = repo.close().await;
    write_report(&report, args.output.as_deref())?;
    result.or_raise(|| ErrorKind::Crawl)?;
    closed.or_raise(|| ErrorKind::Catalog)?;
    conclude(&report)
}

/// The API is asked for exactly the format the parser decodes.
fn check_format(config: &Config, parser: &impl ResponseParser) -> Result<()> {
    if config.json != parser.wants_json() {
        exn::bail!(ErrorKind::Unsupported("only JSON responses can be decoded; set json = true"));
    }
    Ok(())
}

/// A crawl stopped by a failure fails the command.
fn conclude(report: &CrawlReport) -> Result<()> {
    if report.is_failure() {
        let cause = report.failure.as_deref().unwrap_or("unknown cause");
        exn::bail!(ErrorKind::Stopped(format!(
            "{} at id {} ({cause}); resume with --start-id {}",
            report.termination,
            report.next_id.saturating_sub(1),
            report.next_id
        )));
    }
    tracing::info!(
        termination = %report.termination,
        resume_from = report.next_id,
        cataloged = report.cataloged.len(),
        "Done"
    );
    Ok(())
}

/// Command line flags win over every configuration source.
fn apply(config: &mut Config, args: &CrawlArgs) {
    if let Some(start_id) = args.start_id {
        config.start_id = start_id;
    }
    if let Some(jitter) = args.jitter {
        config.jitter = jitter;
    }
    config.debug |= args.debug;
    if args.no_error_budget {
        config.error_budget = false;
    }
}

fn write_report(report: &CrawlReport, output: Option<&Path>) -> Result<()> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path).or_raise(|| ErrorKind::Output)?)),
        None => Box::new(io::stdout().lock()),
    };
    for line in report.lines() {
        writeln!(writer, "{line}").or_raise(|| ErrorKind::Output)?;
    }
    writer.flush().or_raise(|| ErrorKind::Output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use idmirror_crawler::Termination;
    use rstest::rstest;

    #[test]
    fn test_flags_override_config() {
        let mut config = Config { start_id: 40, error_budget: true, ..Config::default() };
        let args =
            CrawlArgs { start_id: Some(1200), debug: true, no_error_budget: true, jitter: Some(0.0), output: None };
        apply(&mut config, &args);
        assert_eq!(config.start_id, 1200);
        assert_eq!(config.jitter, 0.0);
        assert!(!config.error_budget);
        assert_eq!(config.request_cap(), Some(idmirror_config::DEBUG_REQUEST_CAP));
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let mut config = Config { start_id: 40, jitter: 2.5, ..Config::default() };
        let args = CrawlArgs { start_id: None, debug: false, no_error_budget: false, jitter: None, output: None };
        apply(&mut config, &args);
        assert_eq!(config.start_id, 40);
        assert_eq!(config.jitter, 2.5);
        assert!(config.error_budget);
    }

    fn report(termination: Termination, failure: Option<&str>) -> CrawlReport {
        CrawlReport {
            termination,
            next_id: 43,
            requests: 42,
            parse_errors: 0,
            populate_errors: 0,
            cataloged: Default::default(),
            failure: failure.map(str::to_string),
        }
    }

    #[rstest]
    #[case(Termination::Transport)]
    #[case(Termination::ErrorBudget)]
    fn test_failed_crawl_is_an_error(#[case] termination: Termination) {
        let err = conclude(&report(termination, Some("HTTP status 503"))).unwrap_err();
        let ErrorKind::Stopped(message) = &*err else { panic!("expected a stopped crawl, got {err:?}") };
        assert!(message.contains("HTTP status 503"));
        assert!(message.contains("--start-id 43"));
    }

    #[rstest]
    #[case(Termination::DebugCap)]
    #[case(Termination::Cancelled)]
    fn test_finished_crawl_is_ok(#[case] termination: Termination) {
        assert!(conclude(&report(termination, None)).is_ok());
    }

    #[test]
    fn test_format_must_match_parser() {
        assert!(check_format(&Config::default(), &JsonParser).is_ok());
        let xml = Config { json: false, ..Config::default() };
        let err = check_format(&xml, &JsonParser).unwrap_err();
        assert!(matches!(*err, ErrorKind::Unsupported(_)));
    }

    #[test]
    fn test_report_lines_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cataloged.txt");
        let mut report = report(Termination::Transport, Some("transport error"));
        report.cataloged.insert(10, "levels/doom/b.zip".to_string());
        report.cataloged.insert(9, "levels/doom/a.zip".to_string());
        write_report(&report, Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "9:levels/doom/a.zip\n10:levels/doom/b.zip\n");
    }
}
