// src/ingest/mod.rs
pub mod config;
pub mod error;
pub mod providers;
pub mod types;

use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;

use crate::ingest::error::FetchError;
use crate::ingest::types::{ChannelSession, FetchLimit, RawItem, ResultSet, Source};

/// One-time metrics registration (so series show up in the snapshot).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scraper_fetch_total", "Fetch attempts, one per source.");
        describe_counter!(
            "scraper_fetch_errors_total",
            "Failed fetches, labelled by error kind."
        );
        describe_counter!(
            "scraper_records_total",
            "Records appended to the result set."
        );
        describe_counter!(
            "scraper_items_skipped_total",
            "Messages dropped by the session for missing required fields."
        );
        describe_histogram!("scraper_fetch_ms", "Per-source fetch time in milliseconds.");
        describe_gauge!("scraper_last_run_ts", "Unix ts when a run last completed.");
    });
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub limit: FetchLimit,
    /// Maximum fetches in flight. `1` means strictly sequential.
    pub concurrency: usize,
    pub fetch_timeout: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            limit: FetchLimit::default(),
            concurrency: 1,
            fetch_timeout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Fetched { source: Source, count: usize },
    Failed { source: Source, error: FetchError },
}

impl SourceOutcome {
    pub fn source(&self) -> &Source {
        match self {
            SourceOutcome::Fetched { source, .. } | SourceOutcome::Failed { source, .. } => source,
        }
    }
}

/// Everything a completed run produced. Never built for an aborted run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub results: ResultSet,
    pub outcomes: Vec<SourceOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &Source> {
        self.outcomes.iter().filter_map(|o| match o {
            SourceOutcome::Fetched { source, .. } => Some(source),
            SourceOutcome::Failed { .. } => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (&Source, &FetchError)> {
        self.outcomes.iter().filter_map(|o| match o {
            SourceOutcome::Failed { source, error } => Some((source, error)),
            SourceOutcome::Fetched { .. } => None,
        })
    }
}

async fn fetch_one<S>(
    session: &S,
    source: &Source,
    opts: &RunOptions,
) -> Result<Vec<RawItem>, FetchError>
where
    S: ChannelSession + ?Sized,
{
    let t0 = Instant::now();
    counter!("scraper_fetch_total").increment(1);

    let res = match opts.fetch_timeout {
        Some(limit) => match tokio::time::timeout(limit, session.fetch(source, opts.limit)).await {
            Ok(r) => r,
            Err(_) => Err(FetchError::Transient(format!(
                "fetch timed out after {}s",
                limit.as_secs_f64()
            ))),
        },
        None => session.fetch(source, opts.limit).await,
    };

    histogram!("scraper_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    res
}

/// Fetch every source through one session and aggregate the records.
///
/// Records keep the session's per-source order, and sources keep their
/// configured order, whatever `opts.concurrency` is. Unreachable sources
/// and transient failures are logged and skipped. An authentication
/// failure aborts the run and is returned as the error.
pub async fn run_once<S>(
    session: &S,
    sources: &[Source],
    opts: &RunOptions,
) -> Result<RunReport, FetchError>
where
    S: ChannelSession + ?Sized,
{
    ensure_metrics_described();

    let mut results = ResultSet::new();
    let mut outcomes = Vec::with_capacity(sources.len());

    // `buffered` yields in input order even when later fetches finish first.
    let mut fetches = stream::iter(sources)
        .map(|source| async move { (source, fetch_one(session, source, opts).await) })
        .buffered(opts.concurrency.max(1));

    while let Some((source, res)) = fetches.next().await {
        match res {
            Ok(items) => {
                let count = items.len();
                results.extend_from(source, items);
                counter!("scraper_records_total").increment(count as u64);
                tracing::info!(source = %source, count, "scraped {count} messages from {source}");
                outcomes.push(SourceOutcome::Fetched {
                    source: source.clone(),
                    count,
                });
            }
            Err(e) if e.is_fatal() => {
                counter!("scraper_fetch_errors_total", "kind" => e.kind()).increment(1);
                tracing::error!(source = %source, error = %e, "session rejected, aborting run");
                return Err(e);
            }
            Err(e) => {
                counter!("scraper_fetch_errors_total", "kind" => e.kind()).increment(1);
                tracing::error!(source = %source, error = %e, "error scraping {source}");
                outcomes.push(SourceOutcome::Failed {
                    source: source.clone(),
                    error: e,
                });
            }
        }
    }

    gauge!("scraper_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);

    Ok(RunReport { results, outcomes })
}
