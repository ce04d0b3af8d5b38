// src/app.rs
//! One scrape run: placeholder, sign-in, fetch every channel, persist.

use std::path::Path;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{ConfigError, ScraperConfig};
use crate::ingest::config::{load_channels_default, load_channels_from};
use crate::ingest::error::FetchError;
use crate::ingest::providers::HttpSession;
use crate::ingest::types::{ChannelSession, Source};
use crate::ingest::{self, RunOptions, RunReport};
use crate::output::{self, OutputError};

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("telegram session unusable: {0}")]
    Session(#[source] FetchError),

    #[error("failed to save messages: {0}")]
    Output(#[from] OutputError),
}

impl ScrapeError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ScrapeError::Config(_) => 1,
            ScrapeError::Session(_) => 2,
            ScrapeError::Output(_) => 3,
        }
    }
}

/// Fetch all `sources` through an already established session and replace
/// the dataset at `output_path`. The file is untouched if the run aborts.
pub async fn run_with_session<S>(
    session: &S,
    sources: &[Source],
    opts: &RunOptions,
    output_path: &Path,
) -> Result<RunReport, ScrapeError>
where
    S: ChannelSession + ?Sized,
{
    info!(
        session = session.name(),
        channels = sources.len(),
        limit = opts.limit.get(),
        "scraping started"
    );

    let report = ingest::run_once(session, sources, opts)
        .await
        .map_err(ScrapeError::Session)?;

    output::persist(output_path, &report.results)?;

    let failed = report.failed().count();
    if failed > 0 {
        warn!(failed, "some channels could not be scraped");
    }
    info!(
        records = report.results.len(),
        per_source = ?report.results.per_source_counts(),
        succeeded = report.succeeded().count(),
        failed,
        path = %output_path.display(),
        "scraping finished"
    );
    Ok(report)
}

/// Full run against the configured gateway.
pub async fn run(cfg: &ScraperConfig) -> Result<RunReport, ScrapeError> {
    info!("Telegram scraper started");

    let sources = match &cfg.channels_path {
        Some(p) => load_channels_from(p),
        None => load_channels_default(),
    }
    .map_err(ConfigError::Channels)?;
    output::ensure_placeholder(&cfg.text_data_path)?;
    info!(
        text_data_path = %cfg.text_data_path.display(),
        image_folder = %cfg.image_folder.display(),
        "output locations"
    );

    let session = HttpSession::connect(&cfg.session_settings())
        .await
        .map_err(|e| {
            error!(error = %e, "could not establish telegram session");
            ScrapeError::Session(e)
        })?;

    run_with_session(&session, &sources, &cfg.run_options(), &cfg.text_data_path).await
}
