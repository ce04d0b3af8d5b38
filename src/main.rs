//! Telegram channel scraper — binary entrypoint.
//! Loads `.env`, sets up logging, runs one scrape and maps the outcome to an exit code.

use std::path::PathBuf;
use std::process::ExitCode;

use telegram_scraper::config::scraper::DEFAULT_LOG_DIR;
use telegram_scraper::metrics::Metrics;
use telegram_scraper::{logging, ScrapeError, ScraperConfig};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();

    // Config comes first so logging can use its log dir; a config error is
    // reported once logging is up.
    let cfg = ScraperConfig::from_env();
    let log_dir = cfg
        .as_ref()
        .map_or_else(|_| PathBuf::from(DEFAULT_LOG_DIR), |c| c.log_dir.clone());
    let _guard = match logging::init(&log_dir) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("failed to initialise logging: {e:#}");
            return ExitCode::from(1);
        }
    };

    let cfg = match cfg {
        Ok(c) => c,
        Err(e) => {
            let err = ScrapeError::from(e);
            tracing::error!(error = %err, "cannot start");
            return ExitCode::from(err.exit_code());
        }
    };

    let metrics = cfg.metrics_path.as_deref().and_then(|p| match Metrics::init(p) {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(error = ?e, "metrics disabled");
            None
        }
    });

    let outcome = telegram_scraper::run(&cfg).await;

    if let Some(m) = &metrics {
        if let Err(e) = m.write_snapshot() {
            tracing::warn!(error = ?e, "metrics snapshot not written");
        }
    }

    match outcome {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "scrape aborted");
            ExitCode::from(e.exit_code())
        }
    }
}
