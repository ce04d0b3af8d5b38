// src/config/scraper.rs
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::ingest::providers::{Credentials, HttpSessionSettings};
use crate::ingest::types::FetchLimit;
use crate::ingest::RunOptions;

pub const ENV_API_ID: &str = "TELEGRAM_API_ID";
pub const ENV_API_HASH: &str = "TELEGRAM_API_HASH";
pub const ENV_PHONE: &str = "TELEGRAM_PHONE_NUMBER";
pub const ENV_API_BASE: &str = "TELEGRAM_API_BASE";
pub const ENV_TEXT_DATA_PATH: &str = "TEXT_DATA_PATH";
pub const ENV_IMAGE_FOLDER: &str = "IMAGE_FOLDER";
pub const ENV_LOG_DIR: &str = "LOG_DIR";
pub const ENV_FETCH_LIMIT: &str = "SCRAPER_FETCH_LIMIT";
pub const ENV_CONCURRENCY: &str = "SCRAPER_CONCURRENCY";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "SCRAPER_FETCH_TIMEOUT_SECS";
pub const ENV_METRICS_PATH: &str = "SCRAPER_METRICS_PATH";

pub const ENV_CHANNELS_PATH: &str = crate::ingest::config::ENV_CHANNELS_PATH;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8081";
pub const DEFAULT_TEXT_DATA_PATH: &str = "data/raw/scraped_messages.csv";
pub const DEFAULT_IMAGE_FOLDER: &str = "data/raw/images";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {0} env var")]
    Missing(&'static str),

    #[error("{key} must be {expected}, got {value:?}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("channel list: {0:#}")]
    Channels(anyhow::Error),
}

fn parse_var<T: std::str::FromStr>(
    key: &'static str,
    value: String,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value.parse::<T>().map_err(|_| ConfigError::Invalid {
        key,
        expected,
        value,
    })
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub credentials: Credentials,
    pub api_base: String,
    pub text_data_path: PathBuf,
    /// Not used by the scraper itself; the image step downstream reads it.
    pub image_folder: PathBuf,
    pub log_dir: PathBuf,
    pub fetch_limit: FetchLimit,
    pub concurrency: usize,
    pub fetch_timeout: Option<Duration>,
    pub metrics_path: Option<PathBuf>,
    /// Explicit channel list file; `None` falls back to `config/channels.*`.
    pub channels_path: Option<PathBuf>,
}

impl ScraperConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |k: &'static str| get(k).ok_or(ConfigError::Missing(k));

        let api_id = parse_var::<i64>(ENV_API_ID, required(ENV_API_ID)?, "an integer")?;
        let credentials = Credentials {
            api_id,
            api_hash: required(ENV_API_HASH)?,
            phone: required(ENV_PHONE)?,
        };

        let fetch_limit = match get(ENV_FETCH_LIMIT) {
            Some(v) => FetchLimit::clamped(parse_var(ENV_FETCH_LIMIT, v, "a positive integer")?),
            None => FetchLimit::default(),
        };

        let concurrency = match get(ENV_CONCURRENCY) {
            Some(v) => parse_var::<usize>(ENV_CONCURRENCY, v, "a positive integer")?.max(1),
            None => 1,
        };

        // 0 disables the per-fetch timeout.
        let timeout_secs = match get(ENV_FETCH_TIMEOUT_SECS) {
            Some(v) => parse_var(ENV_FETCH_TIMEOUT_SECS, v, "a number of seconds")?,
            None => DEFAULT_FETCH_TIMEOUT_SECS,
        };

        Ok(Self {
            credentials,
            api_base: get(ENV_API_BASE).unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            text_data_path: get(ENV_TEXT_DATA_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TEXT_DATA_PATH)),
            image_folder: get(ENV_IMAGE_FOLDER)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_FOLDER)),
            log_dir: get(ENV_LOG_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            fetch_limit,
            concurrency,
            fetch_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            metrics_path: get(ENV_METRICS_PATH).map(PathBuf::from),
            channels_path: get(ENV_CHANNELS_PATH).map(PathBuf::from),
        })
    }

    pub fn session_settings(&self) -> HttpSessionSettings {
        HttpSessionSettings::new(self.api_base.clone(), self.credentials.clone())
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            limit: self.fetch_limit,
            concurrency: self.concurrency,
            fetch_timeout: self.fetch_timeout,
        }
    }
}
