// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod app;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod output;

pub use crate::app::{run, run_with_session, ScrapeError};
pub use crate::config::ScraperConfig;
pub use crate::ingest::types::{ChannelSession, FetchLimit, RawItem, Record, ResultSet, Source};
pub use crate::ingest::{run_once, RunOptions, RunReport, SourceOutcome};
