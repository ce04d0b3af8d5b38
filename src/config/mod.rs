// src/config/mod.rs
pub mod scraper;

pub use scraper::{ConfigError, ScraperConfig};
