// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::types::Source;

pub const ENV_CHANNELS_PATH: &str = "SCRAPER_CHANNELS_PATH";

/// Channels scraped when no list file is configured.
pub const DEFAULT_CHANNELS: &[&str] = &[
    "https://t.me/DoctorsET",
    "https://t.me/CheMed123",
    "https://t.me/lobelia4cosmetics",
    "https://t.me/yetenaweg",
    "https://t.me/EAHCI",
];

pub fn default_channels() -> Vec<Source> {
    DEFAULT_CHANNELS.iter().filter_map(Source::new).collect()
}

/// Load the channel list from an explicit path. Supports TOML or JSON formats.
pub fn load_channels_from(path: &Path) -> Result<Vec<Source>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading channel list from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_channels(&content, ext.as_str())
        .with_context(|| format!("parsing channel list {}", path.display()))
}

/// Load the channel list using env var + fallbacks:
/// 1) $SCRAPER_CHANNELS_PATH
/// 2) config/channels.toml
/// 3) config/channels.json
/// 4) the built-in default list
pub fn load_channels_default() -> Result<Vec<Source>> {
    if let Ok(p) = std::env::var(ENV_CHANNELS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_channels_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CHANNELS_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/channels.toml");
    if toml_p.exists() {
        return load_channels_from(&toml_p);
    }
    let json_p = PathBuf::from("config/channels.json");
    if json_p.exists() {
        return load_channels_from(&json_p);
    }
    Ok(default_channels())
}

fn parse_channels(s: &str, hint_ext: &str) -> Result<Vec<Source>> {
    let try_toml = hint_ext == "toml" || s.contains("channels");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported channel list format"))
}

fn parse_toml(s: &str) -> Result<Vec<Source>> {
    #[derive(serde::Deserialize)]
    struct TomlChannels {
        channels: Vec<String>,
    }
    let v: TomlChannels = toml::from_str(s)?;
    Ok(clean_list(v.channels))
}

fn parse_json(s: &str) -> Result<Vec<Source>> {
    let v: Vec<String> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

/// Trims and drops blanks. Repeats are kept: every entry is one fetch, in list order.
fn clean_list(items: Vec<String>) -> Vec<Source> {
    items.iter().filter_map(Source::new).collect()
}
