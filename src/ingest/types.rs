// src/ingest/types.rs
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::ingest::error::FetchError;

/// Upper bound accepted by the gateway for a single history request.
pub const MAX_FETCH_LIMIT: u32 = 100;

/// One configured channel identifier, kept verbatim as configured.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source(String);

impl Source {
    /// Rejects empty (or whitespace-only) identifiers.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let t = raw.as_ref().trim();
        if t.is_empty() {
            None
        } else {
            Some(Self(t.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Channel username behind the identifier, e.g. `DoctorsET` for
    /// `https://t.me/DoctorsET`. `None` when it cannot name a channel.
    pub fn handle(&self) -> Option<&str> {
        static RE_HANDLE: OnceCell<Regex> = OnceCell::new();
        let re = RE_HANDLE.get_or_init(|| {
            Regex::new(
                r"^(?:(?:https?://)?(?:www\.)?(?:t|telegram)\.me/|@)?(?P<h>[A-Za-z][A-Za-z0-9_]{4,31})/?$",
            )
            .expect("handle regex")
        });
        re.captures(&self.0)
            .and_then(|c| c.name("h"))
            .map(|m| m.as_str())
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Source {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.0)
    }
}

/// Per-source cap on returned items, always within `1..=MAX_FETCH_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimit(u32);

impl FetchLimit {
    pub fn new(n: u32) -> Option<Self> {
        (1..=MAX_FETCH_LIMIT).contains(&n).then_some(Self(n))
    }

    /// Out-of-range values are pulled into range instead of rejected.
    pub fn clamped(n: u32) -> Self {
        Self(n.clamp(1, MAX_FETCH_LIMIT))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for FetchLimit {
    fn default() -> Self {
        Self(MAX_FETCH_LIMIT)
    }
}

/// A message as delivered by the session, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    pub id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub text: Option<String>,
}

/// Flat output row. Column order is `source,date,text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub source: Source,
    #[serde(rename = "date", serialize_with = "serialize_date")]
    pub timestamp: DateTime<Utc>,
    pub text: Option<String>,
}

impl Record {
    pub fn from_raw(item: RawItem, source: &Source) -> Self {
        Self {
            source: source.clone(),
            timestamp: item.timestamp,
            text: item.text,
        }
    }
}

/// `2024-03-01 08:15:00+00:00`, the layout the downstream cleaning step parses.
pub fn format_date(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%:z").to_string()
}

fn serialize_date<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_date(ts))
}

/// Ordered records of one run. Append-only while the run is in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    records: Vec<Record>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn extend_from(&mut self, source: &Source, items: Vec<RawItem>) {
        self.records.reserve(items.len());
        self.records
            .extend(items.into_iter().map(|it| Record::from_raw(it, source)));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn per_source_counts(&self) -> BTreeMap<String, usize> {
        let mut m = BTreeMap::new();
        for r in &self.records {
            *m.entry(r.source.to_string()).or_insert(0) += 1;
        }
        m
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// One authenticated connection to the remote service.
#[async_trait::async_trait]
pub trait ChannelSession: Send + Sync {
    /// Up to `limit` recent messages of `source`, in the order the service
    /// delivers them. Fewer (or zero) items is not an error.
    async fn fetch(&self, source: &Source, limit: FetchLimit) -> Result<Vec<RawItem>, FetchError>;

    fn name(&self) -> &'static str;
}
