// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use telegram_scraper::ingest::error::FetchError;
use telegram_scraper::{ChannelSession, FetchLimit, RawItem, Source};

/// Canned per-source answers, with optional latency.
#[derive(Default)]
pub struct ScriptedSession {
    answers: HashMap<String, (Result<Vec<RawItem>, FetchError>, Duration)>,
    pub calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(mut self, source: &str, items: Vec<RawItem>) -> Self {
        self.answers
            .insert(source.to_string(), (Ok(items), Duration::ZERO));
        self
    }

    pub fn ok_after(mut self, source: &str, items: Vec<RawItem>, delay: Duration) -> Self {
        self.answers.insert(source.to_string(), (Ok(items), delay));
        self
    }

    pub fn fail(mut self, source: &str, err: FetchError) -> Self {
        self.answers
            .insert(source.to_string(), (Err(err), Duration::ZERO));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelSession for ScriptedSession {
    async fn fetch(&self, source: &Source, limit: FetchLimit) -> Result<Vec<RawItem>, FetchError> {
        self.calls.lock().unwrap().push(source.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let (answer, delay) = self
            .answers
            .get(source.as_str())
            .cloned()
            .unwrap_or_else(|| {
                (
                    Err(FetchError::SourceUnreachable(source.to_string())),
                    Duration::ZERO,
                )
            });
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        answer.map(|mut v| {
            v.truncate(limit.get() as usize);
            v
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// `n` messages tagged `{tag}-0`, `{tag}-1`, ..., newest first.
pub fn messages(tag: &str, n: usize) -> Vec<RawItem> {
    (0..n)
        .map(|i| RawItem {
            id: Some((n - i) as i64),
            timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
                - chrono::Duration::minutes(i as i64),
            text: Some(format!("{tag}-{i}")),
        })
        .collect()
}

pub fn sources(names: &[&str]) -> Vec<Source> {
    names.iter().map(|n| Source::new(n).unwrap()).collect()
}

pub fn unreachable(name: &str) -> FetchError {
    FetchError::SourceUnreachable(format!("{name}: USERNAME_NOT_OCCUPIED"))
}
