// src/ingest/providers/telegram_http.rs
//! Session over a JSON/HTTP Telegram gateway.
//!
//! The gateway owns the MTProto handshake; this side signs in once with the
//! app credentials and then reads channel history with the returned token.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::ingest::error::FetchError;
use crate::ingest::types::{ChannelSession, FetchLimit, RawItem, Source};

#[derive(Clone)]
pub struct Credentials {
    pub api_id: i64,
    pub api_hash: String,
    pub phone: String,
}

// api_hash stays out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_id", &self.api_id)
            .field("api_hash", &"<redacted>")
            .field("phone", &self.phone)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct HttpSessionSettings {
    pub base_url: String,
    pub credentials: Credentials,
    pub timeout: Duration,
    /// Total attempts for transient failures, including the first one.
    pub max_retries: u8,
    pub backoff: Duration,
}

impl HttpSessionSettings {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff: Duration::from_millis(500),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

#[derive(Serialize)]
struct SignInRequest<'a> {
    api_id: i64,
    api_hash: &'a str,
    phone: &'a str,
}

#[derive(Deserialize)]
struct SignInResponse {
    session_token: Option<String>,
}

#[derive(Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    messages: Vec<WireMessage>,
}

#[derive(Deserialize)]
struct WireMessage {
    id: Option<i64>,
    date: Option<WireDate>,
    #[serde(alias = "message")]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireDate {
    Unix(i64),
    Text(String),
}

impl WireDate {
    fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            WireDate::Unix(secs) => DateTime::from_timestamp(*secs, 0),
            WireDate::Text(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

impl WireMessage {
    /// `None` when the message has no usable date.
    fn into_raw(self) -> Option<RawItem> {
        let timestamp = self.date.as_ref().and_then(WireDate::to_utc)?;
        Some(RawItem {
            id: self.id,
            timestamp,
            text: self.text.filter(|t| !t.is_empty()),
        })
    }
}

fn classify(status: StatusCode, body: &str, what: &str) -> FetchError {
    let detail = if body.trim().is_empty() {
        format!("{what}: HTTP {status}")
    } else {
        format!("{what}: HTTP {status}: {}", body.trim())
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchError::Authentication(detail),
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => FetchError::SourceUnreachable(detail),
        _ => FetchError::Transient(detail),
    }
}

async fn retrying<T, F, Fut>(
    max_retries: u8,
    backoff: Duration,
    what: &str,
    mut op: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt: u8 = 0;
    loop {
        attempt += 1;
        match op().await {
            Err(e) if e.is_retryable() && attempt < max_retries => {
                let delay = backoff * (1u32 << (attempt - 1).min(8));
                tracing::debug!(attempt, error = %e, "{what} failed, retrying in {delay:?}");
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
}

pub struct HttpSession {
    client: Client,
    base_url: String,
    token: String,
    max_retries: u8,
    backoff: Duration,
}

impl HttpSession {
    /// Sign in once. Rejected credentials come back as `Authentication`.
    pub async fn connect(settings: &HttpSessionSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| FetchError::Transient(format!("building http client: {e}")))?;
        let base_url = settings.base_url.trim_end_matches('/').to_string();
        let creds = &settings.credentials;

        let endpoint = format!("{base_url}/auth/sign-in");
        let (client_ref, endpoint) = (&client, endpoint.as_str());
        let token = retrying(settings.max_retries, settings.backoff, "sign-in", || async move {
            let resp = client_ref
                .post(endpoint)
                .json(&SignInRequest {
                    api_id: creds.api_id,
                    api_hash: &creds.api_hash,
                    phone: &creds.phone,
                })
                .send()
                .await?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(classify(status, &body, "sign-in"));
            }
            let parsed: SignInResponse = resp
                .json()
                .await
                .map_err(|e| FetchError::Authentication(format!("sign-in response: {e}")))?;
            parsed
                .session_token
                .filter(|t| !t.is_empty())
                .ok_or_else(|| FetchError::Authentication("sign-in returned no session token".into()))
        })
        .await?;

        tracing::info!(phone = %creds.phone, base = %base_url, "telegram session established");

        Ok(Self {
            client,
            base_url,
            token,
            max_retries: settings.max_retries,
            backoff: settings.backoff,
        })
    }

    async fn fetch_page(&self, handle: &str, limit: FetchLimit) -> Result<Vec<WireMessage>, FetchError> {
        let resp = self
            .client
            .get(format!("{}/channels/{handle}/messages", self.base_url))
            .bearer_auth(&self.token)
            .query(&[("limit", limit.get())])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify(status, &body, handle));
        }
        let body: HistoryResponse = resp
            .json()
            .await
            .map_err(|e| FetchError::Transient(format!("{handle}: malformed history response: {e}")))?;
        Ok(body.messages)
    }
}

#[async_trait]
impl ChannelSession for HttpSession {
    async fn fetch(&self, source: &Source, limit: FetchLimit) -> Result<Vec<RawItem>, FetchError> {
        let handle = source
            .handle()
            .ok_or_else(|| FetchError::SourceUnreachable(format!("{source}: not a channel identifier")))?;

        let wire = retrying(self.max_retries, self.backoff, handle, || {
            self.fetch_page(handle, limit)
        })
        .await?;

        let total = wire.len();
        let mut out: Vec<RawItem> = wire.into_iter().filter_map(WireMessage::into_raw).collect();
        let skipped = total - out.len();
        if skipped > 0 {
            tracing::debug!(source = %source, skipped, "dropped messages without a date");
            counter!("scraper_items_skipped_total").increment(skipped as u64);
        }
        out.truncate(limit.get() as usize);
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "telegram-http"
    }
}
