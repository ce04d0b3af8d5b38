// src/ingest/error.rs
use thiserror::Error;

/// Failure of a single fetch. Only `Authentication` is fatal for a run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("source unreachable: {0}")]
    SourceUnreachable(String),

    #[error("transient network error: {0}")]
    Transient(String),
}

impl FetchError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchError::Authentication(_))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }

    /// Short label used as a metrics dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Authentication(_) => "authentication",
            FetchError::SourceUnreachable(_) => "unreachable",
            FetchError::Transient(_) => "transient",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transient(err.to_string())
    }
}
