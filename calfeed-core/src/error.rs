//! Error types for the calfeed ecosystem.
//!
//! Parse anomalies never surface here: the parser degrades them in place.
//! Per-item reconciliation refusals are not errors either, they land in the
//! skipped bucket of an import report.

use thiserror::Error;

/// Errors that can abort a calfeed operation.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Source '{0}' already exists")]
    SourceExists(String),

    #[error("Tracking link not found: {0}")]
    LinkNotFound(String),

    #[error("Failed to fetch feed from {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Unsupported feed URL '{0}'")]
    UnsupportedUrl(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Serialization(err.to_string())
    }
}

/// Result type alias for calfeed operations.
pub type FeedResult<T> = Result<T, FeedError>;
