use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("API error: {message}")]
    Api { message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Integrity faults raised while flattening a batch. These abort the batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("join key mismatch for record {record} ({url}): decedent and fiduciary projections diverged")]
    JoinKeyMismatch { record: usize, url: String },
}

/// A single case page that could not be fetched or parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("failed to fetch {url}: {reason}")]
pub struct FetchError {
    pub url: String,
    pub reason: String,
}

impl FetchError {
    pub fn new(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self {
            url: url.into(),
            reason: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;
