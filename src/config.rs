use crate::constants::DEFAULT_USER_AGENT;
use crate::error::{Result, ScraperError};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    /// Pause between consecutive case-page requests.
    pub delay_ms: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            delay_ms: 250,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,
    pub write_csv: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "Extracted Data".to_string(),
            write_csv: false,
        }
    }
}

impl Config {
    /// Loads `path` if it exists, otherwise falls back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Login for the ExactDial people-search service.
#[derive(Debug, Clone)]
pub struct ExactDialCredentials {
    pub email: String,
    pub password: String,
}

impl ExactDialCredentials {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            email: std::env::var("EXACTDIAL_EMAIL")?,
            password: std::env::var("EXACTDIAL_PASSWORD")?,
        })
    }
}

/// PropStream auth token, issued by an interactive browser login.
pub fn propstream_token_from_env() -> Result<String> {
    Ok(std::env::var("PROPSTREAM_TOKEN")?)
}
