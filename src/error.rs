// Error types for narrator

use thiserror::Error;

/// Result type for narrator operations
pub type Result<T> = std::result::Result<T, NarratorError>;

/// Errors that can occur anywhere in the narration pipeline
#[derive(Error, Debug)]
pub enum NarratorError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{service} API error (status {status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No data available: {0}")]
    NoData(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("MCP protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl NarratorError {
    /// Whether this error means the hosted service asked us to slow down.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            NarratorError::RateLimited(_) => true,
            NarratorError::Api { status: 429, .. } => true,
            other => mentions_rate_limit(&other.to_string()),
        }
    }
}

/// Detects rate limiting reported in free text, e.g. a model reply that echoes the quota error.
pub fn mentions_rate_limit(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("429") || lower.contains("quota exceeded") || lower.contains("rate limit")
}
