//! Provider error types.

use std::time::Duration;
use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors raised while generating clips.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Provider API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Missing field in provider response: {0}")]
    MissingField(&'static str),

    #[error("Video generation failed: {0}")]
    TaskFailed(String),

    #[error("Task still running after {polls} status checks, {interval:?} apart")]
    Timeout { polls: u32, interval: Duration },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No clips generated out of {attempted} (last error: {last_error})")]
    NoClipsGenerated { attempted: usize, last_error: String },
}

impl ProviderError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Auth(_) => "auth",
            Self::Api { .. } => "api",
            Self::MissingField(_) => "missing_field",
            Self::TaskFailed(_) => "task_failed",
            Self::Timeout { .. } => "timeout",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::NoClipsGenerated { .. } => "no_clips",
        }
    }
}
