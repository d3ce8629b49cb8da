//! Provider client configuration.

use std::time::Duration;

use crate::poll::PollPolicy;

/// Default Kling API root.
pub const KLING_BASE_URL: &str = "https://api.klingai.com/v1";

/// Default MiniMax API root.
pub const MINIMAX_BASE_URL: &str = "https://api.minimax.chat/v1";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn poll_interval_from_env() -> Duration {
    Duration::from_secs(env_parse("POLL_INTERVAL_SECS").unwrap_or(DEFAULT_POLL_INTERVAL_SECS))
}

fn http_timeout_from_env() -> Duration {
    Duration::from_secs(env_parse("PROVIDER_HTTP_TIMEOUT_SECS").unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
}

/// Kling client configuration.
#[derive(Debug, Clone)]
pub struct KlingConfig {
    /// Whether the server offers Kling at all
    pub enabled: bool,
    /// API root, without trailing slash
    pub base_url: String,
    pub model_name: String,
    /// `std` or `pro`
    pub mode: String,
    /// Clip length in seconds
    pub duration_secs: u32,
    /// Prompt adherence, 0.0 to 1.0
    pub cfg_scale: f32,
    pub poll: PollPolicy,
    /// Timeout of each HTTP call
    pub http_timeout: Duration,
}

impl Default for KlingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: KLING_BASE_URL.to_string(),
            model_name: "kling-v1".to_string(),
            mode: "pro".to_string(),
            duration_secs: 10,
            cfg_scale: 0.5,
            poll: PollPolicy::new(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS), 60),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl KlingConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_parse("KLING_ENABLED").unwrap_or(defaults.enabled),
            base_url: env_non_empty("KLING_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            poll: PollPolicy::new(
                poll_interval_from_env(),
                env_parse("KLING_MAX_POLLS").unwrap_or(defaults.poll.max_polls),
            ),
            http_timeout: http_timeout_from_env(),
            ..defaults
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }
}

/// MiniMax client configuration.
#[derive(Clone)]
pub struct MiniMaxConfig {
    /// Server-side key, used when a request does not bring its own
    pub api_key: Option<String>,
    /// Server-side group id; together with `api_key` it enables MiniMax
    pub group_id: Option<String>,
    /// API root, without trailing slash
    pub base_url: String,
    pub model: String,
    /// Clip length in seconds
    pub duration_secs: u32,
    pub poll: PollPolicy,
    /// Timeout of each HTTP call
    pub http_timeout: Duration,
}

impl std::fmt::Debug for MiniMaxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniMaxConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("group_id", &self.group_id)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("duration_secs", &self.duration_secs)
            .field("poll", &self.poll)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl Default for MiniMaxConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            group_id: None,
            base_url: MINIMAX_BASE_URL.to_string(),
            model: "video-01".to_string(),
            duration_secs: 10,
            poll: PollPolicy::new(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS), 180),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl MiniMaxConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env_non_empty("MINIMAX_API_KEY"),
            group_id: env_non_empty("MINIMAX_GROUP_ID"),
            base_url: env_non_empty("MINIMAX_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            poll: PollPolicy::new(
                poll_interval_from_env(),
                env_parse("MINIMAX_MAX_POLLS").unwrap_or(defaults.poll.max_polls),
            ),
            http_timeout: http_timeout_from_env(),
            ..defaults
        }
    }

    /// MiniMax is offered only with server-side credentials present.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.group_id.is_some()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let kling = KlingConfig::default();
        assert!(kling.enabled);
        assert_eq!(kling.poll.max_polls, 60);
        assert_eq!(kling.poll.interval, Duration::from_secs(5));
        assert_eq!(kling.duration_secs, 10);

        let minimax = MiniMaxConfig::default();
        assert_eq!(minimax.poll.max_polls, 180);
        assert!(!minimax.is_configured());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let kling = KlingConfig::default().with_base_url("http://127.0.0.1:9000/");
        assert_eq!(kling.base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_minimax_debug_redacts_key() {
        let config = MiniMaxConfig {
            api_key: Some("secret-key".into()),
            group_id: Some("grp".into()),
            ..Default::default()
        };
        assert!(config.is_configured());
        assert!(!format!("{config:?}").contains("secret-key"));
    }
}
