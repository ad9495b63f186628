//! Realtime client configuration.

use std::time::Duration;

/// Default backend address.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8090";

/// Path of the realtime endpoint, relative to the base URL.
pub const REALTIME_PATH: &str = "/api/realtime";

/// Configuration for [`RealtimeClient`](crate::realtime::RealtimeClient).
///
/// # Example
///
/// ```
/// use recordstream::config::RealtimeConfig;
/// use std::time::Duration;
///
/// let config = RealtimeConfig::new("http://localhost:8090/")
///     .with_auth_token("token")
///     .with_identity_wait(Duration::from_millis(500));
/// assert_eq!(config.realtime_url(), "http://localhost:8090/api/realtime");
/// ```
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Backend base URL
    pub base_url: String,
    /// Sent as the `Authorization` header when set
    pub auth_token: Option<String>,
    /// How long subscription calls wait for the connect handshake
    pub identity_wait: Duration,
    /// Timeout for subscription POSTs (the event stream has none)
    pub request_timeout: Duration,
    /// First delay after a failed stream open
    pub reconnect_min_backoff: Duration,
    /// Upper bound for the stream open backoff
    pub reconnect_max_backoff: Duration,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: None,
            identity_wait: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
            reconnect_min_backoff: Duration::from_millis(500),
            reconnect_max_backoff: Duration::from_secs(30),
        }
    }
}

impl RealtimeConfig {
    /// Create a config pointing at `base_url` with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the auth token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the identity wait used by subscription calls.
    pub fn with_identity_wait(mut self, wait: Duration) -> Self {
        self.identity_wait = wait;
        self
    }

    /// Set the subscription POST timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the stream reopen backoff bounds.
    pub fn with_reconnect_backoff(mut self, min: Duration, max: Duration) -> Self {
        self.reconnect_min_backoff = min;
        self.reconnect_max_backoff = max.max(min);
        self
    }

    /// Create config from `RECORDSTREAM_URL` and `RECORDSTREAM_AUTH_TOKEN`.
    pub fn from_env() -> Self {
        let mut config = match std::env::var("RECORDSTREAM_URL") {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::default(),
        };
        if let Ok(token) = std::env::var("RECORDSTREAM_AUTH_TOKEN") {
            if !token.is_empty() {
                config = config.with_auth_token(token);
            }
        }
        config
    }

    /// Full URL of the realtime endpoint.
    pub fn realtime_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), REALTIME_PATH)
    }

    /// Backoff before stream open attempt `attempt` (1-based).
    ///
    /// Doubles from `reconnect_min_backoff`, capped at `reconnect_max_backoff`.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.reconnect_min_backoff
            .saturating_mul(1u32 << shift)
            .min(self.reconnect_max_backoff)
    }
}
