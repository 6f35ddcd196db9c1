use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Construction parameters forwarded to the market-data SDK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    pub ws_url: String,
    pub request_timeout_ms: u64,
    pub endpoints: FeedEndpoints,
    pub reconnect: ReconnectPolicy,
    /// Upper bound on trades buffered while the widget is busy.
    pub max_buffer_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_owned(),
            ws_url: "ws://127.0.0.1:8080/ws".to_owned(),
            request_timeout_ms: 10_000,
            endpoints: FeedEndpoints::default(),
            reconnect: ReconnectPolicy::default(),
            max_buffer_size: 1_000,
        }
    }
}

impl FeedConfig {
    #[must_use]
    pub fn with_urls(mut self, base_url: &str, ws_url: &str) -> Self {
        self.base_url = base_url.to_owned();
        self.ws_url = ws_url.to_owned();
        self
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Joins `base_url` and an endpoint path with exactly one slash.
    #[must_use]
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedEndpoints {
    pub token_info: String,
    pub history: String,
    pub trades: String,
}

impl Default for FeedEndpoints {
    fn default() -> Self {
        Self {
            token_info: "/token/info".to_owned(),
            history: "/token/kline".to_owned(),
            trades: "/token/trades".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 5,
            delay_ms: 3_000,
        }
    }
}

impl ReconnectPolicy {
    #[must_use]
    pub fn delay(self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}
