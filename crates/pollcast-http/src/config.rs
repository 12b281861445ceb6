//! HTTP adapter configuration.

use std::time::Duration;

use pollcast_core::config::millis;
use serde::{Deserialize, Serialize};

/// Outbound delivery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Whole-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Content type announced for the payload.
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_content_type() -> String {
    "text/plain".to_string()
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            content_type: default_content_type(),
        }
    }
}

impl DeliveryConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `POLLCAST_DELIVERY_TIMEOUT` | Request timeout in seconds |
    /// | `POLLCAST_CONNECT_TIMEOUT` | Connect timeout in seconds |
    /// | `POLLCAST_CONTENT_TYPE` | Payload content type |
    pub fn from_env() -> Self {
        Self {
            timeout_ms: env_ms("POLLCAST_DELIVERY_TIMEOUT").unwrap_or_else(default_timeout_ms),
            connect_timeout_ms: env_ms("POLLCAST_CONNECT_TIMEOUT")
                .unwrap_or_else(default_connect_timeout_ms),
            content_type: std::env::var("POLLCAST_CONTENT_TYPE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(default_content_type),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = millis(timeout);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = millis(timeout);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Name of the first zero timeout, if any.
    pub(crate) fn zero_timeout(&self) -> Option<&'static str> {
        if self.timeout_ms == 0 {
            Some("timeout_ms")
        } else if self.connect_timeout_ms == 0 {
            Some("connect_timeout_ms")
        } else {
            None
        }
    }
}

/// Query engine endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryEngineConfig {
    /// Base URL of the query service; polls go to `{url}/poll`.
    #[serde(default = "default_query_url")]
    pub url: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_query_url() -> String {
    "http://localhost:8080/epcis/query".to_string()
}

impl Default for QueryEngineConfig {
    fn default() -> Self {
        Self {
            url: default_query_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl QueryEngineConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `POLLCAST_QUERY_URL` | Query service base URL |
    /// | `POLLCAST_QUERY_TIMEOUT` | Request timeout in seconds |
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("POLLCAST_QUERY_URL").unwrap_or_else(|_| default_query_url()),
            timeout_ms: env_ms("POLLCAST_QUERY_TIMEOUT").unwrap_or_else(default_timeout_ms),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = millis(timeout);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Seconds from the environment, as milliseconds.
fn env_ms(var: &str) -> Option<u64> {
    std::env::var(var)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(|secs| secs.saturating_mul(1000))
}
