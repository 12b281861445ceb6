//! Subscription execution settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SubscriptionError;

/// Timeouts applied around the two network calls of an execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    /// Query engine timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub poll_timeout_ms: u64,

    /// Delivery timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub delivery_timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: default_timeout_ms(),
            delivery_timeout_ms: default_timeout_ms(),
        }
    }
}

impl SubscriptionConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `POLLCAST_POLL_TIMEOUT` | Query engine timeout in seconds |
    /// | `POLLCAST_DELIVERY_TIMEOUT` | Delivery timeout in seconds |
    pub fn from_env() -> Self {
        Self {
            poll_timeout_ms: env_ms("POLLCAST_POLL_TIMEOUT"),
            delivery_timeout_ms: env_ms("POLLCAST_DELIVERY_TIMEOUT"),
        }
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout_ms = millis(timeout);
        self
    }

    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout_ms = millis(timeout);
        self
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }

    /// Reject timeouts that would fail every execution.
    pub fn validate(&self) -> Result<(), SubscriptionError> {
        if self.poll_timeout_ms == 0 {
            return Err(SubscriptionError::ZeroTimeout {
                name: "poll_timeout_ms",
            });
        }
        if self.delivery_timeout_ms == 0 {
            return Err(SubscriptionError::ZeroTimeout {
                name: "delivery_timeout_ms",
            });
        }
        Ok(())
    }
}

/// Whole milliseconds, rounded up so a non-zero duration stays non-zero.
pub fn millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
}

fn env_ms(var: &str) -> u64 {
    std::env::var(var)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map_or_else(default_timeout_ms, |secs| secs.saturating_mul(1000))
}
