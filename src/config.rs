//! Bus configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`), with sensible defaults for local use.

use std::time::Duration;

/// Top-level event bus configuration.
///
/// Loaded once at startup via [`BusConfig::from_env`], or constructed
/// directly in tests and embedded deployments.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Broker connection URL (e.g. `redis://127.0.0.1:6379`). Unused by the
    /// in-memory broker.
    pub broker_url: String,

    /// Per-channel ring buffer capacity of the in-memory broker.
    pub channel_capacity: usize,

    /// Backoff applied when a listener must reopen its broker subscription.
    pub reconnect: ReconnectPolicy,
}

/// Backoff for reopening failed broker subscriptions.
///
/// The delay for attempt `n` is `first` doubled `n` times, capped at `max`.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    /// Delay before the first retry.
    pub first: Duration,
    /// Maximum delay cap.
    pub max: Duration,
}

impl ReconnectPolicy {
    /// Computes the delay for the given attempt number (0-indexed).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.first.saturating_mul(factor).min(self.max)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            first: Duration::from_millis(200),
            max: Duration::from_secs(30),
        }
    }
}

impl BusConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set or does not parse.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let broker_url = std::env::var("EVENT_BUS_BROKER_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let channel_capacity = parse_env("EVENT_BUS_CHANNEL_CAPACITY", 1024);
        let reconnect_first_ms = parse_env("EVENT_BUS_RECONNECT_FIRST_MS", 200);
        let reconnect_max_secs = parse_env("EVENT_BUS_RECONNECT_MAX_SECS", 30);

        Self {
            broker_url,
            channel_capacity,
            reconnect: ReconnectPolicy {
                first: Duration::from_millis(reconnect_first_ms),
                max: Duration::from_secs(reconnect_max_secs),
            },
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            broker_url: "redis://127.0.0.1:6379".to_string(),
            channel_capacity: 1024,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn reconnect_delay_doubles_up_to_cap() {
        let policy = ReconnectPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(1),
        };
        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
        assert_eq!(policy.delay(10), Duration::from_secs(1));
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn default_config_is_usable() {
        let config = BusConfig::default();
        assert!(config.channel_capacity > 0);
        assert!(config.reconnect.first <= config.reconnect.max);
    }
}
