//! Configuration types for the relay core.
//!
//! Provides JSON-serializable configuration for the message queue engine,
//! the sliding-window rate limiter, and the background sweeper.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Relay core configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct RelayConfig {
    /// Message queue settings
    pub queue: QueueConfig,

    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,

    /// Background sweep settings
    pub sweep: SweepConfig,
}

impl RelayConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no engine can run with.
    pub fn validate(&self) -> Result<()> {
        if self.queue.ttl_secs == 0 {
            bail!("queue.ttl-secs must be at least 1");
        }
        if let Some(0) = self.queue.max_backlog_per_controller {
            bail!("queue.max-backlog-per-controller must be at least 1 when set");
        }
        if self.rate_limit.window_secs == 0 {
            bail!("rate-limit.window-secs must be at least 1");
        }
        if self.rate_limit.max_requests == 0 {
            bail!("rate-limit.max-requests must be at least 1");
        }
        if self.sweep.interval_secs == 0 {
            bail!("sweep.interval-secs must be at least 1");
        }
        Ok(())
    }
}

// ============================================================================
// Message Queue Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct QueueConfig {
    /// Time-to-live for every queued entry, in seconds.
    ///
    /// Applied uniformly to both the command backlog and the status slot;
    /// there is no per-message override.
    pub ttl_secs: u64,

    /// Maximum queued commands per controller (None = unlimited).
    ///
    /// The reference deployment runs uncapped; setting a cap makes the engine
    /// reject enqueues past the limit with an explicit backlog-full outcome.
    pub max_backlog_per_controller: Option<usize>,
}

impl QueueConfig {
    /// The entry TTL as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_backlog_per_controller: None,
        }
    }
}

// ============================================================================
// Rate Limiting Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    pub enabled: bool,

    /// Sliding window length, in seconds.
    pub window_secs: u64,

    /// Maximum requests per key within one window.
    pub max_requests: usize,
}

impl RateLimitConfig {
    /// The sliding window as a [`Duration`].
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: default_window_secs(),
            max_requests: default_max_requests(),
        }
    }
}

// ============================================================================
// Sweep Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SweepConfig {
    /// Seconds between background sweep passes.
    pub interval_secs: u64,
}

impl SweepConfig {
    /// The sweep period as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sweep_interval_secs(),
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_ttl_secs() -> u64 {
    660 // 11 minutes
}

fn default_window_secs() -> u64 {
    30
}

fn default_max_requests() -> usize {
    25
}

fn default_sweep_interval_secs() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.queue.ttl_secs, 660);
        assert_eq!(config.queue.max_backlog_per_controller, None);
        assert!(config.rate_limit.enabled);
        assert_eq!(config.rate_limit.window_secs, 30);
        assert_eq!(config.rate_limit.max_requests, 25);
        assert_eq!(config.sweep.interval_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_config() {
        let json = r#"{
            "queue": {
                "ttl-secs": 120,
                "max-backlog-per-controller": 64
            },
            "rate-limit": {
                "enabled": true,
                "window-secs": 10,
                "max-requests": 5
            },
            "sweep": {
                "interval-secs": 15
            }
        }"#;

        let config: RelayConfig = serde_json::from_str(json).expect("Failed to parse");
        assert_eq!(config.queue.ttl_secs, 120);
        assert_eq!(config.queue.max_backlog_per_controller, Some(64));
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.sweep.interval_secs, 15);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{ "rate-limit": { "max-requests": 3 } }"#;

        let config: RelayConfig = serde_json::from_str(json).expect("Failed to parse");
        assert_eq!(config.rate_limit.max_requests, 3);
        assert_eq!(config.rate_limit.window_secs, 30);
        assert_eq!(config.queue.ttl_secs, 660);
    }

    #[test]
    fn test_validate_rejects_zeroes() {
        let mut config = RelayConfig::default();
        config.queue.ttl_secs = 0;
        assert!(config.validate().is_err());

        let mut config = RelayConfig::default();
        config.rate_limit.window_secs = 0;
        assert!(config.validate().is_err());

        let mut config = RelayConfig::default();
        config.rate_limit.max_requests = 0;
        assert!(config.validate().is_err());

        let mut config = RelayConfig::default();
        config.queue.max_backlog_per_controller = Some(0);
        assert!(config.validate().is_err());

        let mut config = RelayConfig::default();
        config.sweep.interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
