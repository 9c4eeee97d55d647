//! Invoker configuration
//!
//! Loaded from TOML with optional environment loading, following field-level
//! serde defaults. Polling cadence and retry budgets are configuration, not
//! constants: callers tune them to their network.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::confirm::PollConfig;
use crate::errors::BuildError;
use crate::pipeline::RetryConfig;

/// Top-level configuration for an [`crate::invoke::Invoker`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokerConfig {
    /// Base fee per transaction, before the simulated resource fee
    #[serde(default = "default_base_fee")]
    pub base_fee: u64,

    /// Transaction validity window in seconds
    #[serde(default = "default_tx_timeout_secs")]
    pub tx_timeout_secs: u64,

    /// Confirmation polling
    #[serde(default)]
    pub poll: PollSettings,

    /// `try_again_later` retry budget
    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSettings {
    /// Fixed interval between status queries, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    /// Total wait budget, in seconds
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

// Default value functions
fn default_base_fee() -> u64 {
    100
}
fn default_tx_timeout_secs() -> u64 {
    300
}
fn default_poll_interval_ms() -> u64 {
    500
}
fn default_max_wait_secs() -> u64 {
    60
}
fn default_max_attempts() -> u32 {
    3
}
fn default_base_backoff_ms() -> u64 {
    200
}
fn default_max_backoff_ms() -> u64 {
    2_000
}
fn default_jitter_factor() -> f64 {
    0.2
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            max_wait_secs: default_max_wait_secs(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            jitter_factor: default_jitter_factor(),
        }
    }
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            base_fee: default_base_fee(),
            tx_timeout_secs: default_tx_timeout_secs(),
            poll: PollSettings::default(),
            retry: RetrySettings::default(),
        }
    }
}

impl InvokerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration after populating the environment from `.env`.
    pub fn from_file_with_env(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_file(path)
    }

    /// Check constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.base_fee == 0 {
            return Err(BuildError::InvalidConfig("base_fee must be positive".into()));
        }
        if self.tx_timeout_secs == 0 {
            return Err(BuildError::InvalidConfig(
                "tx_timeout_secs must be positive".into(),
            ));
        }
        if self.poll.interval_ms == 0 {
            return Err(BuildError::InvalidConfig(
                "poll.interval_ms must be positive (busy-polling is not allowed)".into(),
            ));
        }
        if Duration::from_secs(self.poll.max_wait_secs)
            < Duration::from_millis(self.poll.interval_ms)
        {
            return Err(BuildError::InvalidConfig(
                "poll.max_wait_secs must cover at least one interval".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(BuildError::InvalidConfig(
                "retry.max_attempts must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter_factor) {
            return Err(BuildError::InvalidConfig(
                "retry.jitter_factor must be in 0.0..=1.0".into(),
            ));
        }
        Ok(())
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            poll_interval: Duration::from_millis(self.poll.interval_ms),
            max_wait: Duration::from_secs(self.poll.max_wait_secs),
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry.max_attempts,
            base_backoff_ms: self.retry.base_backoff_ms,
            max_backoff_ms: self.retry.max_backoff_ms,
            jitter_factor: self.retry.jitter_factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn defaults_validate() {
        let config = InvokerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.base_fee, 100);
        assert_eq!(config.poll_config().poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn busy_poll_rejected() {
        let mut config = InvokerConfig::default();
        config.poll.interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn jitter_bounds_enforced() {
        let mut config = InvokerConfig::default();
        config.retry.jitter_factor = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "base_fee = 250\n\n[poll]\ninterval_ms = 100"
        )
        .unwrap();
        let config = InvokerConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.base_fee, 250);
        assert_eq!(config.poll.interval_ms, 100);
        // Unspecified fields keep their defaults
        assert_eq!(config.poll.max_wait_secs, 60);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn invalid_toml_surfaces() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_fee = \"not a number\"").unwrap();
        assert!(InvokerConfig::from_file(file.path().to_str().unwrap()).is_err());
    }
}
