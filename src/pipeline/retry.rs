//! Bounded retry with jittered exponential backoff
//!
//! Only `try_again_later` submission responses are retried here; everything
//! else in the pipeline fails through to the caller. Jitter spreads
//! concurrent resubmissions so a briefly overloaded node is not hit by a
//! synchronized wave.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of send attempts, including the first
    pub max_attempts: u32,
    /// Base backoff delay in milliseconds
    pub base_backoff_ms: u64,
    /// Cap on the backoff delay in milliseconds
    pub max_backoff_ms: u64,
    /// Jitter factor in `0.0..=1.0`, applied symmetrically
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 200,
            max_backoff_ms: 2_000,
            jitter_factor: 0.2,
        }
    }
}

impl RetryConfig {
    /// Backoff before retry number `attempt` (0-indexed).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = (self.base_backoff_ms as f64) * 2_f64.powi(attempt as i32);
        let capped = exp.min(self.max_backoff_ms as f64);

        let jitter_range = capped * self.jitter_factor;
        let jitter = if jitter_range > 0.0 {
            rand::thread_rng().gen_range(-jitter_range..=jitter_range)
        } else {
            0.0
        };
        Duration::from_millis((capped + jitter).max(0.0) as u64)
    }
}
