//! Confirmation poller
//!
//! Repeatedly queries a submitted transaction's status until it is terminal,
//! on a fixed interval: finality time is roughly constant on the target
//! network, so exponential growth would only add latency. `not_found` is
//! pre-terminal — the node simply has not indexed the transaction yet.
//!
//! The wait is cooperative and cancellable. Cancellation stops the
//! client-side wait only; a sent transaction cannot be withdrawn. Progress
//! is surfaced through an event sink so presentation (spinners, logs) can
//! subscribe without the poller knowing about any of it.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::node::{NodeClient, NodeError, TransactionStatus};
use crate::txcode;

/// Caller-supplied polling cadence. Never hardcoded, and a zero interval is
/// rejected: busy-polling the node is a bug, not a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

impl PollConfig {
    pub fn new(poll_interval: Duration, max_wait: Duration) -> Result<Self, ConfirmError> {
        let cfg = Self {
            poll_interval,
            max_wait,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfirmError> {
        if self.poll_interval.is_zero() {
            return Err(ConfirmError::InvalidConfig(
                "poll_interval must be positive (busy-polling is not allowed)",
            ));
        }
        if self.max_wait < self.poll_interval {
            return Err(ConfirmError::InvalidConfig(
                "max_wait must be at least one poll_interval",
            ));
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfirmError {
    /// No terminal status within `max_wait`. The hash is preserved so the
    /// caller can resume polling later; the transaction may still confirm.
    #[error("no terminal status for {tx_hash} within the wait budget")]
    Timeout { tx_hash: String },

    #[error("invalid poll configuration: {0}")]
    InvalidConfig(&'static str),

    #[error(transparent)]
    Node(#[from] NodeError),
}

/// One poll attempt, as seen by a progress sink.
#[derive(Debug, Clone)]
pub struct PollProgress {
    pub attempt: u32,
    pub elapsed: Duration,
    pub status: TransactionStatus,
}

/// Presentation hook: called once per poll attempt. Must be cheap; the
/// poller invokes it inline.
pub type ProgressSink = Arc<dyn Fn(PollProgress) + Send + Sync>;

/// Terminal outcome of a confirmation wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// The transaction applied; the metadata blob feeds the result extractor
    Success { result_meta: Option<String> },
    /// The transaction reached the ledger and failed there
    Failed {
        code: Option<i32>,
        category: String,
    },
    /// The caller cancelled the wait; the transaction's fate is unknown
    Cancelled,
}

/// Poll until the transaction is terminal, the budget runs out, or the
/// caller cancels.
///
/// Returns within `max_wait + poll_interval` of wall time when the node
/// never answers terminally.
pub async fn await_confirmation<C>(
    client: &C,
    tx_hash: &str,
    config: &PollConfig,
    cancel: &CancellationToken,
    progress: Option<&ProgressSink>,
) -> Result<ConfirmationOutcome, ConfirmError>
where
    C: NodeClient + ?Sized,
{
    config.validate()?;

    let started = Instant::now();
    let deadline = started + config.max_wait;
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            info!(tx_hash = %tx_hash, "confirmation wait cancelled");
            return Ok(ConfirmationOutcome::Cancelled);
        }

        let response = client.get_transaction(tx_hash).await?;
        attempt += 1;
        let elapsed = started.elapsed();
        if let Some(sink) = progress {
            sink(PollProgress {
                attempt,
                elapsed,
                status: response.status,
            });
        }

        match response.status {
            TransactionStatus::Success => {
                info!(
                    tx_hash = %tx_hash,
                    attempt = attempt,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "transaction confirmed"
                );
                return Ok(ConfirmationOutcome::Success {
                    result_meta: response.result_meta,
                });
            }
            TransactionStatus::Failed => {
                let (code, category) = match response.result_payload.as_deref() {
                    Some(payload) => match txcode::decode_error(payload) {
                        Ok((code, category)) => (Some(code), category),
                        Err(e) => {
                            warn!(tx_hash = %tx_hash, error = %e, "undecodable failure payload");
                            (None, "undecodable failure".to_string())
                        }
                    },
                    None => (None, "unknown failure".to_string()),
                };
                warn!(
                    tx_hash = %tx_hash,
                    code = ?code,
                    category = %category,
                    "transaction failed on ledger"
                );
                return Ok(ConfirmationOutcome::Failed { code, category });
            }
            TransactionStatus::NotFound => {
                if Instant::now() >= deadline {
                    warn!(
                        tx_hash = %tx_hash,
                        attempts = attempt,
                        waited_ms = elapsed.as_millis() as u64,
                        "gave up waiting for a terminal status"
                    );
                    return Err(ConfirmError::Timeout {
                        tx_hash: tx_hash.to_string(),
                    });
                }
                debug!(tx_hash = %tx_hash, attempt = attempt, "not yet indexed, waiting");
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!(tx_hash = %tx_hash, "confirmation wait cancelled");
                        return Ok(ConfirmationOutcome::Cancelled);
                    }
                    _ = tokio::time::sleep(config.poll_interval) => {}
                }
            }
        }
    }
}
