//! Submission pipeline
//!
//! Drives one built envelope through
//! `Built → Simulated → Prepared → Signed → Sent → {Accepted, Rejected}`.
//!
//! Ordering is load-bearing: preparation changes the signable bytes, so the
//! signature is produced strictly after it, and a simulation error rejects
//! the envelope before anything is signed or sent. The happy path performs
//! exactly one network submission; only `try_again_later` responses are
//! retried, with jittered backoff, and resubmitting the same signed
//! envelope is safe because the node deduplicates by hash.

mod retry;

pub use retry::RetryConfig;

use tracing::{debug, info, warn};

use crate::errors::InvokeError;
use crate::node::{NodeClient, SendStatus};
use crate::observability::CorrelationId;
use crate::tx::{TransactionEnvelope, TransactionSigner};
use crate::txcode;

/// Pipeline states, used for structured logging of transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Built,
    Simulated,
    Prepared,
    Signed,
    Sent,
    Accepted,
    Rejected,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Built => "built",
            Self::Simulated => "simulated",
            Self::Prepared => "prepared",
            Self::Signed => "signed",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Proof of acceptance: the hash the confirmation poller tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedSubmission {
    pub tx_hash: String,
    /// Whether the node had already seen this transaction
    pub duplicate: bool,
}

/// Simulate, prepare, sign and send one envelope.
///
/// On success the transaction is in the node's queue and the returned hash
/// can be polled; on failure the typed error says which stage rejected it.
pub async fn submit<C>(
    client: &C,
    signer: &dyn TransactionSigner,
    envelope: TransactionEnvelope,
    retry: &RetryConfig,
    correlation_id: &CorrelationId,
) -> Result<AcceptedSubmission, InvokeError>
where
    C: NodeClient + ?Sized,
{
    let passphrase = client.network_passphrase().to_string();

    // Built → Simulated
    let simulation = client.simulate(&envelope).await?;
    if let Some(diagnostic) = simulation.error.clone() {
        warn!(
            correlation_id = %correlation_id,
            state = %PipelineState::Rejected,
            diagnostic = %diagnostic,
            "simulation reported an error; envelope will not be signed or sent"
        );
        return Err(InvokeError::Simulation { diagnostic });
    }
    debug!(
        correlation_id = %correlation_id,
        state = %PipelineState::Simulated,
        min_resource_fee = simulation.min_resource_fee,
        "simulation succeeded"
    );

    // Simulated → Prepared. This mutates the signable bytes.
    let mut prepared = client.prepare(envelope, &simulation).await?;
    debug!(
        correlation_id = %correlation_id,
        state = %PipelineState::Prepared,
        fee = prepared.fee,
        "resource footprint applied"
    );

    // Prepared → Signed, over the exact prepared bytes.
    let payload = prepared.signing_payload(&passphrase)?;
    let signature = signer
        .sign_payload(&payload)
        .map_err(|e| InvokeError::Signing(e.to_string()))?;
    prepared.attach_signature(signature);
    let tx_hash = prepared.hash_hex(&passphrase)?;
    debug!(
        correlation_id = %correlation_id,
        state = %PipelineState::Signed,
        tx_hash = %tx_hash,
        "envelope signed"
    );

    // Signed → Sent → {Accepted, Rejected}
    let mut attempt: u32 = 0;
    loop {
        let response = client.send(&prepared).await?;
        attempt += 1;
        match response.status {
            SendStatus::Pending | SendStatus::Duplicate => {
                let hash = response.hash.unwrap_or_else(|| tx_hash.clone());
                let duplicate = response.status == SendStatus::Duplicate;
                info!(
                    correlation_id = %correlation_id,
                    state = %PipelineState::Accepted,
                    tx_hash = %hash,
                    duplicate = duplicate,
                    "submission accepted"
                );
                return Ok(AcceptedSubmission {
                    tx_hash: hash,
                    duplicate,
                });
            }
            SendStatus::Error => {
                let payload = response.error_payload.ok_or_else(|| {
                    InvokeError::Internal(
                        "error response carried no error payload".to_string(),
                    )
                })?;
                let (code, category) = txcode::decode_error(&payload)?;
                warn!(
                    correlation_id = %correlation_id,
                    state = %PipelineState::Rejected,
                    code = code,
                    category = %category,
                    "submission rejected"
                );
                return Err(InvokeError::Submission { code, category });
            }
            SendStatus::TryAgainLater => {
                if attempt >= retry.max_attempts {
                    warn!(
                        correlation_id = %correlation_id,
                        state = %PipelineState::Rejected,
                        attempts = attempt,
                        "node kept answering try_again_later; giving up"
                    );
                    return Err(InvokeError::RetriesExhausted { attempts: attempt });
                }
                let delay = retry.backoff(attempt - 1);
                debug!(
                    correlation_id = %correlation_id,
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    "node busy, backing off before resubmitting"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
