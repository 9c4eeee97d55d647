//! Node client boundary
//!
//! The core never talks HTTP itself: it depends on this injected capability
//! set, and a transport implementation (JSON-RPC, in-process node, mock)
//! lives behind it. Implementations must tolerate concurrent calls — the
//! client is the only resource invocations share.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tx::{ResourceFootprint, TransactionEnvelope};
use crate::types::{AccountSnapshot, Address};

/// Failures at the client boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// Connection-level failure; usually transient
    #[error("node transport error: {0}")]
    Transport(String),

    /// The node answered, but with something the client cannot use
    #[error("node protocol error: {0}")]
    Protocol(String),
}

/// Outcome of a non-mutating dry run against current node state.
///
/// Read-only and discarded after use — a simulation result is never
/// submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Diagnostic text when the simulated invocation failed
    pub error: Option<String>,
    /// Base64 wire bytes of the simulated return value, absent for void
    /// functions
    pub return_value: Option<String>,
    /// Estimated resource footprint to apply during preparation
    pub footprint: Option<ResourceFootprint>,
    /// Fee to add on top of the base fee
    pub min_resource_fee: u64,
    /// Auxiliary diagnostic events emitted during simulation
    pub diagnostics: Vec<String>,
}

impl SimulationResult {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Immediate classification of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendStatus {
    /// Accepted into the node's queue
    Pending,
    /// Already known to the node; treated like an acceptance
    Duplicate,
    /// Node is overloaded; resubmission of the same envelope is safe
    TryAgainLater,
    /// Rejected outright with an error payload
    Error,
}

/// Response to `send`. `hash` is present iff the status is not `Error`;
/// `error_payload` is present iff it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub status: SendStatus,
    pub hash: Option<String>,
    pub error_payload: Option<String>,
}

/// Indexed state of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Not yet indexed; pre-terminal, keep polling
    NotFound,
    Success,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

/// Response to `get_transaction`: `result_meta` accompanies `Success`,
/// `result_payload` accompanies `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTransactionResponse {
    pub status: TransactionStatus,
    /// Base64 result-metadata blob for successful transactions
    pub result_meta: Option<String>,
    /// Base64 error payload for failed transactions
    pub result_payload: Option<String>,
}

/// Capability set the core consumes. Injected; implementation out of scope.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Current account state, including the sequence number a new envelope
    /// must build on.
    async fn load_account(&self, address: &Address) -> Result<AccountSnapshot, NodeError>;

    /// Non-mutating dry run.
    async fn simulate(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<SimulationResult, NodeError>;

    /// Apply simulation footprint and fee to the envelope.
    ///
    /// The default applies the results locally, which is what every known
    /// node protocol amounts to; override when the node offers a server-side
    /// assembly call.
    async fn prepare(
        &self,
        mut envelope: TransactionEnvelope,
        simulation: &SimulationResult,
    ) -> Result<TransactionEnvelope, NodeError> {
        envelope
            .apply_preparation(
                simulation.footprint.clone().unwrap_or_default(),
                simulation.min_resource_fee,
            )
            .map_err(|e| NodeError::Protocol(e.to_string()))?;
        Ok(envelope)
    }

    /// Submit a signed envelope.
    async fn send(&self, envelope: &TransactionEnvelope) -> Result<SubmissionResponse, NodeError>;

    /// Query a submitted transaction by hash.
    async fn get_transaction(&self, hash: &str) -> Result<GetTransactionResponse, NodeError>;

    /// Network passphrase selecting the signing domain.
    fn network_passphrase(&self) -> &str;
}

/// Explorer link for a submitted transaction; pure formatting, the core
/// only logs it.
pub fn explorer_tx_url(network_passphrase: &str, hash: &str) -> String {
    let net = if network_passphrase.to_ascii_lowercase().contains("test") {
        "testnet"
    } else {
        "public"
    };
    format!("https://stellar.expert/explorer/{net}/tx/{hash}")
}
