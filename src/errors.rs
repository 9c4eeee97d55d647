//! Error taxonomy for the invocation pipeline
//!
//! One top-level [`InvokeError`] covers the whole lifecycle; per-concern
//! errors ([`BuildError`], [`crate::codec::CodecError`],
//! [`crate::meta::MetaError`], [`crate::node::NodeError`]) convert into it.
//! Every failure path is typed: "the call failed" is never conflated with
//! "the call succeeded with no return value".

use thiserror::Error;

use crate::codec::CodecError;
use crate::meta::MetaError;
use crate::node::NodeError;

/// Input-shape errors caught before any network call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Memo text exceeds the protocol limit or contains forbidden characters
    #[error("invalid memo ({len} bytes): {reason}")]
    InvalidMemo { len: usize, reason: &'static str },

    /// Malformed ledger address
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress {
        address: String,
        reason: &'static str,
    },

    /// Malformed function symbol
    #[error("invalid symbol {symbol:?}: {reason}")]
    InvalidSymbol {
        symbol: String,
        reason: &'static str,
    },

    /// Configuration value violates a constraint
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Envelope cannot be assembled (e.g. no operation attached)
    #[error("envelope incomplete: {0}")]
    Incomplete(&'static str),
}

/// Top-level error for `invoke` and its sub-stages.
///
/// The taxonomy mirrors the pipeline: build failures are fail-fast (no
/// network traffic), simulation and submission failures carry the node's
/// diagnostic, confirmation timeouts keep the hash so the caller can
/// re-poll later, and extraction failures are distinct from a legitimate
/// void return.
#[derive(Error, Debug)]
pub enum InvokeError {
    /// Bad input shape; no network call was made
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Parameter encoding or return-value decoding failed
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The node client itself failed (transport or protocol)
    #[error(transparent)]
    Node(#[from] NodeError),

    /// Simulation reported an error; the transaction was never signed or sent
    #[error("simulation failed: {diagnostic}")]
    Simulation { diagnostic: String },

    /// The node rejected the submission with a structured result code
    #[error("submission rejected ({category}, code {code})")]
    Submission { code: i32, category: String },

    /// `try_again_later` responses exhausted the bounded retry budget
    #[error("submission retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    /// No terminal status within `max_wait`; the transaction may still
    /// confirm after the client gives up
    #[error("confirmation timed out for transaction {tx_hash}")]
    ConfirmationTimeout { tx_hash: String },

    /// Caller cancelled the confirmation wait (the sent transaction itself
    /// cannot be withdrawn)
    #[error("confirmation wait cancelled for transaction {tx_hash}")]
    Cancelled { tx_hash: String },

    /// The transaction reached the ledger and failed there
    #[error("transaction failed on ledger ({category})")]
    TransactionFailed {
        code: Option<i32>,
        category: String,
    },

    /// Result-metadata extraction failed
    #[error(transparent)]
    Meta(#[from] MetaError),

    /// Signature could not be produced over the prepared bytes
    #[error("signing failed: {0}")]
    Signing(String),

    /// Invariant violation; indicates a bug, not an expected failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl InvokeError {
    /// Whether retrying the whole invocation might succeed.
    ///
    /// A fresh attempt rebuilds the envelope with a fresh sequence number,
    /// so sequence- and timing-related rejections are retryable while shape
    /// errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Node(NodeError::Transport(_)) => true,
            Self::RetriesExhausted { .. } => true,
            Self::ConfirmationTimeout { .. } => true,
            Self::Submission { category, .. } => {
                matches!(category.as_str(), "bad sequence" | "too early" | "too late")
            }

            Self::Build(_)
            | Self::Codec(_)
            | Self::Node(NodeError::Protocol(_))
            | Self::Simulation { .. }
            | Self::Cancelled { .. }
            | Self::TransactionFailed { .. }
            | Self::Meta(_)
            | Self::Signing(_)
            | Self::Internal(_) => false,
        }
    }

    /// Stable label for logging and metrics.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Build(_) => "build",
            Self::Codec(_) => "codec",
            Self::Node(_) => "node",
            Self::Simulation { .. } => "simulation",
            Self::Submission { .. } => "submission",
            Self::RetriesExhausted { .. } => "submission",
            Self::ConfirmationTimeout { .. } => "confirmation",
            Self::Cancelled { .. } => "cancelled",
            Self::TransactionFailed { .. } => "ledger",
            Self::Meta(_) => "extraction",
            Self::Signing(_) => "signing",
            Self::Internal(_) => "internal",
        }
    }
}
