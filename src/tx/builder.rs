//! Unsigned envelope assembly
//!
//! Building is pure: no network calls, no clocks beyond the single read that
//! freezes the timeout deadline. The account snapshot must already be
//! current; the builder takes the next sequence number from it.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::errors::BuildError;
use crate::tx::envelope::{Memo, Operation, TimeBounds, TransactionEnvelope};
use crate::types::AccountSnapshot;

/// Default transaction validity window, matching the network's usual
/// client-side setting.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Assembles one unsigned [`TransactionEnvelope`] from a source account
/// snapshot, a network passphrase, a base fee and a single operation.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    source: AccountSnapshot,
    network_passphrase: String,
    base_fee: u64,
    timeout: Duration,
    memo: Memo,
    operations: Vec<Operation>,
}

impl TransactionBuilder {
    pub fn new(
        source: AccountSnapshot,
        network_passphrase: impl Into<String>,
        base_fee: u64,
    ) -> Self {
        Self {
            source,
            network_passphrase: network_passphrase.into(),
            base_fee,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            memo: Memo::None,
            operations: Vec::new(),
        }
    }

    /// Validity window in seconds; converted to an absolute deadline at
    /// build time.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Attach a text memo. Validated at `build`, before any network call.
    pub fn memo_text(mut self, text: impl Into<String>) -> Self {
        self.memo = Memo::Text(text.into());
        self
    }

    pub fn operation(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    pub fn network_passphrase(&self) -> &str {
        &self.network_passphrase
    }

    /// Produce the unsigned envelope.
    ///
    /// Fails fast on an oversized memo, a zero fee, or a missing operation;
    /// none of these reach the network.
    pub fn build(self) -> Result<TransactionEnvelope, BuildError> {
        if self.operations.is_empty() {
            return Err(BuildError::Incomplete("envelope requires an operation"));
        }
        if self.base_fee == 0 {
            return Err(BuildError::InvalidConfig("base fee must be positive".into()));
        }
        self.memo.validate()?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let deadline = now.saturating_add(self.timeout.as_secs());

        let envelope = TransactionEnvelope {
            source: self.source.address.clone(),
            sequence: self.source.next_sequence(),
            fee: self.base_fee,
            time_bounds: TimeBounds {
                min_time: 0,
                max_time: deadline,
            },
            memo: self.memo,
            operations: self.operations,
            footprint: None,
            signatures: Vec::new(),
        };
        debug!(
            source = %envelope.source,
            sequence = envelope.sequence,
            fee = envelope.fee,
            deadline = deadline,
            "envelope built"
        );
        Ok(envelope)
    }
}
