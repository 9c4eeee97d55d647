//! Transaction envelope: the canonical signable structure
//!
//! The envelope's byte encoding is frozen at build time; signatures are only
//! valid over the exact prepared bytes, so any mutation after signing
//! invalidates the transaction. Preparation (footprint + fee adjustment) is
//! therefore rejected once a signature is attached.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::codec::WireValue;
use crate::errors::BuildError;
use crate::types::{Address, Symbol};

/// Optional transaction memo. Text memos are capped at 28 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Memo {
    None,
    Text(String),
}

/// Maximum byte length of a text memo.
pub const MAX_MEMO_BYTES: usize = 28;

impl Memo {
    /// Validate memo constraints: length and charset (no control characters).
    pub fn validate(&self) -> Result<(), BuildError> {
        if let Memo::Text(text) = self {
            if text.len() > MAX_MEMO_BYTES {
                return Err(BuildError::InvalidMemo {
                    len: text.len(),
                    reason: "exceeds 28-byte limit",
                });
            }
            if text.chars().any(|c| c.is_control()) {
                return Err(BuildError::InvalidMemo {
                    len: text.len(),
                    reason: "control characters not allowed",
                });
            }
        }
        Ok(())
    }
}

/// Validity window, in unix seconds. `max_time` is the absolute deadline
/// derived once at build time; it is never re-derived afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

/// Simulation-derived resource footprint applied during preparation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFootprint {
    /// Ledger entries the invocation reads
    pub read_entries: Vec<String>,
    /// Ledger entries the invocation writes
    pub write_entries: Vec<String>,
    pub instructions: u64,
    pub read_bytes: u32,
    pub write_bytes: u32,
}

/// A single invocation request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    InvokeContract {
        contract_id: Address,
        function: Symbol,
        args: Vec<WireValue>,
    },
}

/// An envelope signature with a key hint for multi-signer lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratedSignature {
    /// Last four bytes of the signer's public key
    pub hint: [u8; 4],
    /// 64-byte ed25519 signature over the signing payload
    pub signature: Vec<u8>,
}

/// The transaction envelope: unsigned until the pipeline signs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEnvelope {
    pub source: Address,
    pub sequence: i64,
    /// Total fee; preparation adds the simulated resource fee on top of the
    /// base fee
    pub fee: u64,
    pub time_bounds: TimeBounds,
    pub memo: Memo,
    pub operations: Vec<Operation>,
    /// Attached during preparation, absent on a freshly built envelope
    pub footprint: Option<ResourceFootprint>,
    pub signatures: Vec<DecoratedSignature>,
}

/// The view of the envelope that signatures cover: everything except the
/// signatures themselves, prefixed with the network identifier so that a
/// signature for one network can never be replayed on another.
#[derive(Serialize)]
struct SignaturePayload<'a> {
    network_id: &'a [u8; 32],
    source: &'a Address,
    sequence: i64,
    fee: u64,
    time_bounds: &'a TimeBounds,
    memo: &'a Memo,
    operations: &'a [Operation],
    footprint: &'a Option<ResourceFootprint>,
}

impl TransactionEnvelope {
    /// Domain-separation hash of the network passphrase.
    pub fn network_id(network_passphrase: &str) -> [u8; 32] {
        Sha256::digest(network_passphrase.as_bytes()).into()
    }

    /// Canonical signature-base bytes for this envelope on the given network.
    pub fn signature_base(&self, network_passphrase: &str) -> Result<Vec<u8>, BuildError> {
        let network_id = Self::network_id(network_passphrase);
        let payload = SignaturePayload {
            network_id: &network_id,
            source: &self.source,
            sequence: self.sequence,
            fee: self.fee,
            time_bounds: &self.time_bounds,
            memo: &self.memo,
            operations: &self.operations,
            footprint: &self.footprint,
        };
        bincode::serialize(&payload)
            .map_err(|e| BuildError::InvalidConfig(format!("envelope encoding failed: {e}")))
    }

    /// The 32-byte digest that gets signed, and that identifies the
    /// transaction on the network.
    pub fn signing_payload(&self, network_passphrase: &str) -> Result<[u8; 32], BuildError> {
        Ok(Sha256::digest(self.signature_base(network_passphrase)?).into())
    }

    /// Hex transaction hash as the node and explorers report it.
    pub fn hash_hex(&self, network_passphrase: &str) -> Result<String, BuildError> {
        Ok(hex::encode(self.signing_payload(network_passphrase)?))
    }

    /// Apply simulation results: attach the resource footprint and raise the
    /// fee by the simulated resource fee.
    ///
    /// Rejected once signed — preparing changes the signable bytes.
    pub fn apply_preparation(
        &mut self,
        footprint: ResourceFootprint,
        resource_fee: u64,
    ) -> Result<(), BuildError> {
        if !self.signatures.is_empty() {
            return Err(BuildError::InvalidConfig(
                "cannot prepare an already-signed envelope".to_string(),
            ));
        }
        self.footprint = Some(footprint);
        self.fee = self.fee.saturating_add(resource_fee);
        Ok(())
    }

    pub fn attach_signature(&mut self, signature: DecoratedSignature) {
        self.signatures.push(signature);
    }

    pub fn is_signed(&self) -> bool {
        !self.signatures.is_empty()
    }
}
