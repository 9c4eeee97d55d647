//! Transaction construction and signing
//!
//! Split into focused modules:
//! - **envelope**: the canonical signable structure and its byte encoding
//! - **builder**: pure assembly of an unsigned envelope
//! - **signer**: the signing capability boundary and its ed25519 impl

mod builder;
mod envelope;
mod signer;

pub use builder::{TransactionBuilder, DEFAULT_TIMEOUT_SECS};
pub use envelope::{
    DecoratedSignature, Memo, Operation, ResourceFootprint, TimeBounds, TransactionEnvelope,
    MAX_MEMO_BYTES,
};
pub use signer::{Ed25519Signer, SignerError, TransactionSigner};
