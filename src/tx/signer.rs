//! Envelope signing
//!
//! Key management (generation, storage, funding) is out of scope; this
//! module only defines the signing capability the pipeline needs and an
//! ed25519 implementation of it. Signers are passed in explicitly — there
//! is no process-global key registry.

use ed25519_dalek::{Signer as DalekSigner, SigningKey, VerifyingKey};
use thiserror::Error;

use crate::errors::BuildError;
use crate::tx::envelope::DecoratedSignature;
use crate::types::Address;

#[derive(Error, Debug, Clone)]
pub enum SignerError {
    #[error("signing failed: {0}")]
    Failure(String),
}

/// Capability to sign an envelope's 32-byte signing payload.
pub trait TransactionSigner: Send + Sync {
    /// The source account this signer controls.
    fn address(&self) -> &Address;

    /// Sign the exact prepared payload digest.
    fn sign_payload(&self, payload: &[u8; 32]) -> Result<DecoratedSignature, SignerError>;
}

/// Ed25519 signer backed by an in-memory key.
pub struct Ed25519Signer {
    signing_key: SigningKey,
    address: Address,
}

impl Ed25519Signer {
    /// Wrap an existing key for the given account address.
    pub fn new(signing_key: SigningKey, address: Address) -> Self {
        Self {
            signing_key,
            address,
        }
    }

    /// Build from a 32-byte seed, deriving a display address from the
    /// public key. Convenient for tests and tooling; production keys come
    /// from the external key-management layer with their real address.
    pub fn from_seed(seed: [u8; 32]) -> Result<Self, BuildError> {
        let signing_key = SigningKey::from_bytes(&seed);
        let address = derive_address(&signing_key.verifying_key())?;
        Ok(Self {
            signing_key,
            address,
        })
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl TransactionSigner for Ed25519Signer {
    fn address(&self) -> &Address {
        &self.address
    }

    fn sign_payload(&self, payload: &[u8; 32]) -> Result<DecoratedSignature, SignerError> {
        let signature = self.signing_key.sign(payload);
        let public = self.signing_key.verifying_key();
        let key_bytes = public.as_bytes();
        let hint = [
            key_bytes[28],
            key_bytes[29],
            key_bytes[30],
            key_bytes[31],
        ];
        Ok(DecoratedSignature {
            hint,
            signature: signature.to_bytes().to_vec(),
        })
    }
}

/// Display address for a public key: `G` plus the uppercase hex of the key,
/// truncated to fit the address length limit.
fn derive_address(key: &VerifyingKey) -> Result<Address, BuildError> {
    let hex_key = hex::encode_upper(key.as_bytes());
    Address::new(format!("G{}", &hex_key[..54]))
}
