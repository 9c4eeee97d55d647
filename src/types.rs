//! Core identity types shared across the invocation pipeline
//!
//! These types are validated at the edge: once an [`Address`] or [`Symbol`]
//! exists, every downstream component may assume it is well-formed.

use serde::{Deserialize, Serialize};

use crate::errors::BuildError;

/// Maximum length of a ledger address.
pub const MAX_ADDRESS_LEN: usize = 56;

/// Maximum length of a contract function symbol.
pub const MAX_SYMBOL_LEN: usize = 32;

/// A ledger address: `G…` for accounts, `C…` for contracts.
///
/// Addresses are uppercase alphanumeric identifiers. Validation happens on
/// construction (and on deserialization), so holding an `Address` is proof
/// of well-formedness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and validate an address string.
    pub fn new(raw: impl Into<String>) -> Result<Self, BuildError> {
        let raw = raw.into();
        let mut chars = raw.chars();
        let prefix_ok = matches!(chars.next(), Some('G') | Some('C'));
        if !prefix_ok {
            return Err(BuildError::InvalidAddress {
                address: raw,
                reason: "must start with 'G' (account) or 'C' (contract)",
            });
        }
        if raw.len() < 4 || raw.len() > MAX_ADDRESS_LEN {
            return Err(BuildError::InvalidAddress {
                address: raw,
                reason: "length out of range",
            });
        }
        if !chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
            return Err(BuildError::InvalidAddress {
                address: raw,
                reason: "only uppercase ASCII alphanumerics allowed",
            });
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for contract addresses (`C…`).
    pub fn is_contract(&self) -> bool {
        self.0.starts_with('C')
    }

    /// True for account addresses (`G…`).
    pub fn is_account(&self) -> bool {
        self.0.starts_with('G')
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = BuildError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

/// A contract function name: up to 32 chars of `[A-Za-z0-9_]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn new(raw: impl Into<String>) -> Result<Self, BuildError> {
        let raw = raw.into();
        if raw.is_empty() || raw.len() > MAX_SYMBOL_LEN {
            return Err(BuildError::InvalidSymbol {
                symbol: raw,
                reason: "length must be 1..=32",
            });
        }
        if !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(BuildError::InvalidSymbol {
                symbol: raw,
                reason: "only [A-Za-z0-9_] allowed",
            });
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Symbol {
    type Error = BuildError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

/// Point-in-time view of an account, fetched immediately before building.
///
/// The snapshot is never cached across invocations: the sequence number the
/// node reports is only valid until the next transaction from this account
/// is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub address: Address,
    /// Sequence number of the last applied transaction.
    pub sequence: i64,
}

impl AccountSnapshot {
    pub fn new(address: Address, sequence: i64) -> Self {
        Self { address, sequence }
    }

    /// The sequence number a new envelope from this account must carry.
    pub fn next_sequence(&self) -> i64 {
        self.sequence + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_and_contract_addresses_parse() {
        let acct = Address::new("GTESTACCOUNT1").unwrap();
        assert!(acct.is_account());
        assert!(!acct.is_contract());

        let contract = Address::new("CCONTRACT42").unwrap();
        assert!(contract.is_contract());
    }

    #[test]
    fn bad_addresses_rejected() {
        assert!(Address::new("").is_err());
        assert!(Address::new("XWRONGPREFIX").is_err());
        assert!(Address::new("Gab").is_err()); // too short
        assert!(Address::new("Glowercase1").is_err());
        let too_long = format!("G{}", "A".repeat(60));
        assert!(Address::new(too_long).is_err());
    }

    #[test]
    fn symbol_rules() {
        assert!(Symbol::new("get_rank").is_ok());
        assert!(Symbol::new("new_game2").is_ok());
        assert!(Symbol::new("").is_err());
        assert!(Symbol::new("has space").is_err());
        assert!(Symbol::new("x".repeat(33)).is_err());
    }

    #[test]
    fn next_sequence_increments() {
        let snap = AccountSnapshot::new(Address::new("GTESTACCOUNT1").unwrap(), 41);
        assert_eq!(snap.next_sequence(), 42);
        // Snapshot itself is unchanged
        assert_eq!(snap.sequence, 41);
    }

    #[test]
    fn address_serde_round_trip() {
        let addr = Address::new("GSERDEADDR1").unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"GSERDEADDR1\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
        // Validation applies on the way in
        assert!(serde_json::from_str::<Address>("\"bogus\"").is_err());
    }
}
