//! Per-account submission serialization
//!
//! Two concurrent submissions from one account must not read the same
//! sequence number — the loser would be rejected with a bad-sequence error.
//! The registry hands out one async mutex per account; the invoker holds it
//! from the sequence read (`load_account`) through `send`. Different
//! accounts never contend.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::types::Address;

/// Registry of per-account locks. Cheap to clone; clones share the registry.
#[derive(Clone, Default)]
pub struct AccountLocks {
    locks: Arc<DashMap<Address, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the submission lock for one account, waiting if another
    /// invocation for the same account is in flight.
    pub async fn acquire(&self, address: &Address) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(address.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// Number of accounts that have ever been locked. Diagnostic only.
    pub fn tracked_accounts(&self) -> usize {
        self.locks.len()
    }
}
