//! Scriptable mock node client
//!
//! Used by this crate's own tests and exported for downstream consumers who
//! want to test against the [`NodeClient`] boundary without a node. Every
//! capability records a call count; send responses and transaction statuses
//! are scripted queues, and the last scripted status repeats forever so a
//! terminal state stays terminal across repeated queries.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::node::{
    GetTransactionResponse, NodeClient, NodeError, SendStatus, SimulationResult,
    SubmissionResponse, TransactionStatus,
};
use crate::tx::{ResourceFootprint, TransactionEnvelope};
use crate::types::{AccountSnapshot, Address};

/// Snapshot of how often each capability was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub load_account: u32,
    pub simulate: u32,
    pub send: u32,
    pub get_transaction: u32,
}

/// In-memory [`NodeClient`] with scriptable behavior.
pub struct MockNodeClient {
    network: String,
    accounts: DashMap<Address, i64>,
    simulation: Mutex<SimulationResult>,
    send_queue: Mutex<VecDeque<SubmissionResponse>>,
    statuses: Mutex<Vec<GetTransactionResponse>>,
    status_cursor: AtomicUsize,
    last_sent: Mutex<Option<TransactionEnvelope>>,
    sent_sequences: Mutex<Vec<i64>>,
    load_account_calls: AtomicU32,
    simulate_calls: AtomicU32,
    send_calls: AtomicU32,
    get_transaction_calls: AtomicU32,
}

impl MockNodeClient {
    pub fn new(network_passphrase: impl Into<String>) -> Self {
        Self {
            network: network_passphrase.into(),
            accounts: DashMap::new(),
            simulation: Mutex::new(Self::default_simulation()),
            send_queue: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(Vec::new()),
            status_cursor: AtomicUsize::new(0),
            last_sent: Mutex::new(None),
            sent_sequences: Mutex::new(Vec::new()),
            load_account_calls: AtomicU32::new(0),
            simulate_calls: AtomicU32::new(0),
            send_calls: AtomicU32::new(0),
            get_transaction_calls: AtomicU32::new(0),
        }
    }

    fn default_simulation() -> SimulationResult {
        SimulationResult {
            error: None,
            return_value: None,
            footprint: Some(ResourceFootprint {
                read_entries: vec!["contract/data".to_string()],
                write_entries: vec!["contract/data".to_string()],
                instructions: 100_000,
                read_bytes: 512,
                write_bytes: 128,
            }),
            min_resource_fee: 50,
            diagnostics: Vec::new(),
        }
    }

    /// Seed an account with a current sequence number.
    pub fn register_account(&self, address: Address, sequence: i64) {
        self.accounts.insert(address, sequence);
    }

    /// Make subsequent simulations report an error diagnostic.
    pub fn fail_simulation(&self, diagnostic: impl Into<String>) {
        self.simulation.lock().error = Some(diagnostic.into());
    }

    /// Make subsequent simulations preview a return value.
    pub fn set_simulation_return(&self, value: Option<crate::codec::WireValue>) {
        self.simulation.lock().return_value = value.map(|v| v.to_base64());
    }

    /// Replace the whole simulation result.
    pub fn set_simulation(&self, result: SimulationResult) {
        *self.simulation.lock() = result;
    }

    /// Queue a send response. When the queue is empty, sends fall back to
    /// `Pending` with the envelope's real hash.
    pub fn push_send_response(&self, response: SubmissionResponse) {
        self.send_queue.lock().push_back(response);
    }

    /// Append a scripted `get_transaction` response. The last entry repeats
    /// forever, modeling a terminal status staying terminal.
    pub fn push_transaction_status(&self, response: GetTransactionResponse) {
        self.statuses.lock().push(response);
    }

    pub fn counts(&self) -> CallCounts {
        CallCounts {
            load_account: self.load_account_calls.load(Ordering::SeqCst),
            simulate: self.simulate_calls.load(Ordering::SeqCst),
            send: self.send_calls.load(Ordering::SeqCst),
            get_transaction: self.get_transaction_calls.load(Ordering::SeqCst),
        }
    }

    /// The envelope most recently passed to `send`.
    pub fn last_sent_envelope(&self) -> Option<TransactionEnvelope> {
        self.last_sent.lock().clone()
    }

    /// Sequence numbers of every envelope passed to `send`, in order.
    pub fn sent_sequences(&self) -> Vec<i64> {
        self.sent_sequences.lock().clone()
    }
}

#[async_trait]
impl NodeClient for MockNodeClient {
    async fn load_account(&self, address: &Address) -> Result<AccountSnapshot, NodeError> {
        self.load_account_calls.fetch_add(1, Ordering::SeqCst);
        let sequence = *self
            .accounts
            .get(address)
            .ok_or_else(|| NodeError::Protocol(format!("account {address} not found")))?;
        Ok(AccountSnapshot::new(address.clone(), sequence))
    }

    async fn simulate(
        &self,
        _envelope: &TransactionEnvelope,
    ) -> Result<SimulationResult, NodeError> {
        self.simulate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.simulation.lock().clone())
    }

    async fn send(&self, envelope: &TransactionEnvelope) -> Result<SubmissionResponse, NodeError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_sent.lock() = Some(envelope.clone());
        self.sent_sequences.lock().push(envelope.sequence);

        let response = self.send_queue.lock().pop_front().unwrap_or_else(|| {
            let hash = envelope
                .hash_hex(&self.network)
                .unwrap_or_else(|_| "deadbeef".to_string());
            SubmissionResponse {
                status: SendStatus::Pending,
                hash: Some(hash),
                error_payload: None,
            }
        });

        // A node that accepts a transaction consumes the sequence number.
        if matches!(response.status, SendStatus::Pending | SendStatus::Duplicate) {
            if let Some(mut entry) = self.accounts.get_mut(&envelope.source) {
                *entry = envelope.sequence;
            }
        }
        Ok(response)
    }

    async fn get_transaction(&self, _hash: &str) -> Result<GetTransactionResponse, NodeError> {
        self.get_transaction_calls.fetch_add(1, Ordering::SeqCst);
        let statuses = self.statuses.lock();
        if statuses.is_empty() {
            return Ok(GetTransactionResponse {
                status: TransactionStatus::NotFound,
                result_meta: None,
                result_payload: None,
            });
        }
        let cursor = self.status_cursor.fetch_add(1, Ordering::SeqCst);
        let index = cursor.min(statuses.len() - 1);
        Ok(statuses[index].clone())
    }

    fn network_passphrase(&self) -> &str {
        &self.network
    }
}

/// Deterministic test address: the prefix padded with `X` to eight chars.
/// The prefix must already start with `G` or `C`.
pub fn test_address(prefix: &str) -> Address {
    Address::new(format!("{prefix:X<8}")).expect("valid test address")
}
