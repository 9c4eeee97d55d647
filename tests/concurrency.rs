//! Concurrent invocation behavior: per-account serialization and
//! cross-account independence.

use std::collections::HashSet;
use std::sync::Arc;

use txpilot::meta::encode_meta_v3;
use txpilot::node::{GetTransactionResponse, TransactionStatus};
use txpilot::test_utils::{test_address, MockNodeClient};
use txpilot::tx::{Ed25519Signer, TransactionSigner};
use txpilot::{InvokeMode, Invoker, InvokerConfig};

const NETWORK: &str = "Test Network ; 2024";

fn fast_config() -> InvokerConfig {
    let mut config = InvokerConfig::default();
    config.poll.interval_ms = 5;
    config.poll.max_wait_secs = 2;
    config
}

fn confirmed_void() -> GetTransactionResponse {
    GetTransactionResponse {
        status: TransactionStatus::Success,
        result_meta: Some(encode_meta_v3(None)),
        result_payload: None,
    }
}

#[tokio::test]
async fn same_account_invocations_never_reuse_a_sequence_number() {
    let signer = Arc::new(Ed25519Signer::from_seed([11u8; 32]).unwrap());
    let client = Arc::new(MockNodeClient::new(NETWORK));
    client.register_account(signer.address().clone(), 100);
    client.push_transaction_status(confirmed_void());
    let invoker = Invoker::new(Arc::clone(&client), fast_config()).unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let invoker = invoker.clone();
        let signer = Arc::clone(&signer);
        handles.push(tokio::spawn(async move {
            invoker
                .invoke(
                    signer.as_ref(),
                    test_address("CGAME"),
                    "increment",
                    &[],
                    InvokeMode::SubmitAndConfirm,
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let sequences = client.sent_sequences();
    assert_eq!(sequences.len(), 8);
    let unique: HashSet<i64> = sequences.iter().copied().collect();
    assert_eq!(unique.len(), 8, "sequence numbers must be unique");
    assert_eq!(*sequences.iter().min().unwrap(), 101);
    assert_eq!(*sequences.iter().max().unwrap(), 108);
}

#[tokio::test]
async fn different_accounts_do_not_serialize_against_each_other() {
    let alice = Arc::new(Ed25519Signer::from_seed([21u8; 32]).unwrap());
    let bob = Arc::new(Ed25519Signer::from_seed([22u8; 32]).unwrap());
    let client = Arc::new(MockNodeClient::new(NETWORK));
    client.register_account(alice.address().clone(), 5);
    client.register_account(bob.address().clone(), 500);
    client.push_transaction_status(confirmed_void());
    let invoker = Invoker::new(Arc::clone(&client), fast_config()).unwrap();

    let task = |signer: Arc<Ed25519Signer>, invoker: Invoker<MockNodeClient>| {
        tokio::spawn(async move {
            invoker
                .invoke(
                    signer.as_ref(),
                    test_address("CGAME"),
                    "increment",
                    &[],
                    InvokeMode::SubmitAndConfirm,
                )
                .await
        })
    };

    let a = task(Arc::clone(&alice), invoker.clone());
    let b = task(Arc::clone(&bob), invoker.clone());
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let sequences = client.sent_sequences();
    assert_eq!(sequences.len(), 2);
    assert!(sequences.contains(&6));
    assert!(sequences.contains(&501));
}
