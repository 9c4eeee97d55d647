//! Top-level contract invocation
//!
//! [`Invoker`] owns the pieces one call needs: the node client, the
//! per-account lock registry and the configuration. `invoke` runs the whole
//! lifecycle for one call — encode arguments, snapshot the account, build
//! the envelope, then either stop after a dry run (`SimulateOnly`) or drive
//! the submission pipeline and wait for confirmation (`SubmitAndConfirm`).

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::codec::{self, Decoded, NativeValue, ValueType, WireValue};
use crate::config::InvokerConfig;
use crate::confirm::{self, ConfirmError, ConfirmationOutcome, ProgressSink};
use crate::errors::InvokeError;
use crate::meta;
use crate::node::{explorer_tx_url, NodeClient};
use crate::observability::CorrelationId;
use crate::pipeline;
use crate::sequence::AccountLocks;
use crate::tx::{Operation, TransactionBuilder, TransactionEnvelope, TransactionSigner};
use crate::types::{Address, Symbol};

/// How far to take the invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeMode {
    /// Dry run only: nothing is signed, sent or charged. The decoded
    /// simulation preview is returned.
    SimulateOnly,
    /// Full lifecycle: simulate, prepare, sign, send, and wait for a
    /// terminal ledger status.
    SubmitAndConfirm,
}

/// One configured invocation front end. Cheap to clone via the inner `Arc`;
/// clones share the client and the per-account lock registry.
pub struct Invoker<C: NodeClient> {
    client: Arc<C>,
    locks: AccountLocks,
    config: InvokerConfig,
}

impl<C: NodeClient> Clone for Invoker<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            locks: self.locks.clone(),
            config: self.config.clone(),
        }
    }
}

impl<C: NodeClient> Invoker<C> {
    /// Build an invoker over a node client. Fails if the configuration
    /// violates a constraint (zero poll interval, empty retry budget, ...).
    pub fn new(client: Arc<C>, config: InvokerConfig) -> Result<Self, InvokeError> {
        config.validate()?;
        Ok(Self {
            client,
            locks: AccountLocks::new(),
            config,
        })
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Invoke a contract function. See [`Invoker::invoke_with_options`] for
    /// the cancellable, progress-reporting variant.
    pub async fn invoke(
        &self,
        signer: &dyn TransactionSigner,
        contract_id: Address,
        function: &str,
        args: &[(NativeValue, ValueType)],
        mode: InvokeMode,
    ) -> Result<Decoded, InvokeError> {
        self.invoke_with_options(
            signer,
            contract_id,
            function,
            args,
            mode,
            &CancellationToken::new(),
            None,
        )
        .await
    }

    /// Invoke a contract function with cooperative cancellation and an
    /// optional per-poll progress sink.
    ///
    /// Cancellation only interrupts the confirmation wait: once sent, a
    /// transaction cannot be withdrawn, and a cancelled wait surfaces as
    /// [`InvokeError::Cancelled`] carrying the hash so the caller can resume
    /// polling later.
    #[allow(clippy::too_many_arguments)]
    pub async fn invoke_with_options(
        &self,
        signer: &dyn TransactionSigner,
        contract_id: Address,
        function: &str,
        args: &[(NativeValue, ValueType)],
        mode: InvokeMode,
        cancel: &CancellationToken,
        progress: Option<&ProgressSink>,
    ) -> Result<Decoded, InvokeError> {
        let correlation_id = CorrelationId::new();
        let function = Symbol::new(function)?;
        let wire_args = encode_args(args)?;
        debug!(
            correlation_id = %correlation_id,
            contract = %contract_id,
            function = %function,
            args = wire_args.len(),
            mode = ?mode,
            "invocation started"
        );

        match mode {
            InvokeMode::SimulateOnly => {
                let envelope = self
                    .build_envelope(signer, contract_id, function, wire_args)
                    .await?;
                self.simulate_preview(envelope, &correlation_id).await
            }
            InvokeMode::SubmitAndConfirm => {
                self.submit_and_confirm(
                    signer,
                    contract_id,
                    function,
                    wire_args,
                    &correlation_id,
                    cancel,
                    progress,
                )
                .await
            }
        }
    }

    /// Snapshot the source account and assemble an envelope on its next
    /// sequence number.
    async fn build_envelope(
        &self,
        signer: &dyn TransactionSigner,
        contract_id: Address,
        function: Symbol,
        args: Vec<WireValue>,
    ) -> Result<TransactionEnvelope, InvokeError> {
        let account = self.client.load_account(signer.address()).await?;
        let envelope = TransactionBuilder::new(
            account,
            self.client.network_passphrase(),
            self.config.base_fee,
        )
        .timeout_secs(self.config.tx_timeout_secs)
        .operation(Operation::InvokeContract {
            contract_id,
            function,
            args,
        })
        .build()?;
        Ok(envelope)
    }

    /// Dry run: simulate and decode the previewed return value. Nothing is
    /// signed or sent.
    async fn simulate_preview(
        &self,
        envelope: TransactionEnvelope,
        correlation_id: &CorrelationId,
    ) -> Result<Decoded, InvokeError> {
        let simulation = self.client.simulate(&envelope).await?;
        if let Some(diagnostic) = simulation.error {
            return Err(InvokeError::Simulation { diagnostic });
        }
        let decoded = match simulation.return_value.as_deref() {
            Some(encoded) => codec::decode_base64(encoded)?,
            None => Decoded::Absent,
        };
        debug!(
            correlation_id = %correlation_id,
            absent = decoded.is_absent(),
            "simulation preview decoded"
        );
        Ok(decoded)
    }

    #[allow(clippy::too_many_arguments)]
    async fn submit_and_confirm(
        &self,
        signer: &dyn TransactionSigner,
        contract_id: Address,
        function: Symbol,
        args: Vec<WireValue>,
        correlation_id: &CorrelationId,
        cancel: &CancellationToken,
        progress: Option<&ProgressSink>,
    ) -> Result<Decoded, InvokeError> {
        // Hold the account lock from the sequence read through `send`: two
        // concurrent invocations from one account must not build on the same
        // sequence number.
        let guard = self.locks.acquire(signer.address()).await;
        let envelope = self
            .build_envelope(signer, contract_id, function, args)
            .await?;
        let accepted = pipeline::submit(
            self.client.as_ref(),
            signer,
            envelope,
            &self.config.retry_config(),
            correlation_id,
        )
        .await?;
        // The sequence number is consumed once the node accepts; polling
        // does not need the lock.
        drop(guard);

        info!(
            correlation_id = %correlation_id,
            tx_hash = %accepted.tx_hash,
            url = %explorer_tx_url(self.client.network_passphrase(), &accepted.tx_hash),
            "transaction accepted, awaiting confirmation"
        );

        let outcome = confirm::await_confirmation(
            self.client.as_ref(),
            &accepted.tx_hash,
            &self.config.poll_config(),
            cancel,
            progress,
        )
        .await
        .map_err(|e| match e {
            ConfirmError::Timeout { tx_hash } => InvokeError::ConfirmationTimeout { tx_hash },
            ConfirmError::Node(node) => InvokeError::Node(node),
            ConfirmError::InvalidConfig(msg) => {
                InvokeError::Internal(format!("poll configuration rejected late: {msg}"))
            }
        })?;

        match outcome {
            ConfirmationOutcome::Success { result_meta } => {
                Ok(meta::extract_return_value(result_meta.as_deref())?)
            }
            ConfirmationOutcome::Failed { code, category } => {
                Err(InvokeError::TransactionFailed { code, category })
            }
            ConfirmationOutcome::Cancelled => Err(InvokeError::Cancelled {
                tx_hash: accepted.tx_hash,
            }),
        }
    }
}

/// Encode caller arguments against their declared wire types, left to right.
fn encode_args(args: &[(NativeValue, ValueType)]) -> Result<Vec<WireValue>, InvokeError> {
    args.iter()
        .map(|(value, declared)| codec::encode(value, declared).map_err(InvokeError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::encode_meta_v3;
    use crate::node::{GetTransactionResponse, TransactionStatus};
    use crate::test_utils::{test_address, MockNodeClient};
    use crate::tx::Ed25519Signer;

    fn setup() -> (Arc<MockNodeClient>, Ed25519Signer, Invoker<MockNodeClient>) {
        let signer = Ed25519Signer::from_seed([9u8; 32]).unwrap();
        let client = Arc::new(MockNodeClient::new("Test Network ; 2024"));
        client.register_account(signer.address().clone(), 100);
        let invoker = Invoker::new(Arc::clone(&client), InvokerConfig::default()).unwrap();
        (client, signer, invoker)
    }

    fn fast_invoker(client: &Arc<MockNodeClient>) -> Invoker<MockNodeClient> {
        let mut config = InvokerConfig::default();
        config.poll.interval_ms = 5;
        config.poll.max_wait_secs = 1;
        Invoker::new(Arc::clone(client), config).unwrap()
    }

    #[tokio::test]
    async fn simulate_only_never_sends() {
        let (client, signer, invoker) = setup();
        client.set_simulation_return(Some(WireValue::I32(7)));

        let decoded = invoker
            .invoke(
                &signer,
                test_address("CGAME"),
                "get_rank",
                &[(NativeValue::Str("alice".into()), ValueType::Str)],
                InvokeMode::SimulateOnly,
            )
            .await
            .unwrap();

        assert_eq!(decoded.value(), Some(&NativeValue::I32(7)));
        assert_eq!(client.counts().simulate, 1);
        assert_eq!(client.counts().send, 0);
        assert_eq!(client.counts().get_transaction, 0);
    }

    #[tokio::test]
    async fn simulate_only_void_function_is_absent() {
        let (_client, signer, invoker) = setup();
        let decoded = invoker
            .invoke(
                &signer,
                test_address("CGAME"),
                "reset",
                &[],
                InvokeMode::SimulateOnly,
            )
            .await
            .unwrap();
        assert!(decoded.is_absent());
    }

    #[tokio::test]
    async fn submit_and_confirm_returns_decoded_result() {
        let (client, signer, _slow) = setup();
        let invoker = fast_invoker(&client);
        client.push_transaction_status(GetTransactionResponse {
            status: TransactionStatus::NotFound,
            result_meta: None,
            result_payload: None,
        });
        client.push_transaction_status(GetTransactionResponse {
            status: TransactionStatus::Success,
            result_meta: Some(encode_meta_v3(Some(&WireValue::I32(42)))),
            result_payload: None,
        });

        let decoded = invoker
            .invoke(
                &signer,
                test_address("CGAME"),
                "increment",
                &[(NativeValue::I64(1), ValueType::I32)],
                InvokeMode::SubmitAndConfirm,
            )
            .await
            .unwrap();

        assert_eq!(decoded.value(), Some(&NativeValue::I32(42)));
        assert_eq!(client.counts().send, 1);
        // The narrowed argument went out as a 32-bit value
        let sent = client.last_sent_envelope().unwrap();
        let Operation::InvokeContract { args, .. } = &sent.operations[0];
        assert_eq!(args, &[WireValue::I32(1)]);
    }

    #[tokio::test]
    async fn ledger_failure_surfaces_code_and_category() {
        let (client, signer, _slow) = setup();
        let invoker = fast_invoker(&client);
        client.push_transaction_status(GetTransactionResponse {
            status: TransactionStatus::Failed,
            result_meta: None,
            result_payload: Some(crate::txcode::encode_error_payload(-16)),
        });

        let err = invoker
            .invoke(
                &signer,
                test_address("CGAME"),
                "increment",
                &[],
                InvokeMode::SubmitAndConfirm,
            )
            .await
            .unwrap_err();

        match err {
            InvokeError::TransactionFailed { code, category } => {
                assert_eq!(code, Some(-16));
                assert_eq!(category, "malformed");
            }
            other => panic!("expected ledger failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bad_function_name_fails_before_any_network_call() {
        let (client, signer, invoker) = setup();
        let err = invoker
            .invoke(
                &signer,
                test_address("CGAME"),
                "not a symbol!",
                &[],
                InvokeMode::SubmitAndConfirm,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Build(_)));
        assert_eq!(client.counts().load_account, 0);
    }

    #[tokio::test]
    async fn out_of_range_argument_fails_before_any_network_call() {
        let (client, signer, invoker) = setup();
        let err = invoker
            .invoke(
                &signer,
                test_address("CGAME"),
                "increment",
                &[(NativeValue::I64(i64::MAX), ValueType::I32)],
                InvokeMode::SubmitAndConfirm,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Codec(_)));
        assert_eq!(client.counts().load_account, 0);
    }

    #[tokio::test]
    async fn cancellation_maps_to_typed_error_with_hash() {
        let (client, signer, _slow) = setup();
        let mut config = InvokerConfig::default();
        config.poll.interval_ms = 60_000;
        config.poll.max_wait_secs = 120;
        let invoker = Invoker::new(Arc::clone(&client), config).unwrap();

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = invoker
            .invoke_with_options(
                &signer,
                test_address("CGAME"),
                "increment",
                &[],
                InvokeMode::SubmitAndConfirm,
                &cancel,
                None,
            )
            .await
            .unwrap_err();

        match err {
            InvokeError::Cancelled { tx_hash } => assert!(!tx_hash.is_empty()),
            other => panic!("expected cancellation, got {other:?}"),
        }
    }
}
