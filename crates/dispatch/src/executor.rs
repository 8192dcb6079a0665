//! On-chain submission paths. Each path resolves a chain-bound signer,
//! submits, emits `EXECUTING`/`PROCESSING` (or `RELAYING`), and hands off to
//! a watcher without awaiting it; the terminal outcome arrives later purely
//! via the event bus.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use safekit_events::{TxEvent, TxEventBus};
use safekit_gateway::{
    CallRequest, ChainClient, ChainSigner, RelayRequest, ReplacementClassifier, SafeGateway,
};
use safekit_multisend::{multisend_address, multisend_calldata, MetaTransaction};
use safekit_txflow::TxBuilder;
use safekit_types::{
    exec_transaction_calldata, Address, Operation, PendingTxState, SafeTransaction, SafeVersion,
    TxHash,
};

use crate::watcher::{OutcomeWatcher, RelayPoller};
use crate::{DispatchError, PendingTxStore};

fn current_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub struct Executor {
    chain: Arc<dyn ChainClient>,
    gateway: Arc<dyn SafeGateway>,
    classifier: Arc<dyn ReplacementClassifier>,
    bus: TxEventBus,
    pending: PendingTxStore,
    chain_id: u64,
    safe_address: Address,
    safe_version: SafeVersion,
    relay_poll_interval: Duration,
    relay_max_attempts: u32,
}

impl Executor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chain: Arc<dyn ChainClient>,
        gateway: Arc<dyn SafeGateway>,
        classifier: Arc<dyn ReplacementClassifier>,
        bus: TxEventBus,
        pending: PendingTxStore,
        chain_id: u64,
        safe_address: Address,
        safe_version: SafeVersion,
    ) -> Self {
        Self {
            chain,
            gateway,
            classifier,
            bus,
            pending,
            chain_id,
            safe_address,
            safe_version,
            relay_poll_interval: Duration::from_secs(15),
            relay_max_attempts: 40,
        }
    }

    /// Override how often (and how long) the relay task poller checks for a
    /// terminal status. Typically sourced from `RelayConfig`.
    pub fn with_relay_polling(mut self, poll_interval: Duration, max_attempts: u32) -> Self {
        self.relay_poll_interval = poll_interval;
        self.relay_max_attempts = max_attempts;
        self
    }

    pub fn pending(&self) -> &PendingTxStore {
        &self.pending
    }

    /// Direct execution: one `execTransaction` with the accumulated
    /// signatures.
    pub async fn execute(
        &self,
        tx_id: &str,
        tx: &SafeTransaction,
        signer: &Arc<dyn ChainSigner>,
        gas_limit: Option<u128>,
    ) -> Result<TxHash, DispatchError> {
        let request = CallRequest {
            to: self.safe_address,
            value: 0,
            data: exec_transaction_calldata(tx),
            gas_limit,
            nonce: None,
            max_fee_per_gas: None,
        };
        let ids = [tx_id.to_string()];
        self.submit(&ids, request, signer, gas_limit, false).await
    }

    /// Batched execution: every member's `execTransaction` packed into one
    /// `multiSend` call. All identifiers share the resulting hash, so every
    /// lifecycle event fans out to each of them.
    pub async fn execute_batch(
        &self,
        items: &[(String, SafeTransaction)],
        signer: &Arc<dyn ChainSigner>,
        gas_limit: Option<u128>,
    ) -> Result<TxHash, DispatchError> {
        if items.is_empty() {
            return Err(DispatchError::EmptyBatch);
        }

        let to = multisend_address(self.safe_version, self.chain_id).ok_or(
            DispatchError::NoMultiSendDeployment {
                version: self.safe_version,
                chain_id: self.chain_id,
            },
        )?;

        let batch: Vec<MetaTransaction> = items
            .iter()
            .map(|(_, tx)| MetaTransaction {
                to: self.safe_address,
                value: 0,
                data: exec_transaction_calldata(tx),
                operation: Operation::Call,
            })
            .collect();

        let request = CallRequest {
            to,
            value: 0,
            data: multisend_calldata(&batch),
            gas_limit,
            nonce: None,
            max_fee_per_gas: None,
        };

        let ids: Vec<String> = items.iter().map(|(id, _)| id.clone()).collect();
        self.submit(&ids, request, signer, gas_limit, false).await
    }

    /// Speed-up: resubmit the same logical transaction at the same account
    /// nonce with a higher fee. The call is rebuilt from backend state
    /// rather than cached parameters, since the backend may have collected
    /// more signatures since the original submission.
    pub async fn speed_up(
        &self,
        builder: &TxBuilder,
        tx_id: &str,
        signer: &Arc<dyn ChainSigner>,
        signer_nonce: u64,
        max_fee_per_gas: u128,
        gas_limit: Option<u128>,
    ) -> Result<TxHash, DispatchError> {
        let tx = match builder.create_from_existing(tx_id).await {
            Ok(tx) => tx,
            Err(e) => {
                self.bus.dispatch(TxEvent::SpeedupFailed {
                    tx_id: tx_id.to_string(),
                    error: e.to_string(),
                });
                return Err(e.into());
            }
        };

        let request = CallRequest {
            to: self.safe_address,
            value: 0,
            data: exec_transaction_calldata(&tx),
            gas_limit,
            nonce: Some(signer_nonce),
            max_fee_per_gas: Some(max_fee_per_gas),
        };

        // the replacement restarts the pending lifecycle under the same
        // identifier; without this the store would keep the superseded hash
        self.pending.remove(tx_id);

        let ids = [tx_id.to_string()];
        self.submit(&ids, request, signer, gas_limit, true).await
    }

    /// Gasless relay: the call goes to the relay service, which returns a
    /// task id instead of a hash; outcome arrives through the task poller.
    pub async fn relay(
        &self,
        tx_id: &str,
        tx: &SafeTransaction,
        gas_limit: Option<u128>,
    ) -> Result<String, DispatchError> {
        let request = RelayRequest {
            to: self.safe_address,
            data: exec_transaction_calldata(tx),
            gas_limit,
            version: self.safe_version,
        };

        let response = match self.gateway.relay_transaction(self.chain_id, request).await {
            Ok(response) => response,
            Err(e) => {
                error!(tx_id = %tx_id, error = %e, "relay submission failed");
                self.pending.remove(tx_id);
                self.bus.dispatch(TxEvent::Failed {
                    tx_id: tx_id.to_string(),
                    error: e.to_string(),
                });
                return Err(e.into());
            }
        };

        info!(tx_id = %tx_id, task_id = %response.task_id, "transaction relaying");
        self.pending.set(
            tx_id,
            PendingTxState::Relaying {
                task_id: response.task_id.clone(),
            },
        )?;
        self.bus.dispatch(TxEvent::Relaying {
            tx_id: tx_id.to_string(),
            task_id: response.task_id.clone(),
        });

        let poller = RelayPoller::new(
            Arc::clone(&self.gateway),
            self.bus.clone(),
            self.pending.clone(),
            self.chain_id,
        )
        .with_polling(self.relay_poll_interval, self.relay_max_attempts);
        let task_id = response.task_id.clone();
        let ids = vec![tx_id.to_string()];
        tokio::spawn(async move { poller.poll(task_id, ids).await });

        Ok(response.task_id)
    }

    /// Shared submission tail: broadcast, emit lifecycle events for every
    /// identifier, spawn the outcome watcher without awaiting it.
    async fn submit(
        &self,
        tx_ids: &[String],
        request: CallRequest,
        signer: &Arc<dyn ChainSigner>,
        gas_limit: Option<u128>,
        is_speed_up: bool,
    ) -> Result<TxHash, DispatchError> {
        for tx_id in tx_ids {
            self.pending.set(tx_id, PendingTxState::Submitting)?;
        }

        let submitted = match signer.send_transaction(request).await {
            Ok(submitted) => submitted,
            Err(e) => {
                error!(error = %e, "submission failed");
                for tx_id in tx_ids {
                    self.pending.remove(tx_id);
                    if is_speed_up {
                        self.bus.dispatch(TxEvent::SpeedupFailed {
                            tx_id: tx_id.clone(),
                            error: e.to_string(),
                        });
                    } else {
                        self.bus.dispatch(TxEvent::Failed {
                            tx_id: tx_id.clone(),
                            error: e.to_string(),
                        });
                    }
                }
                return Err(e.into());
            }
        };

        let signer_address = signer.address();
        let submitted_at_ms = current_timestamp_ms();
        for tx_id in tx_ids {
            info!(tx_id = %tx_id, tx_hash = %submitted.tx_hash, "transaction executing");
            self.bus.dispatch(TxEvent::Executing {
                tx_id: tx_id.clone(),
            });
            self.pending.set(
                tx_id,
                PendingTxState::Processing {
                    tx_hash: submitted.tx_hash,
                    signer: signer_address,
                    signer_nonce: submitted.signer_nonce,
                    submitted_at_ms,
                    gas_limit,
                },
            )?;
            self.bus.dispatch(TxEvent::Processing {
                tx_id: tx_id.clone(),
                tx_hash: submitted.tx_hash,
                signer: signer_address,
                signer_nonce: submitted.signer_nonce,
                gas_limit,
            });
        }

        let watcher = OutcomeWatcher::new(
            Arc::clone(&self.chain),
            Arc::clone(&self.classifier),
            self.bus.clone(),
            self.pending.clone(),
            self.safe_address,
        );
        let hash = submitted.tx_hash;
        let ids = tx_ids.to_vec();
        tokio::spawn(async move { watcher.watch(hash, ids).await });

        Ok(hash)
    }
}
