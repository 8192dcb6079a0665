//! Execution of delay-module entry points and outcome reporting on the
//! recovery bus.

use std::sync::Arc;
use tracing::{info, warn};

use safekit_events::{RecoveryEvent, RecoveryEventBus};
use safekit_gateway::{CallRequest, ChainClient, ChainSigner, WaitError};
use safekit_types::{Address, Bytes, Operation};

use crate::module::{execute_next_tx_calldata, skip_expired_calldata};
use crate::RecoveryError;

pub struct RecoveryExecutor {
    chain: Arc<dyn ChainClient>,
    bus: RecoveryEventBus,
}

impl RecoveryExecutor {
    pub fn new(chain: Arc<dyn ChainClient>, bus: RecoveryEventBus) -> Self {
        Self { chain, bus }
    }

    /// Execute the queue's next item through `executeNextTx`. The payload
    /// must match the queued item exactly or the module rejects the call.
    pub async fn execute_next(
        &self,
        module_address: Address,
        to: Address,
        value: u128,
        data: &Bytes,
        operation: Operation,
        signer: &dyn ChainSigner,
    ) -> Result<(), RecoveryError> {
        let calldata = execute_next_tx_calldata(to, value, data, operation);
        self.submit(module_address, calldata, signer).await
    }

    /// Drop every expired item from the head of the queue via `skipExpired`.
    pub async fn skip_expired(
        &self,
        module_address: Address,
        signer: &dyn ChainSigner,
    ) -> Result<(), RecoveryError> {
        self.submit(module_address, skip_expired_calldata(), signer)
            .await
    }

    async fn submit(
        &self,
        module_address: Address,
        calldata: Bytes,
        signer: &dyn ChainSigner,
    ) -> Result<(), RecoveryError> {
        let request = CallRequest {
            to: module_address,
            value: 0,
            data: calldata,
            gas_limit: None,
            nonce: None,
            max_fee_per_gas: None,
        };

        let submitted = match signer.send_transaction(request).await {
            Ok(submitted) => submitted,
            Err(err) => {
                self.bus.dispatch(RecoveryEvent::Failed {
                    module_address,
                    error: err.to_string(),
                });
                return Err(err.into());
            }
        };

        if signer.is_smart_contract_wallet() {
            // The wallet contract executes the call internally; there is no
            // broadcast hash to await, so report optimistically.
            self.bus
                .dispatch(RecoveryEvent::ProcessingBySmartContractWallet { module_address });
            self.bus
                .dispatch(RecoveryEvent::Processed { module_address });
            return Ok(());
        }

        info!(module = %module_address, tx_hash = %submitted.tx_hash, "recovery call broadcast");
        self.bus.dispatch(RecoveryEvent::Processing {
            module_address,
            tx_hash: submitted.tx_hash,
        });

        let chain = Arc::clone(&self.chain);
        let bus = self.bus.clone();
        tokio::spawn(async move {
            match chain.wait_for_transaction(submitted.tx_hash).await {
                Ok(receipt) if !receipt.status => {
                    warn!(module = %module_address, tx_hash = %submitted.tx_hash, "recovery call reverted");
                    bus.dispatch(RecoveryEvent::Reverted {
                        module_address,
                        error: "recovery transaction reverted on-chain".into(),
                    });
                }
                Ok(_) => {
                    bus.dispatch(RecoveryEvent::Processed { module_address });
                }
                Err(err) => {
                    let message = match err {
                        WaitError::Dropped => "recovery transaction dropped from the pool".into(),
                        other => other.to_string(),
                    };
                    bus.dispatch(RecoveryEvent::Failed {
                        module_address,
                        error: message,
                    });
                }
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use safekit_gateway::{ChainError, SubmittedTx, TxReceipt};
    use safekit_types::{TxHash, SEL_EXECUTE_NEXT_TX, SEL_SKIP_EXPIRED};
    use std::sync::Mutex;
    use std::time::Duration;

    const MODULE: Address = Address([0xd1; 20]);

    struct MockSigner {
        smart_contract: bool,
        fail: bool,
        sent: Mutex<Vec<CallRequest>>,
    }

    impl MockSigner {
        fn new() -> Self {
            Self {
                smart_contract: false,
                fail: false,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChainSigner for MockSigner {
        fn address(&self) -> Address {
            Address([0xec; 20])
        }

        fn is_smart_contract_wallet(&self) -> bool {
            self.smart_contract
        }

        async fn send_transaction(&self, request: CallRequest) -> Result<SubmittedTx, ChainError> {
            if self.fail {
                return Err(ChainError::SubmissionRejected("nonce too low".into()));
            }
            self.sent.lock().unwrap().push(request);
            Ok(SubmittedTx {
                tx_hash: TxHash([0xbb; 32]),
                signer_nonce: 7,
            })
        }
    }

    struct MockChain {
        status: bool,
        wait_error: bool,
    }

    #[async_trait]
    impl ChainClient for MockChain {
        async fn get_transaction_receipt(
            &self,
            _tx_hash: TxHash,
        ) -> Result<Option<TxReceipt>, ChainError> {
            unimplemented!()
        }

        async fn wait_for_transaction(&self, tx_hash: TxHash) -> Result<TxReceipt, WaitError> {
            if self.wait_error {
                return Err(WaitError::Dropped);
            }
            Ok(TxReceipt {
                tx_hash,
                block_number: 1,
                status: self.status,
                gas_used: 21_000,
            })
        }
    }

    fn recording_bus() -> (RecoveryEventBus, Arc<Mutex<Vec<RecoveryEvent>>>) {
        let bus = RecoveryEventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in [
            "PROCESSING_BY_SMART_CONTRACT_WALLET",
            "PROCESSING",
            "REVERTED",
            "PROCESSED",
            "FAILED",
        ] {
            let seen = Arc::clone(&seen);
            let _ = bus.subscribe(kind, move |event| {
                seen.lock().unwrap().push(event.clone());
            });
        }
        (bus, seen)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn successful_execution_reports_processing_then_processed() {
        let (bus, seen) = recording_bus();
        let executor = RecoveryExecutor::new(
            Arc::new(MockChain {
                status: true,
                wait_error: false,
            }),
            bus,
        );
        let signer = MockSigner::new();

        executor
            .execute_next(
                MODULE,
                Address([0x5a; 20]),
                0,
                &Bytes(vec![1, 2, 3]),
                Operation::Call,
                &signer,
            )
            .await
            .unwrap();
        settle().await;

        let events = seen.lock().unwrap();
        assert!(matches!(events[0], RecoveryEvent::Processing { .. }));
        assert!(matches!(events[1], RecoveryEvent::Processed { .. }));

        let sent = signer.sent.lock().unwrap();
        assert_eq!(&sent[0].data.as_slice()[..4], &SEL_EXECUTE_NEXT_TX);
        assert_eq!(sent[0].to, MODULE);
    }

    #[tokio::test]
    async fn reverted_execution_reports_reverted() {
        let (bus, seen) = recording_bus();
        let executor = RecoveryExecutor::new(
            Arc::new(MockChain {
                status: false,
                wait_error: false,
            }),
            bus,
        );
        let signer = MockSigner::new();

        executor.skip_expired(MODULE, &signer).await.unwrap();
        settle().await;

        let events = seen.lock().unwrap();
        assert!(matches!(events[0], RecoveryEvent::Processing { .. }));
        assert!(matches!(events[1], RecoveryEvent::Reverted { .. }));

        let sent = signer.sent.lock().unwrap();
        assert_eq!(sent[0].data.as_slice(), &SEL_SKIP_EXPIRED);
    }

    #[tokio::test]
    async fn dropped_transaction_reports_failed() {
        let (bus, seen) = recording_bus();
        let executor = RecoveryExecutor::new(
            Arc::new(MockChain {
                status: true,
                wait_error: true,
            }),
            bus,
        );
        let signer = MockSigner::new();

        executor.skip_expired(MODULE, &signer).await.unwrap();
        settle().await;

        let events = seen.lock().unwrap();
        assert!(matches!(events[1], RecoveryEvent::Failed { .. }));
    }

    #[tokio::test]
    async fn send_failure_reports_failed_and_raises() {
        let (bus, seen) = recording_bus();
        let executor = RecoveryExecutor::new(
            Arc::new(MockChain {
                status: true,
                wait_error: false,
            }),
            bus,
        );
        let signer = MockSigner {
            fail: true,
            ..MockSigner::new()
        };

        let result = executor.skip_expired(MODULE, &signer).await;
        assert!(result.is_err());

        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RecoveryEvent::Failed { .. }));
    }

    #[tokio::test]
    async fn smart_contract_wallet_path_is_optimistic() {
        let (bus, seen) = recording_bus();
        let executor = RecoveryExecutor::new(
            Arc::new(MockChain {
                status: true,
                wait_error: false,
            }),
            bus,
        );
        let signer = MockSigner {
            smart_contract: true,
            ..MockSigner::new()
        };

        executor.skip_expired(MODULE, &signer).await.unwrap();
        settle().await;

        let events = seen.lock().unwrap();
        assert!(matches!(
            events[0],
            RecoveryEvent::ProcessingBySmartContractWallet { .. }
        ));
        assert!(matches!(events[1], RecoveryEvent::Processed { .. }));
        assert_eq!(events.len(), 2);
    }
}
