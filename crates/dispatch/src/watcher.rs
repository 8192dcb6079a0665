//! Terminal-outcome classification for submitted transactions.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use safekit_events::{TxEvent, TxEventBus};
use safekit_gateway::{
    ChainClient, RelayTaskStatus, ReplacementClassifier, ReplacementKind, SafeGateway, WaitError,
};
use safekit_types::{Address, PendingTxState, TxHash};

use crate::PendingTxStore;

/// Synthetic error surfaced when the EVM reverted a mined transaction.
pub const REVERTED_BY_EVM: &str = "transaction reverted by EVM";
/// Synthetic error surfaced when a same-nonce replacement cancelled the
/// transaction.
pub const CANCELLED_BY_REPLACEMENT: &str = "transaction cancelled by a same-nonce replacement";

/// Watches one submitted hash and reports the terminal outcome exactly once
/// per identifier. Never awaited by the dispatching caller.
pub struct OutcomeWatcher {
    chain: Arc<dyn ChainClient>,
    classifier: Arc<dyn ReplacementClassifier>,
    bus: TxEventBus,
    pending: PendingTxStore,
    safe_address: Address,
}

impl OutcomeWatcher {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        classifier: Arc<dyn ReplacementClassifier>,
        bus: TxEventBus,
        pending: PendingTxStore,
        safe_address: Address,
    ) -> Self {
        Self {
            chain,
            classifier,
            bus,
            pending,
            safe_address,
        }
    }

    /// Classification, in priority order: mined-revert, mined-success,
    /// replaced-cancel, replaced-reprice (silent), anything else failed.
    /// Exactly one arm runs, so at most one terminal event is emitted per
    /// identifier per invocation.
    pub async fn watch(&self, tx_hash: TxHash, tx_ids: Vec<String>) {
        match self.chain.wait_for_transaction(tx_hash).await {
            Ok(receipt) if !receipt.status => {
                for tx_id in &tx_ids {
                    self.pending.remove(tx_id);
                    self.bus.dispatch(TxEvent::Reverted {
                        tx_id: tx_id.clone(),
                        error: REVERTED_BY_EVM.to_string(),
                    });
                }
            }
            Ok(receipt) => {
                info!(tx_hash = %tx_hash, block = receipt.block_number, "transaction mined");
                for tx_id in &tx_ids {
                    let _ = self.pending.set(
                        tx_id,
                        PendingTxState::Indexing {
                            tx_hash: Some(tx_hash),
                        },
                    );
                    self.bus.dispatch(TxEvent::Processed {
                        tx_id: tx_id.clone(),
                        safe_address: self.safe_address,
                    });
                }
            }
            Err(WaitError::Replaced {
                replacement_hash,
                raw_reason,
            }) => match self.classifier.classify(&raw_reason) {
                ReplacementKind::Repriced => {
                    // Still the same logical transaction at a higher fee;
                    // the provider tracks the replacement hash itself.
                    warn!(
                        tx_hash = %tx_hash,
                        replacement = %replacement_hash,
                        "accepting replacement as a reprice, still in flight"
                    );
                }
                ReplacementKind::Cancelled | ReplacementKind::Unknown => {
                    for tx_id in &tx_ids {
                        self.pending.remove(tx_id);
                        self.bus.dispatch(TxEvent::Failed {
                            tx_id: tx_id.clone(),
                            error: CANCELLED_BY_REPLACEMENT.to_string(),
                        });
                    }
                }
            },
            Err(e) => {
                for tx_id in &tx_ids {
                    self.pending.remove(tx_id);
                    self.bus.dispatch(TxEvent::Failed {
                        tx_id: tx_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
    }
}

/// Polls a relay task until it reaches a terminal status; there is no
/// receipt to watch until the relay broadcasts on our behalf.
pub struct RelayPoller {
    gateway: Arc<dyn SafeGateway>,
    bus: TxEventBus,
    pending: PendingTxStore,
    chain_id: u64,
    poll_interval: Duration,
    max_attempts: u32,
}

impl RelayPoller {
    pub fn new(
        gateway: Arc<dyn SafeGateway>,
        bus: TxEventBus,
        pending: PendingTxStore,
        chain_id: u64,
    ) -> Self {
        Self {
            gateway,
            bus,
            pending,
            chain_id,
            poll_interval: Duration::from_secs(15),
            max_attempts: 40,
        }
    }

    pub fn with_polling(mut self, poll_interval: Duration, max_attempts: u32) -> Self {
        self.poll_interval = poll_interval;
        self.max_attempts = max_attempts;
        self
    }

    pub async fn poll(&self, task_id: String, tx_ids: Vec<String>) {
        for attempt in 0..self.max_attempts {
            match self.gateway.get_relay_task_status(self.chain_id, &task_id).await {
                Ok(status) if status.is_terminal() => {
                    self.finish(status, &tx_ids);
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(task_id = %task_id, attempt, error = %e, "relay status poll failed");
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        for tx_id in &tx_ids {
            self.pending.remove(tx_id);
            self.bus.dispatch(TxEvent::Failed {
                tx_id: tx_id.clone(),
                error: format!("relay task {task_id} did not complete"),
            });
        }
    }

    fn finish(&self, status: RelayTaskStatus, tx_ids: &[String]) {
        for tx_id in tx_ids {
            match status {
                RelayTaskStatus::ExecSuccess => {
                    let _ = self
                        .pending
                        .set(tx_id, PendingTxState::Indexing { tx_hash: None });
                    self.bus.dispatch(TxEvent::Success {
                        tx_id: tx_id.clone(),
                    });
                }
                RelayTaskStatus::ExecReverted => {
                    self.pending.remove(tx_id);
                    self.bus.dispatch(TxEvent::Reverted {
                        tx_id: tx_id.clone(),
                        error: REVERTED_BY_EVM.to_string(),
                    });
                }
                RelayTaskStatus::Cancelled => {
                    self.pending.remove(tx_id);
                    self.bus.dispatch(TxEvent::Failed {
                        tx_id: tx_id.clone(),
                        error: "relay task was cancelled".to_string(),
                    });
                }
                // non-terminal statuses never reach here
                _ => {}
            }
        }
    }
}
