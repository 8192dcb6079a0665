//! Recovery snapshot types. A snapshot is owned by the caller and re-derived
//! on every reconstruction; nothing here is persisted incrementally.

use safekit_types::Address;

use crate::module::TransactionAddedLog;

/// One pending item of the recovery queue with its derived timing window
/// and classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryQueueItem {
    pub log: TransactionAddedLog,
    /// When the item was queued, in milliseconds.
    pub timestamp_ms: u64,
    /// End of the cooldown window.
    pub valid_from_ms: u64,
    /// `None` means the item never expires (module expiry of zero).
    pub expires_at_ms: Option<u64>,
    pub is_malicious: bool,
    /// Recoverer that queued the item.
    pub executor: Address,
}

impl RecoveryQueueItem {
    pub fn is_executable(&self, now_ms: u64) -> bool {
        now_ms >= self.valid_from_ms && !self.is_expired(now_ms)
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        match self.expires_at_ms {
            Some(expires_at) => now_ms >= expires_at,
            None => false,
        }
    }
}

/// Snapshot of one delay-module instance. `queue` holds exactly the items
/// whose queue position lies in `[tx_nonce, queue_nonce)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryState {
    pub address: Address,
    pub recoverers: Vec<Address>,
    pub expiry: u64,
    pub delay: u64,
    pub tx_nonce: u64,
    pub queue_nonce: u64,
    pub queue: Vec<RecoveryQueueItem>,
}

impl RecoveryState {
    pub fn has_pending_items(&self) -> bool {
        !self.queue.is_empty()
    }
}
