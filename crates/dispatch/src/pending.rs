//! Bookkeeping of in-flight transactions, one live phase per identifier.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use safekit_types::PendingTxState;

use crate::DispatchError;

/// Tracks the single live [`PendingTxState`] per transaction identifier.
/// Transitions are monotonic: an entry never moves back to an earlier
/// phase. Entries are removed when dispatch fails permanently or when the
/// backend indexer confirms the transaction reached history.
#[derive(Clone, Default)]
pub struct PendingTxStore {
    inner: Arc<Mutex<HashMap<String, PendingTxState>>>,
}

impl PendingTxStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or advance the phase for `tx_id`.
    pub fn set(&self, tx_id: &str, state: PendingTxState) -> Result<(), DispatchError> {
        let mut inner = self.inner.lock().expect("pending store lock poisoned");
        if let Some(current) = inner.get(tx_id) {
            if state.rank() <= current.rank() {
                return Err(DispatchError::InvalidTransition {
                    tx_id: tx_id.to_string(),
                    from: current.kind(),
                    to: state.kind(),
                });
            }
        }
        inner.insert(tx_id.to_string(), state);
        Ok(())
    }

    pub fn get(&self, tx_id: &str) -> Option<PendingTxState> {
        self.inner
            .lock()
            .expect("pending store lock poisoned")
            .get(tx_id)
            .cloned()
    }

    pub fn remove(&self, tx_id: &str) -> Option<PendingTxState> {
        self.inner
            .lock()
            .expect("pending store lock poisoned")
            .remove(tx_id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("pending store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
