use serde::{Deserialize, Serialize};

use crate::{Address, TxHash};

/// The single live phase of an in-flight transaction.
///
/// Exactly one variant is live per identifier at a time and transitions are
/// monotonic: a phase is never revisited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingTxState {
    /// A wallet signature request is open
    Signing { signer: Address },

    /// Handed to the wallet for on-chain submission
    Submitting,

    /// Broadcast and waiting for a receipt
    Processing {
        tx_hash: TxHash,
        signer: Address,
        signer_nonce: u64,
        submitted_at_ms: u64,
        gas_limit: Option<u128>,
    },

    /// Submitted to the gasless relay, tracked by task id
    Relaying { task_id: String },

    /// Mined, waiting for the backend indexer to pick it up
    Indexing { tx_hash: Option<TxHash> },
}

impl PendingTxState {
    /// Monotonic ordering rank. `Processing` and `Relaying` are alternate
    /// third phases of the same lifecycle position.
    pub fn rank(&self) -> u8 {
        match self {
            PendingTxState::Signing { .. } => 0,
            PendingTxState::Submitting => 1,
            PendingTxState::Processing { .. } | PendingTxState::Relaying { .. } => 2,
            PendingTxState::Indexing { .. } => 3,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PendingTxState::Signing { .. } => "SIGNING",
            PendingTxState::Submitting => "SUBMITTING",
            PendingTxState::Processing { .. } => "PROCESSING",
            PendingTxState::Relaying { .. } => "RELAYING",
            PendingTxState::Indexing { .. } => "INDEXING",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_are_monotonic() {
        let signing = PendingTxState::Signing {
            signer: Address::ZERO,
        };
        let submitting = PendingTxState::Submitting;
        let relaying = PendingTxState::Relaying {
            task_id: "task".into(),
        };
        let indexing = PendingTxState::Indexing { tx_hash: None };

        assert!(signing.rank() < submitting.rank());
        assert!(submitting.rank() < relaying.rank());
        assert!(relaying.rank() < indexing.rank());
    }
}
