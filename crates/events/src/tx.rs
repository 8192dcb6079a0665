//! Ordinary-transaction event vocabulary. The `kind` strings are a stable
//! contract consumed by UI collaborators.

use safekit_types::{Address, TxHash};

use crate::bus::{BusEvent, EventBus};

/// Bus carrying ordinary-transaction lifecycle events
pub type TxEventBus = EventBus<TxEvent>;

#[derive(Debug, Clone, PartialEq)]
pub enum TxEvent {
    /// An off-chain signature was collected
    Signed {
        tx_id: Option<String>,
        signer: Address,
    },
    SignFailed {
        tx_id: Option<String>,
        error: String,
    },

    /// A new proposal became visible in the backend queue
    Proposed { tx_id: String },
    ProposeFailed { error: String },

    /// An additional signature landed on an existing proposal
    SignatureProposed { tx_id: String, signer: Address },
    SignatureProposeFailed { error: String },

    /// The wallet accepted the submission request
    Executing { tx_id: String },

    /// Broadcast; carries what a watcher needs to classify the outcome
    Processing {
        tx_id: String,
        tx_hash: TxHash,
        signer: Address,
        signer_nonce: u64,
        gas_limit: Option<u128>,
    },

    /// Mined but the EVM reverted the call
    Reverted { tx_id: String, error: String },

    /// Mined successfully
    Processed { tx_id: String, safe_address: Address },

    /// Relay task reported successful execution
    Success { tx_id: String },

    Failed { tx_id: String, error: String },

    /// Accepted by the gasless relay service
    Relaying { tx_id: String, task_id: String },

    SpeedupFailed { tx_id: String, error: String },
}

impl BusEvent for TxEvent {
    fn kind(&self) -> &'static str {
        match self {
            TxEvent::Signed { .. } => "SIGNED",
            TxEvent::SignFailed { .. } => "SIGN_FAILED",
            TxEvent::Proposed { .. } => "PROPOSED",
            TxEvent::ProposeFailed { .. } => "PROPOSE_FAILED",
            TxEvent::SignatureProposed { .. } => "SIGNATURE_PROPOSED",
            TxEvent::SignatureProposeFailed { .. } => "SIGNATURE_PROPOSE_FAILED",
            TxEvent::Executing { .. } => "EXECUTING",
            TxEvent::Processing { .. } => "PROCESSING",
            TxEvent::Reverted { .. } => "REVERTED",
            TxEvent::Processed { .. } => "PROCESSED",
            TxEvent::Success { .. } => "SUCCESS",
            TxEvent::Failed { .. } => "FAILED",
            TxEvent::Relaying { .. } => "RELAYING",
            TxEvent::SpeedupFailed { .. } => "SPEEDUP_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_the_published_vocabulary() {
        let signed = TxEvent::Signed {
            tx_id: None,
            signer: Address::ZERO,
        };
        assert_eq!(signed.kind(), "SIGNED");

        let relaying = TxEvent::Relaying {
            tx_id: "id".into(),
            task_id: "task".into(),
        };
        assert_eq!(relaying.kind(), "RELAYING");
    }
}
