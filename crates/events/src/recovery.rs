//! Recovery-transaction event vocabulary, on its own bus so recovery flows
//! never interleave with ordinary-transaction subscribers.

use safekit_types::{Address, TxHash};

use crate::bus::{BusEvent, EventBus};

pub type RecoveryEventBus = EventBus<RecoveryEvent>;

#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryEvent {
    /// A smart-contract wallet signed the module call; its inner execution
    /// cannot be awaited, so this is an optimistic signal.
    ProcessingBySmartContractWallet { module_address: Address },

    Processing {
        module_address: Address,
        tx_hash: TxHash,
    },

    Reverted {
        module_address: Address,
        error: String,
    },

    Processed { module_address: Address },

    Failed {
        module_address: Address,
        error: String,
    },
}

impl BusEvent for RecoveryEvent {
    fn kind(&self) -> &'static str {
        match self {
            RecoveryEvent::ProcessingBySmartContractWallet { .. } => {
                "PROCESSING_BY_SMART_CONTRACT_WALLET"
            }
            RecoveryEvent::Processing { .. } => "PROCESSING",
            RecoveryEvent::Reverted { .. } => "REVERTED",
            RecoveryEvent::Processed { .. } => "PROCESSED",
            RecoveryEvent::Failed { .. } => "FAILED",
        }
    }
}
