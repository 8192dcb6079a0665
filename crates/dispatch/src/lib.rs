pub mod executor;
pub mod pending;
pub mod watcher;

pub use executor::*;
pub use pending::*;
pub use watcher::*;

use thiserror::Error;

use safekit_gateway::{ChainError, GatewayError};
use safekit_txflow::TxFlowError;
use safekit_types::SafeVersion;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    TxFlow(#[from] TxFlowError),

    #[error("no canonical multiSend deployment for version {version} on chain {chain_id}")]
    NoMultiSendDeployment { version: SafeVersion, chain_id: u64 },

    #[error("batch execution requires at least one transaction")]
    EmptyBatch,

    #[error("pending state for {tx_id} cannot move from {from} to {to}")]
    InvalidTransition {
        tx_id: String,
        from: &'static str,
        to: &'static str,
    },
}
