//! Wire DTOs crossing the backend boundary.

use serde::{Deserialize, Serialize};

use safekit_types::{Address, Bytes, SafeTransactionData, SafeVersion, TxHash};

/// Backend view of a proposed transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub tx_id: String,
    pub tx_data: SafeTransactionData,
    pub safe_tx_hash: TxHash,
    pub confirmations: Vec<Confirmation>,
    pub proposer: Option<Address>,
}

/// One collected signature as reported by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Confirmation {
    pub signer: Address,
    pub signature: Bytes,
}

/// New-proposal / additional-signature submission payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalRequest {
    pub tx_data: SafeTransactionData,
    pub safe_tx_hash: TxHash,
    pub sender: Address,
    pub signature: Option<Bytes>,
    pub origin: Option<String>,
}

/// Parameters the backend estimates against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimationRequest {
    pub to: Address,
    pub value: u128,
    pub data: Bytes,
    pub operation: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafeTxEstimation {
    pub recommended_nonce: u64,
    pub safe_tx_gas: u128,
}

/// Gasless relay submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayRequest {
    pub to: Address,
    pub data: Bytes,
    pub gas_limit: Option<u128>,
    pub version: SafeVersion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayResponse {
    pub task_id: String,
}

/// Terminal and in-flight states of a relay task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayTaskStatus {
    CheckPending,
    ExecPending,
    WaitingForConfirmation,
    ExecSuccess,
    ExecReverted,
    Cancelled,
}

impl RelayTaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RelayTaskStatus::ExecSuccess
                | RelayTaskStatus::ExecReverted
                | RelayTaskStatus::Cancelled
        )
    }
}

/// `GET /v1/safes/{address}/creation/` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreationReceipt {
    pub transaction_hash: TxHash,
}
