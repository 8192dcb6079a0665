pub mod chain;
pub mod coalesce;
pub mod error;
pub mod types;

pub use chain::*;
pub use coalesce::*;
pub use error::*;
pub use types::*;

use async_trait::async_trait;
use safekit_types::{Address, SafeTransaction, TxHash};

/// The backend aggregation service: proposal storage, gas estimation,
/// relaying, and account metadata. An HTTP implementation lives with the
/// embedding application; the engine only sees this trait.
#[async_trait]
pub trait SafeGateway: Send + Sync {
    async fn get_transaction_details(
        &self,
        chain_id: u64,
        tx_id: &str,
    ) -> Result<TransactionDetails, GatewayError>;

    async fn propose_transaction(
        &self,
        chain_id: u64,
        safe_address: Address,
        proposal: ProposalRequest,
    ) -> Result<TransactionDetails, GatewayError>;

    /// Recommended nonce and, for legacy contract versions, the required
    /// `safeTxGas` for the given call.
    async fn post_gas_estimation(
        &self,
        chain_id: u64,
        safe_address: Address,
        request: EstimationRequest,
    ) -> Result<SafeTxEstimation, GatewayError>;

    async fn relay_transaction(
        &self,
        chain_id: u64,
        request: RelayRequest,
    ) -> Result<RelayResponse, GatewayError>;

    async fn get_relay_task_status(
        &self,
        chain_id: u64,
        task_id: &str,
    ) -> Result<RelayTaskStatus, GatewayError>;

    /// `GET /v1/safes/{address}/creation/`
    async fn get_creation_receipt(
        &self,
        chain_id: u64,
        safe_address: Address,
    ) -> Result<CreationReceipt, GatewayError>;
}

/// Encode the wire payload the backend expects for a proposal.
pub fn proposal_request(
    tx: &SafeTransaction,
    safe_tx_hash: TxHash,
    sender: Address,
    origin: Option<String>,
) -> ProposalRequest {
    ProposalRequest {
        tx_data: tx.data.clone(),
        safe_tx_hash,
        sender,
        signature: if tx.signature_count() == 0 {
            None
        } else {
            Some(tx.encoded_signatures())
        },
        origin,
    }
}
