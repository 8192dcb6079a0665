//! Canonical transaction construction.

use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use safekit_gateway::{EstimationRequest, GatewayError, SafeGateway};
use safekit_types::{
    Address, Bytes, SafeTransaction, SafeTransactionParams, SafeVersion,
};

#[derive(Debug, Error)]
pub enum TxFlowError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("address {0} is not an owner of this account")]
    OwnerNotFound(Address),
}

/// Builds canonical transaction records, filling the recommended nonce (and
/// `safeTxGas` for legacy contract versions) from the backend estimator.
pub struct TxBuilder {
    gateway: Arc<dyn SafeGateway>,
    chain_id: u64,
    safe_address: Address,
    safe_version: SafeVersion,
}

impl TxBuilder {
    pub fn new(
        gateway: Arc<dyn SafeGateway>,
        chain_id: u64,
        safe_address: Address,
        safe_version: SafeVersion,
    ) -> Self {
        Self {
            gateway,
            chain_id,
            safe_address,
            safe_version,
        }
    }

    pub fn safe_address(&self) -> Address {
        self.safe_address
    }

    pub fn safe_version(&self) -> SafeVersion {
        self.safe_version
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Build a record from raw parameters.
    ///
    /// With `explicit_nonce` the estimator is skipped entirely. Otherwise
    /// the backend recommends a nonce; if estimating the original call
    /// fails (it may itself fail simulation), a zero-value self-call is
    /// estimated instead to still obtain a usable nonce; if that also
    /// fails, the caller's parameters are used unmodified. Estimation
    /// failure never surfaces to the caller.
    pub async fn create(
        &self,
        params: SafeTransactionParams,
        explicit_nonce: Option<u64>,
    ) -> SafeTransaction {
        if let Some(nonce) = explicit_nonce {
            return SafeTransaction::new(params.with_nonce(nonce));
        }

        let request = EstimationRequest {
            to: params.to,
            value: params.value,
            data: params.data.clone(),
            operation: params.operation as u8,
        };

        match self.estimate(request).await {
            Ok(estimation) => {
                let mut params = params;
                if self.safe_version.requires_safe_tx_gas() && params.safe_tx_gas == 0 {
                    params.safe_tx_gas = estimation.safe_tx_gas;
                }
                SafeTransaction::new(params.with_nonce(estimation.recommended_nonce))
            }
            Err(first_err) => {
                debug!(
                    error = %first_err,
                    "estimation of the original call failed, retrying with a self-call"
                );
                let probe = EstimationRequest {
                    to: self.safe_address,
                    value: 0,
                    data: Bytes::new(),
                    operation: 0,
                };
                match self.estimate(probe).await {
                    Ok(estimation) => {
                        SafeTransaction::new(params.with_nonce(estimation.recommended_nonce))
                    }
                    Err(second_err) => {
                        warn!(
                            error = %second_err,
                            "estimation failed twice, building with caller parameters unmodified"
                        );
                        SafeTransaction::new(params.without_nonce())
                    }
                }
            }
        }
    }

    async fn estimate(
        &self,
        request: EstimationRequest,
    ) -> Result<safekit_gateway::SafeTxEstimation, GatewayError> {
        self.gateway
            .post_gas_estimation(self.chain_id, self.safe_address, request)
            .await
    }

    /// Rebuild a previously proposed transaction from backend details,
    /// pre-populating the signature map from reported confirmations.
    pub async fn create_from_existing(&self, tx_id: &str) -> Result<SafeTransaction, TxFlowError> {
        let details = self
            .gateway
            .get_transaction_details(self.chain_id, tx_id)
            .await?;

        let mut signatures = BTreeMap::new();
        for confirmation in details.confirmations {
            signatures.insert(confirmation.signer, confirmation.signature);
        }

        Ok(SafeTransaction::with_signatures(details.tx_data, signatures))
    }

    /// A zero-value self-call occupying `nonce`: executing it invalidates
    /// whatever queued transaction holds that nonce.
    pub fn create_rejection(&self, nonce: u64) -> SafeTransaction {
        let params = SafeTransactionParams::call(self.safe_address, 0, Bytes::new());
        SafeTransaction::new(params.with_nonce(nonce))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use safekit_gateway::{
        CreationReceipt, ProposalRequest, RelayRequest, RelayResponse, RelayTaskStatus,
        SafeTxEstimation, TransactionDetails,
    };
    use std::sync::Mutex;

    struct MockGateway {
        estimations: Mutex<Vec<Result<SafeTxEstimation, GatewayError>>>,
        estimate_calls: Mutex<Vec<EstimationRequest>>,
    }

    impl MockGateway {
        fn new(estimations: Vec<Result<SafeTxEstimation, GatewayError>>) -> Self {
            Self {
                estimations: Mutex::new(estimations),
                estimate_calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SafeGateway for MockGateway {
        async fn get_transaction_details(
            &self,
            _chain_id: u64,
            _tx_id: &str,
        ) -> Result<TransactionDetails, GatewayError> {
            Err(GatewayError::NotFound("unused".into()))
        }

        async fn propose_transaction(
            &self,
            _chain_id: u64,
            _safe_address: Address,
            _proposal: ProposalRequest,
        ) -> Result<TransactionDetails, GatewayError> {
            Err(GatewayError::NotFound("unused".into()))
        }

        async fn post_gas_estimation(
            &self,
            _chain_id: u64,
            _safe_address: Address,
            request: EstimationRequest,
        ) -> Result<SafeTxEstimation, GatewayError> {
            self.estimate_calls.lock().unwrap().push(request);
            self.estimations.lock().unwrap().remove(0)
        }

        async fn relay_transaction(
            &self,
            _chain_id: u64,
            _request: RelayRequest,
        ) -> Result<RelayResponse, GatewayError> {
            Err(GatewayError::NotFound("unused".into()))
        }

        async fn get_relay_task_status(
            &self,
            _chain_id: u64,
            _task_id: &str,
        ) -> Result<RelayTaskStatus, GatewayError> {
            Err(GatewayError::NotFound("unused".into()))
        }

        async fn get_creation_receipt(
            &self,
            _chain_id: u64,
            _safe_address: Address,
        ) -> Result<CreationReceipt, GatewayError> {
            Err(GatewayError::NotFound("unused".into()))
        }
    }

    fn builder(gateway: Arc<MockGateway>, version: SafeVersion) -> TxBuilder {
        TxBuilder::new(gateway, 1, Address([0x5a; 20]), version)
    }

    fn params() -> SafeTransactionParams {
        SafeTransactionParams::call(Address([0xaa; 20]), 5, Bytes(vec![1, 2]))
    }

    #[tokio::test]
    async fn explicit_nonce_skips_estimation() {
        let gateway = Arc::new(MockGateway::new(vec![]));
        let tx = builder(Arc::clone(&gateway), SafeVersion::new(1, 4, 1))
            .create(params(), Some(42))
            .await;
        assert_eq!(tx.data.nonce, Some(42));
        assert!(gateway.estimate_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn recommended_nonce_is_used() {
        let gateway = Arc::new(MockGateway::new(vec![Ok(SafeTxEstimation {
            recommended_nonce: 7,
            safe_tx_gas: 30_000,
        })]));
        let tx = builder(Arc::clone(&gateway), SafeVersion::new(1, 4, 1))
            .create(params(), None)
            .await;
        assert_eq!(tx.data.nonce, Some(7));
        // current versions do not take the estimated safeTxGas
        assert_eq!(tx.data.safe_tx_gas, 0);
    }

    #[tokio::test]
    async fn legacy_version_takes_estimated_safe_tx_gas() {
        let gateway = Arc::new(MockGateway::new(vec![Ok(SafeTxEstimation {
            recommended_nonce: 3,
            safe_tx_gas: 55_555,
        })]));
        let tx = builder(Arc::clone(&gateway), SafeVersion::new(1, 1, 1))
            .create(params(), None)
            .await;
        assert_eq!(tx.data.nonce, Some(3));
        assert_eq!(tx.data.safe_tx_gas, 55_555);
    }

    #[tokio::test]
    async fn failed_estimation_retries_with_self_call() {
        let gateway = Arc::new(MockGateway::new(vec![
            Err(GatewayError::Rejected("simulation reverted".into())),
            Ok(SafeTxEstimation {
                recommended_nonce: 9,
                safe_tx_gas: 0,
            }),
        ]));
        let b = builder(Arc::clone(&gateway), SafeVersion::new(1, 4, 1));
        let tx = b.create(params(), None).await;
        assert_eq!(tx.data.nonce, Some(9));

        let calls = gateway.estimate_calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        // the retry probes a zero-value self-call, not the original target
        assert_eq!(calls[1].to, b.safe_address());
        assert_eq!(calls[1].value, 0);
        assert!(calls[1].data.is_empty());
    }

    #[tokio::test]
    async fn double_estimation_failure_never_errors() {
        let gateway = Arc::new(MockGateway::new(vec![
            Err(GatewayError::Transport("down".into())),
            Err(GatewayError::Transport("down".into())),
        ]));
        let tx = builder(gateway, SafeVersion::new(1, 4, 1))
            .create(params(), None)
            .await;
        // caller params survive unmodified and no nonce is invented
        assert_eq!(tx.data.to, Address([0xaa; 20]));
        assert_eq!(tx.data.value, 5);
        assert_eq!(tx.data.nonce, None);
    }

    #[tokio::test]
    async fn rejection_is_zero_value_self_call() {
        let gateway = Arc::new(MockGateway::new(vec![]));
        let b = builder(gateway, SafeVersion::new(1, 4, 1));
        let rejection = b.create_rejection(5);
        assert_eq!(rejection.data.to, b.safe_address());
        assert_eq!(rejection.data.value, 0);
        assert!(rejection.data.data.is_empty());
        assert_eq!(rejection.data.nonce, Some(5));
    }
}
