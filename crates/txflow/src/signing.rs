//! Off-chain signature collection over an ordered list of wallet
//! capabilities.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use safekit_events::{TxEvent, TxEventBus};
use safekit_types::{Address, Bytes, SafeTransaction, SafeVersion, TxHash};

/// One off-chain signing capability a wallet may support
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningMethod {
    EthSignTypedData,
    EthSign,
}

/// Ordered capability list for a contract version: current versions try
/// typed-data first and fall back to plain hash signing; older versions
/// support only the latter.
pub fn signing_methods(version: SafeVersion) -> Vec<SigningMethod> {
    if version.supports_typed_data_signing() {
        vec![SigningMethod::EthSignTypedData, SigningMethod::EthSign]
    } else {
        vec![SigningMethod::EthSign]
    }
}

/// Typed signing failure. User rejection is its own variant so the
/// coordinator never has to sniff provider message strings.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("user rejected the signature request")]
    UserRejected,

    #[error("wallet does not support this signing method")]
    Unsupported,

    #[error("signing failed: {0}")]
    Other(String),
}

impl SignerError {
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, SignerError::UserRejected)
    }
}

/// A connected wallet able to produce off-chain signatures.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn address(&self) -> Address;

    async fn sign_typed_data(
        &self,
        chain_id: u64,
        safe_address: Address,
        tx: &SafeTransaction,
    ) -> Result<Bytes, SignerError>;

    async fn sign_hash(&self, hash: TxHash) -> Result<Bytes, SignerError>;
}

/// Tries the version-derived method list against a wallet: first success
/// wins, user rejection aborts immediately, any other failure falls through
/// to the next method.
pub struct SigningCoordinator {
    bus: TxEventBus,
    chain_id: u64,
    safe_address: Address,
}

impl SigningCoordinator {
    pub fn new(bus: TxEventBus, chain_id: u64, safe_address: Address) -> Self {
        Self {
            bus,
            chain_id,
            safe_address,
        }
    }

    pub async fn sign(
        &self,
        tx: &SafeTransaction,
        version: SafeVersion,
        wallet: &dyn WalletProvider,
        tx_id: Option<String>,
    ) -> Result<SafeTransaction, SignerError> {
        let methods = signing_methods(version);
        let signer = wallet.address();
        let last = methods.len() - 1;

        for (i, method) in methods.into_iter().enumerate() {
            let attempt = match method {
                SigningMethod::EthSignTypedData => {
                    wallet
                        .sign_typed_data(self.chain_id, self.safe_address, tx)
                        .await
                }
                SigningMethod::EthSign => {
                    let hash = tx.safe_tx_hash(self.chain_id, &self.safe_address);
                    wallet.sign_hash(hash).await
                }
            };

            match attempt {
                Ok(signature) => {
                    let signed = tx.add_signature(signer, signature);
                    info!(signer = %signer, method = ?method, "transaction signed");
                    self.bus.dispatch(TxEvent::Signed {
                        tx_id: tx_id.clone(),
                        signer,
                    });
                    return Ok(signed);
                }
                Err(e) if e.is_user_rejection() => {
                    self.bus.dispatch(TxEvent::SignFailed {
                        tx_id: tx_id.clone(),
                        error: e.to_string(),
                    });
                    return Err(e);
                }
                Err(e) if i < last => {
                    debug!(method = ?method, error = %e, "signing method failed, trying next");
                }
                Err(e) => {
                    self.bus.dispatch(TxEvent::SignFailed {
                        tx_id: tx_id.clone(),
                        error: e.to_string(),
                    });
                    return Err(e);
                }
            }
        }

        unreachable!("method list is never empty")
    }
}
