//! Chain RPC collaborators: receipt waiting, submission, and the
//! replacement classifier that separates a fee bump from a cancellation.

use async_trait::async_trait;
use thiserror::Error;

use safekit_types::{Address, Bytes, TxHash};

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("provider connection failed: {0}")]
    Connection(String),

    #[error("submission rejected: {0}")]
    SubmissionRejected(String),

    #[error("query failed: {0}")]
    Query(String),
}

/// A mined receipt
#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    /// `false` means the EVM reverted the call
    pub status: bool,
    pub gas_used: u128,
}

/// Why waiting for a receipt ended without one
#[derive(Debug, Error)]
pub enum WaitError {
    /// Another transaction consumed the nonce. The provider-specific reason
    /// string is carried raw; a [`ReplacementClassifier`] interprets it.
    #[error("transaction replaced: {raw_reason}")]
    Replaced {
        replacement_hash: TxHash,
        raw_reason: String,
    },

    #[error("dropped from the mempool")]
    Dropped,

    #[error(transparent)]
    Provider(#[from] ChainError),
}

/// Classified meaning of a same-nonce replacement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementKind {
    /// Fee bump of the same logical transaction; still in flight
    Repriced,
    /// Unrelated transaction freed the nonce; the original is gone
    Cancelled,
    /// Provider reason not understood; treated like a cancellation
    Unknown,
}

/// Maps a provider-specific replacement reason to a [`ReplacementKind`].
/// One implementation per target-chain RPC client; no message sniffing
/// leaks past this seam.
pub trait ReplacementClassifier: Send + Sync {
    fn classify(&self, raw_reason: &str) -> ReplacementKind;
}

/// Classifier for providers that report the go-ethereum reason strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct GethReplacementClassifier;

impl ReplacementClassifier for GethReplacementClassifier {
    fn classify(&self, raw_reason: &str) -> ReplacementKind {
        match raw_reason {
            "repriced" => ReplacementKind::Repriced,
            "cancelled" | "replaced" => ReplacementKind::Cancelled,
            _ => ReplacementKind::Unknown,
        }
    }
}

/// A raw call request the signer broadcasts
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub to: Address,
    pub value: u128,
    pub data: Bytes,
    pub gas_limit: Option<u128>,
    /// Explicit account nonce; used by the speed-up path to replace an
    /// earlier submission.
    pub nonce: Option<u64>,
    pub max_fee_per_gas: Option<u128>,
}

/// The wallet's acknowledgment that a call was broadcast
#[derive(Debug, Clone)]
pub struct SubmittedTx {
    pub tx_hash: TxHash,
    pub signer_nonce: u64,
}

/// A chain-bound wallet signer able to broadcast calls.
#[async_trait]
pub trait ChainSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Smart-contract wallets execute through their own contract, so their
    /// inner call cannot be awaited like an EOA broadcast.
    fn is_smart_contract_wallet(&self) -> bool {
        false
    }

    async fn send_transaction(&self, request: CallRequest) -> Result<SubmittedTx, ChainError>;
}

/// Read access to the chain.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<TxReceipt>, ChainError>;

    /// Resolves once the transaction is mined, or with a [`WaitError`] when
    /// the provider reports replacement/drop instead of a receipt.
    async fn wait_for_transaction(&self, tx_hash: TxHash) -> Result<TxReceipt, WaitError>;
}
