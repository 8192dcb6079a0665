//! Delay-module contract surface: the batched parameter read, the
//! `TransactionAdded` log shape, and calldata builders for the module's
//! entry points.

use async_trait::async_trait;
use std::ops::Range;

use safekit_types::{
    encode_call, Address, Bytes, Operation, Token, TxHash, SEL_DISABLE_MODULE, SEL_ENABLE_MODULE,
    SEL_EXECUTE_NEXT_TX, SEL_EXEC_TRANSACTION_FROM_MODULE, SEL_SET_TX_COOLDOWN,
    SEL_SET_TX_EXPIRATION, SEL_SKIP_EXPIRED,
};

use crate::RecoveryError;

/// Snapshot of the module's control parameters, read in one batched call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayModuleParameters {
    pub recoverers: Vec<Address>,
    /// Seconds a queued item stays executable after its cooldown; zero
    /// means items never expire.
    pub expiry: u64,
    /// Cooldown seconds between queueing and executability.
    pub delay: u64,
    /// Queue position of the next item to execute.
    pub tx_nonce: u64,
    /// Queue position the next added item will take.
    pub queue_nonce: u64,
}

/// One decoded `TransactionAdded` log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionAddedLog {
    pub queue_nonce: u64,
    pub tx_hash: TxHash,
    pub to: Address,
    pub value: u128,
    pub data: Bytes,
    pub operation: Operation,
    /// Recoverer that queued the item.
    pub sender: Address,
    pub block_number: u64,
    /// Flagged by the provider when a reorg dropped the log.
    pub removed: bool,
}

/// Read access to one delay-module instance.
#[async_trait]
pub trait DelayModuleReader: Send + Sync {
    fn address(&self) -> Address;

    /// `{recoverers, expiry, delay, txNonce, queueNonce}` in one batched
    /// read.
    async fn module_parameters(&self) -> Result<DelayModuleParameters, RecoveryError>;

    /// `txCreatedAt(queueNonce)`, in seconds.
    async fn tx_created_at(&self, queue_nonce: u64) -> Result<u64, RecoveryError>;

    /// `TransactionAdded` logs filtered to queue positions in `nonces`,
    /// from `from_block` to latest.
    async fn transaction_added_logs(
        &self,
        from_block: u64,
        nonces: Range<u64>,
    ) -> Result<Vec<TransactionAddedLog>, RecoveryError>;
}

pub fn execute_next_tx_calldata(
    to: Address,
    value: u128,
    data: &Bytes,
    operation: Operation,
) -> Bytes {
    encode_call(
        SEL_EXECUTE_NEXT_TX,
        &[
            Token::Address(to),
            Token::Uint(value),
            Token::Bytes(data.0.clone()),
            Token::Uint8(operation as u8),
        ],
    )
}

pub fn skip_expired_calldata() -> Bytes {
    encode_call(SEL_SKIP_EXPIRED, &[])
}

pub fn exec_transaction_from_module_calldata(
    to: Address,
    value: u128,
    data: &Bytes,
    operation: Operation,
) -> Bytes {
    encode_call(
        SEL_EXEC_TRANSACTION_FROM_MODULE,
        &[
            Token::Address(to),
            Token::Uint(value),
            Token::Bytes(data.0.clone()),
            Token::Uint8(operation as u8),
        ],
    )
}

pub fn enable_module_calldata(module: Address) -> Bytes {
    encode_call(SEL_ENABLE_MODULE, &[Token::Address(module)])
}

pub fn disable_module_calldata(prev_module: Address, module: Address) -> Bytes {
    encode_call(
        SEL_DISABLE_MODULE,
        &[Token::Address(prev_module), Token::Address(module)],
    )
}

pub fn set_tx_cooldown_calldata(cooldown_secs: u64) -> Bytes {
    encode_call(SEL_SET_TX_COOLDOWN, &[Token::Uint(cooldown_secs as u128)])
}

pub fn set_tx_expiration_calldata(expiration_secs: u64) -> Bytes {
    encode_call(SEL_SET_TX_EXPIRATION, &[Token::Uint(expiration_secs as u128)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_point_calldata_carries_the_right_selector() {
        let data = execute_next_tx_calldata(
            Address([0x11; 20]),
            0,
            &Bytes(vec![1, 2, 3]),
            Operation::Call,
        );
        assert_eq!(&data.as_slice()[..4], &SEL_EXECUTE_NEXT_TX);

        assert_eq!(skip_expired_calldata().as_slice(), &SEL_SKIP_EXPIRED);
    }
}
