//! Minimal ABI call encoding for the fixed contract surface the engine
//! drives. Selectors are pinned constants; only the argument shapes used by
//! that surface are supported.

use crate::{Address, Bytes, SafeTransaction};

/// `execTransaction(address,uint256,bytes,uint8,uint256,uint256,uint256,address,address,bytes)`
pub const SEL_EXEC_TRANSACTION: [u8; 4] = [0x6a, 0x76, 0x12, 0x02];
/// `multiSend(bytes)`
pub const SEL_MULTI_SEND: [u8; 4] = [0x8d, 0x80, 0xff, 0x0a];
/// `addOwnerWithThreshold(address,uint256)`
pub const SEL_ADD_OWNER_WITH_THRESHOLD: [u8; 4] = [0x0d, 0x58, 0x2f, 0x13];
/// `removeOwner(address,address,uint256)`
pub const SEL_REMOVE_OWNER: [u8; 4] = [0xf8, 0xdc, 0x5d, 0xd9];
/// `swapOwner(address,address,address)`
pub const SEL_SWAP_OWNER: [u8; 4] = [0xe3, 0x18, 0xb5, 0x2b];
/// `changeThreshold(uint256)`
pub const SEL_CHANGE_THRESHOLD: [u8; 4] = [0x69, 0x4e, 0x80, 0xc3];
/// `enableModule(address)`
pub const SEL_ENABLE_MODULE: [u8; 4] = [0x61, 0x0b, 0x59, 0x25];
/// `disableModule(address,address)`
pub const SEL_DISABLE_MODULE: [u8; 4] = [0xe0, 0x09, 0xcf, 0xde];
/// `execTransactionFromModule(address,uint256,bytes,uint8)`
pub const SEL_EXEC_TRANSACTION_FROM_MODULE: [u8; 4] = [0x46, 0x87, 0x21, 0xa7];
/// Delay module `executeNextTx(address,uint256,bytes,uint8)`
pub const SEL_EXECUTE_NEXT_TX: [u8; 4] = [0x8a, 0xdc, 0x4c, 0xf4];
/// Delay module `skipExpired()`
pub const SEL_SKIP_EXPIRED: [u8; 4] = [0x6b, 0x8e, 0x0f, 0x2d];
/// Delay module `setTxCooldown(uint256)`
pub const SEL_SET_TX_COOLDOWN: [u8; 4] = [0xc4, 0x20, 0x69, 0xec];
/// Delay module `setTxExpiration(uint256)`
pub const SEL_SET_TX_EXPIRATION: [u8; 4] = [0x77, 0x5f, 0x2b, 0x8f];

/// A single ABI argument
#[derive(Debug, Clone)]
pub enum Token {
    Address(Address),
    Uint(u128),
    Uint8(u8),
    Bytes(Vec<u8>),
}

impl Token {
    fn is_dynamic(&self) -> bool {
        matches!(self, Token::Bytes(_))
    }

    fn head_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        match self {
            Token::Address(a) => word[12..].copy_from_slice(a.as_bytes()),
            Token::Uint(v) => word[16..].copy_from_slice(&v.to_be_bytes()),
            Token::Uint8(v) => word[31] = *v,
            Token::Bytes(_) => unreachable!("dynamic token has no inline head"),
        }
        word
    }
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(32) * 32
}

/// Standard head/tail encoding of a call: selector, one 32-byte head word
/// per argument (dynamic arguments store a tail offset), then tails.
pub fn encode_call(selector: [u8; 4], tokens: &[Token]) -> Bytes {
    let head_len = tokens.len() * 32;
    let mut head = Vec::with_capacity(4 + head_len);
    let mut tail: Vec<u8> = Vec::new();

    head.extend_from_slice(&selector);
    for token in tokens {
        if token.is_dynamic() {
            let offset = (head_len + tail.len()) as u128;
            let mut word = [0u8; 32];
            word[16..].copy_from_slice(&offset.to_be_bytes());
            head.extend_from_slice(&word);

            let Token::Bytes(data) = token else {
                unreachable!()
            };
            let mut len_word = [0u8; 32];
            len_word[16..].copy_from_slice(&(data.len() as u128).to_be_bytes());
            tail.extend_from_slice(&len_word);
            tail.extend_from_slice(data);
            tail.resize(tail.len() + padded_len(data.len()) - data.len(), 0);
        } else {
            head.extend_from_slice(&token.head_word());
        }
    }

    head.extend_from_slice(&tail);
    Bytes(head)
}

/// Calldata for `execTransaction` over the given record's core fields and
/// accumulated signatures.
pub fn exec_transaction_calldata(tx: &SafeTransaction) -> Bytes {
    encode_call(
        SEL_EXEC_TRANSACTION,
        &[
            Token::Address(tx.data.to),
            Token::Uint(tx.data.value),
            Token::Bytes(tx.data.data.0.clone()),
            Token::Uint8(tx.data.operation as u8),
            Token::Uint(tx.data.safe_tx_gas),
            Token::Uint(tx.data.base_gas),
            Token::Uint(tx.data.gas_price),
            Token::Address(tx.data.gas_token),
            Token::Address(tx.data.refund_receiver),
            Token::Bytes(tx.encoded_signatures().0),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SafeTransactionParams;

    #[test]
    fn encodes_static_arguments() {
        let out = encode_call(
            SEL_CHANGE_THRESHOLD,
            &[Token::Uint(2)],
        );
        assert_eq!(out.len(), 4 + 32);
        assert_eq!(&out.as_slice()[..4], &SEL_CHANGE_THRESHOLD);
        assert_eq!(out.as_slice()[35], 2);
    }

    #[test]
    fn encodes_dynamic_bytes_with_offset() {
        let out = encode_call(
            SEL_MULTI_SEND,
            &[Token::Bytes(vec![0xab; 5])],
        );
        // selector + offset word + length word + one padded data word
        assert_eq!(out.len(), 4 + 32 + 32 + 32);
        // offset points past the single head word
        assert_eq!(out.as_slice()[35], 32);
        // length of the payload
        assert_eq!(out.as_slice()[67], 5);
        assert_eq!(&out.as_slice()[68..73], &[0xab; 5]);
        assert_eq!(&out.as_slice()[73..100], &[0u8; 27]);
    }

    #[test]
    fn exec_transaction_layout() {
        let tx = crate::SafeTransaction::new(
            SafeTransactionParams::call(Address([0x11; 20]), 7, Bytes(vec![0x01, 0x02]))
                .with_nonce(0),
        );
        let out = exec_transaction_calldata(&tx);
        assert_eq!(&out.as_slice()[..4], &SEL_EXEC_TRANSACTION);
        // ten head words follow the selector
        assert!(out.len() >= 4 + 10 * 32);
    }
}
