//! Encode/decode for the packed multiSend batch layout.
//!
//! The packed payload is, per sub-call: 1-byte operation, 20-byte target,
//! 32-byte value, 32-byte data length, then that many data bytes. Encode and
//! decode are pure inverses over this single layout description.

use safekit_types::{
    encode_call, Address, Bytes, Operation, Token, SEL_MULTI_SEND,
};
use thiserror::Error;

/// One sub-call of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTransaction {
    pub to: Address,
    pub value: u128,
    pub data: Bytes,
    pub operation: Operation,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MultiSendError {
    #[error("calldata does not carry the multiSend selector")]
    NotMultiSend,

    #[error("malformed multiSend payload: truncated at byte {offset}")]
    Truncated { offset: usize },

    #[error("unknown operation byte {0}")]
    UnknownOperation(u8),

    #[error("sub-call value exceeds 128 bits")]
    ValueOverflow,
}

/// `true` when the calldata invokes `multiSend(bytes)`. Callers must check
/// this before [`decode`]; anything else is rejected there.
pub fn is_multisend_calldata(calldata: &[u8]) -> bool {
    calldata.len() >= 4 && calldata[..4] == SEL_MULTI_SEND
}

/// Tightly pack a batch into the multiSend payload.
pub fn encode(batch: &[MetaTransaction]) -> Bytes {
    let mut out = Vec::new();
    for call in batch {
        out.push(call.operation as u8);
        out.extend_from_slice(call.to.as_bytes());
        let mut value = [0u8; 32];
        value[16..].copy_from_slice(&call.value.to_be_bytes());
        out.extend_from_slice(&value);
        let mut len = [0u8; 32];
        len[16..].copy_from_slice(&(call.data.len() as u128).to_be_bytes());
        out.extend_from_slice(&len);
        out.extend_from_slice(call.data.as_slice());
    }
    Bytes(out)
}

/// Full `multiSend(bytes)` calldata for a batch.
pub fn multisend_calldata(batch: &[MetaTransaction]) -> Bytes {
    encode_call(SEL_MULTI_SEND, &[Token::Bytes(encode(batch).0)])
}

/// Decode `multiSend(bytes)` calldata into its ordered sub-calls.
pub fn decode(calldata: &[u8]) -> Result<Vec<MetaTransaction>, MultiSendError> {
    if !is_multisend_calldata(calldata) {
        return Err(MultiSendError::NotMultiSend);
    }
    let body = &calldata[4..];
    // bytes argument: offset word then length word at that offset
    let offset = read_usize_word(body, 0)?;
    let payload_len = read_usize_word(body, offset)?;
    let start = offset + 32;
    let end = start
        .checked_add(payload_len)
        .filter(|end| *end <= body.len())
        .ok_or(MultiSendError::Truncated { offset: body.len() })?;
    unpack(&body[start..end])
}

/// Walk the packed payload, advancing the cursor exactly the declared
/// lengths; any shortfall is malformed input, not a partial result.
pub fn unpack(payload: &[u8]) -> Result<Vec<MetaTransaction>, MultiSendError> {
    let mut calls = Vec::new();
    let mut cursor = 0usize;

    while cursor < payload.len() {
        let take = |cursor: usize, n: usize| -> Result<&[u8], MultiSendError> {
            cursor
                .checked_add(n)
                .and_then(|end| payload.get(cursor..end))
                .ok_or(MultiSendError::Truncated { offset: cursor })
        };

        let op_byte = take(cursor, 1)?[0];
        let operation =
            Operation::from_byte(op_byte).ok_or(MultiSendError::UnknownOperation(op_byte))?;
        cursor += 1;

        let to = Address::from_slice(take(cursor, 20)?).expect("slice is 20 bytes");
        cursor += 20;

        let value = read_u128_word(take(cursor, 32)?)?;
        cursor += 32;

        let data_len = read_length_word(take(cursor, 32)?)?;
        cursor += 32;

        let data = Bytes::from(take(cursor, data_len)?);
        cursor += data_len;

        calls.push(MetaTransaction {
            to,
            value,
            data,
            operation,
        });
    }

    Ok(calls)
}

fn read_u128_word(word: &[u8]) -> Result<u128, MultiSendError> {
    if word[..16].iter().any(|b| *b != 0) {
        return Err(MultiSendError::ValueOverflow);
    }
    let mut out = [0u8; 16];
    out.copy_from_slice(&word[16..32]);
    Ok(u128::from_be_bytes(out))
}

/// A length or offset word, rejected rather than truncated when it exceeds
/// the address space.
fn read_length_word(word: &[u8]) -> Result<usize, MultiSendError> {
    usize::try_from(read_u128_word(word)?).map_err(|_| MultiSendError::ValueOverflow)
}

fn read_usize_word(buf: &[u8], at: usize) -> Result<usize, MultiSendError> {
    let word = buf
        .get(at..at + 32)
        .ok_or(MultiSendError::Truncated { offset: at })?;
    read_length_word(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(to_byte: u8, value: u128, data: Vec<u8>) -> MetaTransaction {
        MetaTransaction {
            to: Address([to_byte; 20]),
            value,
            data: Bytes(data),
            operation: Operation::Call,
        }
    }

    #[test]
    fn roundtrip_nonempty_batches() {
        let batches = vec![
            vec![call(0xaa, 0, vec![])],
            vec![call(0xaa, 1, vec![1, 2, 3]), call(0xbb, u128::MAX, vec![0; 64])],
            vec![
                call(0x01, 7, vec![0xff; 33]),
                MetaTransaction {
                    to: Address([0x02; 20]),
                    value: 0,
                    data: Bytes(vec![9]),
                    operation: Operation::DelegateCall,
                },
                call(0x03, 3, vec![]),
            ],
        ];

        for batch in batches {
            let calldata = multisend_calldata(&batch);
            assert!(is_multisend_calldata(calldata.as_slice()));
            assert_eq!(decode(calldata.as_slice()).unwrap(), batch);
        }
    }

    #[test]
    fn unpack_is_inverse_of_encode() {
        let batch = vec![call(0xaa, 12, vec![1, 2]), call(0xbb, 0, vec![])];
        assert_eq!(unpack(encode(&batch).as_slice()).unwrap(), batch);
    }

    #[test]
    fn rejects_foreign_selector() {
        let calldata = [0xde, 0xad, 0xbe, 0xef, 0, 0];
        assert!(!is_multisend_calldata(&calldata));
        assert_eq!(decode(&calldata).unwrap_err(), MultiSendError::NotMultiSend);
    }

    #[test]
    fn rejects_truncated_payload() {
        let batch = vec![call(0xaa, 1, vec![1, 2, 3, 4])];
        let mut packed = encode(&batch).0;
        packed.truncate(packed.len() - 2);
        assert!(matches!(
            unpack(&packed).unwrap_err(),
            MultiSendError::Truncated { .. }
        ));
    }

    #[test]
    fn rejects_declared_length_past_end() {
        let batch = vec![call(0xaa, 1, vec![7; 8])];
        let mut packed = encode(&batch).0;
        // bump the declared data length beyond the buffer
        let len_pos = 1 + 20 + 32 + 31;
        packed[len_pos] = 0xff;
        assert!(matches!(
            unpack(&packed).unwrap_err(),
            MultiSendError::Truncated { .. }
        ));
    }

    #[test]
    fn rejects_length_word_wider_than_usize() {
        let batch = vec![call(0xaa, 1, vec![7; 4])];
        let mut packed = encode(&batch).0;
        // declare a data length of 2^64 + 4; it must be rejected, not
        // silently truncated to 4
        let len_word = 1 + 20 + 32;
        packed[len_word + 23] = 1;
        assert_eq!(unpack(&packed).unwrap_err(), MultiSendError::ValueOverflow);
    }

    #[test]
    fn rejects_unknown_operation() {
        let batch = vec![call(0xaa, 0, vec![])];
        let mut packed = encode(&batch).0;
        packed[0] = 9;
        assert_eq!(
            unpack(&packed).unwrap_err(),
            MultiSendError::UnknownOperation(9)
        );
    }
}
