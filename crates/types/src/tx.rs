use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

use crate::{Address, Bytes, TxHash};

/// Kind of call the Safe performs when executing a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Call = 0,
    DelegateCall = 1,
}

impl Operation {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Operation::Call),
            1 => Some(Operation::DelegateCall),
            _ => None,
        }
    }
}

/// Caller-supplied transaction parameters, before a nonce is assigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeTransactionParams {
    pub to: Address,
    pub value: u128,
    pub data: Bytes,
    pub operation: Operation,
    pub safe_tx_gas: u128,
    pub base_gas: u128,
    pub gas_price: u128,
    pub gas_token: Address,
    pub refund_receiver: Address,
}

impl SafeTransactionParams {
    /// A plain call with no refund parameters
    pub fn call(to: Address, value: u128, data: Bytes) -> Self {
        Self {
            to,
            value,
            data,
            operation: Operation::Call,
            safe_tx_gas: 0,
            base_gas: 0,
            gas_price: 0,
            gas_token: Address::ZERO,
            refund_receiver: Address::ZERO,
        }
    }

    pub fn with_nonce(self, nonce: u64) -> SafeTransactionData {
        let mut data = self.without_nonce();
        data.nonce = Some(nonce);
        data
    }

    /// Freeze the parameters as-is, leaving the nonce unassigned. Used when
    /// no nonce recommendation could be obtained; the backend assigns one on
    /// proposal.
    pub fn without_nonce(self) -> SafeTransactionData {
        SafeTransactionData {
            to: self.to,
            value: self.value,
            data: self.data,
            operation: self.operation,
            safe_tx_gas: self.safe_tx_gas,
            base_gas: self.base_gas,
            gas_price: self.gas_price,
            gas_token: self.gas_token,
            refund_receiver: self.refund_receiver,
            nonce: None,
        }
    }
}

/// The immutable core fields of a Safe transaction.
///
/// Once a hash has been computed over these fields they never change; only
/// the signature map on the surrounding [`SafeTransaction`] grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeTransactionData {
    pub to: Address,
    pub value: u128,
    pub data: Bytes,
    pub operation: Operation,
    pub safe_tx_gas: u128,
    pub base_gas: u128,
    pub gas_price: u128,
    pub gas_token: Address,
    pub refund_receiver: Address,
    /// `None` until a nonce has been assigned, locally or by the backend.
    pub nonce: Option<u64>,
}

impl SafeTransactionData {
    /// Deterministic digest of the core fields, domain-separated by chain
    /// and Safe address. The EIP-712 primitive itself lives in the contract
    /// layer; this digest is what the engine correlates on.
    pub fn safe_tx_hash(&self, chain_id: u64, safe_address: &Address) -> TxHash {
        let mut hasher = Sha256::new();
        hasher.update(b"SAFE_TX_V1");
        hasher.update(chain_id.to_be_bytes());
        hasher.update(safe_address.as_bytes());
        hasher.update(self.to.as_bytes());
        hasher.update(self.value.to_be_bytes());
        hasher.update((self.data.len() as u64).to_be_bytes());
        hasher.update(self.data.as_slice());
        hasher.update([self.operation as u8]);
        hasher.update(self.safe_tx_gas.to_be_bytes());
        hasher.update(self.base_gas.to_be_bytes());
        hasher.update(self.gas_price.to_be_bytes());
        hasher.update(self.gas_token.as_bytes());
        hasher.update(self.refund_receiver.as_bytes());
        // presence byte keeps an unassigned nonce distinct from nonce 0
        match self.nonce {
            Some(nonce) => {
                hasher.update([1]);
                hasher.update(nonce.to_be_bytes());
            }
            None => hasher.update([0]),
        }
        TxHash(hasher.finalize().into())
    }
}

/// A Safe transaction record: immutable core fields plus an append-only
/// signature map. Adding a signature produces a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeTransaction {
    pub data: SafeTransactionData,
    signatures: BTreeMap<Address, Bytes>,
}

impl SafeTransaction {
    pub fn new(data: SafeTransactionData) -> Self {
        Self {
            data,
            signatures: BTreeMap::new(),
        }
    }

    pub fn with_signatures(
        data: SafeTransactionData,
        signatures: BTreeMap<Address, Bytes>,
    ) -> Self {
        Self { data, signatures }
    }

    /// Returns a new record carrying the accumulated signatures plus the
    /// given one. The receiver is never mutated.
    pub fn add_signature(&self, signer: Address, signature: Bytes) -> Self {
        let mut signatures = self.signatures.clone();
        signatures.insert(signer, signature);
        Self {
            data: self.data.clone(),
            signatures,
        }
    }

    pub fn signatures(&self) -> &BTreeMap<Address, Bytes> {
        &self.signatures
    }

    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    pub fn signature_for(&self, signer: &Address) -> Option<&Bytes> {
        self.signatures.get(signer)
    }

    /// Concatenates signature bytes in ascending signer order, the layout
    /// `execTransaction` expects.
    pub fn encoded_signatures(&self) -> Bytes {
        let mut out = Vec::new();
        for sig in self.signatures.values() {
            out.extend_from_slice(sig.as_slice());
        }
        Bytes(out)
    }

    pub fn safe_tx_hash(&self, chain_id: u64, safe_address: &Address) -> TxHash {
        self.data.safe_tx_hash(chain_id, safe_address)
    }
}

/// Identity of a transaction for backend correlation: a locally generated
/// value until the backend assigns one on first successful proposal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxIdentifier {
    Local(String),
    Backend(String),
}

impl TxIdentifier {
    pub fn as_str(&self) -> &str {
        match self {
            TxIdentifier::Local(id) | TxIdentifier::Backend(id) => id,
        }
    }

    pub fn is_backend(&self) -> bool {
        matches!(self, TxIdentifier::Backend(_))
    }
}

impl fmt::Display for TxIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> SafeTransaction {
        let params = SafeTransactionParams::call(
            Address([0xaa; 20]),
            1_000_000,
            Bytes(vec![0xde, 0xad]),
        );
        SafeTransaction::new(params.with_nonce(5))
    }

    #[test]
    fn hash_is_deterministic() {
        let tx = sample_tx();
        let safe = Address([0x11; 20]);
        let h1 = tx.safe_tx_hash(1, &safe);
        let h2 = tx.safe_tx_hash(1, &safe);
        assert_eq!(h1, h2);
    }

    #[test]
    fn hash_unchanged_by_signatures() {
        let tx = sample_tx();
        let safe = Address([0x11; 20]);
        let before = tx.safe_tx_hash(1, &safe);
        let signed = tx.add_signature(Address([0x22; 20]), Bytes(vec![1, 2, 3]));
        assert_eq!(before, signed.safe_tx_hash(1, &safe));
    }

    #[test]
    fn hash_differs_per_nonce_and_chain() {
        let params = SafeTransactionParams::call(Address([0xaa; 20]), 0, Bytes::new());
        let safe = Address([0x11; 20]);
        let a = params.clone().with_nonce(1).safe_tx_hash(1, &safe);
        let b = params.clone().with_nonce(2).safe_tx_hash(1, &safe);
        let c = params.with_nonce(1).safe_tx_hash(5, &safe);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn unassigned_nonce_hashes_unlike_nonce_zero() {
        let params = SafeTransactionParams::call(Address([0xaa; 20]), 0, Bytes::new());
        let safe = Address([0x11; 20]);
        let unassigned = params.clone().without_nonce();
        assert_eq!(unassigned.nonce, None);
        assert_ne!(
            unassigned.safe_tx_hash(1, &safe),
            params.with_nonce(0).safe_tx_hash(1, &safe)
        );
    }

    #[test]
    fn add_signature_returns_new_record() {
        let tx = sample_tx();
        let signed = tx.add_signature(Address([0x22; 20]), Bytes(vec![1]));
        assert_eq!(tx.signature_count(), 0);
        assert_eq!(signed.signature_count(), 1);
    }

    #[test]
    fn encoded_signatures_sorted_by_signer() {
        let tx = sample_tx()
            .add_signature(Address([0xbb; 20]), Bytes(vec![2, 2]))
            .add_signature(Address([0x01; 20]), Bytes(vec![1, 1]));
        assert_eq!(tx.encoded_signatures().as_slice(), &[1, 1, 2, 2]);
    }
}
