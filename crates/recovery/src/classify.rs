//! Maliciousness classification of queued recovery calls.
//!
//! A queued call is benign only when every call it performs targets the
//! protected account itself: a direct call to the account, or a batch
//! through a canonical multiSend deployment whose every sub-call targets
//! the account. Anything else can move funds elsewhere and is flagged.

use safekit_multisend::{decode, is_canonical_multisend, is_multisend_calldata};
use safekit_types::{Address, SafeVersion};

pub fn is_malicious(
    safe_address: Address,
    safe_version: SafeVersion,
    chain_id: u64,
    to: Address,
    data: &[u8],
) -> bool {
    if !is_multisend_calldata(data) {
        return to != safe_address;
    }

    // A batch is only trustworthy through a canonical deployment; for
    // chains without the exact version's deployment the older canonical
    // addresses are accepted too.
    if !is_canonical_multisend(&to, safe_version, chain_id) {
        return true;
    }

    match decode(data) {
        Ok(calls) => calls.iter().any(|call| call.to != safe_address),
        Err(_) => true,
    }
}
