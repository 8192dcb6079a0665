//! Structural owner-management transactions. Each builder produces
//! parameters for a call the Safe makes to itself; the owner linked list in
//! the contract requires the predecessor of the owner being touched.

use safekit_types::{
    encode_call, Address, SafeTransactionParams, Token, SEL_ADD_OWNER_WITH_THRESHOLD,
    SEL_CHANGE_THRESHOLD, SEL_REMOVE_OWNER, SEL_SWAP_OWNER,
};

use crate::builder::{TxBuilder, TxFlowError};

/// Predecessor of `owner` in the contract's singly-linked owner list.
fn prev_owner(owners: &[Address], owner: Address) -> Result<Address, TxFlowError> {
    let index = owners
        .iter()
        .position(|o| *o == owner)
        .ok_or(TxFlowError::OwnerNotFound(owner))?;
    Ok(if index == 0 {
        Address::SENTINEL
    } else {
        owners[index - 1]
    })
}

impl TxBuilder {
    pub fn add_owner_params(&self, owner: Address, threshold: u64) -> SafeTransactionParams {
        let data = encode_call(
            SEL_ADD_OWNER_WITH_THRESHOLD,
            &[Token::Address(owner), Token::Uint(threshold as u128)],
        );
        SafeTransactionParams::call(self.safe_address(), 0, data)
    }

    pub fn remove_owner_params(
        &self,
        owners: &[Address],
        owner: Address,
        threshold: u64,
    ) -> Result<SafeTransactionParams, TxFlowError> {
        let prev = prev_owner(owners, owner)?;
        let data = encode_call(
            SEL_REMOVE_OWNER,
            &[
                Token::Address(prev),
                Token::Address(owner),
                Token::Uint(threshold as u128),
            ],
        );
        Ok(SafeTransactionParams::call(self.safe_address(), 0, data))
    }

    pub fn swap_owner_params(
        &self,
        owners: &[Address],
        old_owner: Address,
        new_owner: Address,
    ) -> Result<SafeTransactionParams, TxFlowError> {
        let prev = prev_owner(owners, old_owner)?;
        let data = encode_call(
            SEL_SWAP_OWNER,
            &[
                Token::Address(prev),
                Token::Address(old_owner),
                Token::Address(new_owner),
            ],
        );
        Ok(SafeTransactionParams::call(self.safe_address(), 0, data))
    }

    pub fn change_threshold_params(&self, threshold: u64) -> SafeTransactionParams {
        let data = encode_call(SEL_CHANGE_THRESHOLD, &[Token::Uint(threshold as u128)]);
        SafeTransactionParams::call(self.safe_address(), 0, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prev_owner_of_head_is_sentinel() {
        let owners = vec![Address([1; 20]), Address([2; 20]), Address([3; 20])];
        assert_eq!(prev_owner(&owners, owners[0]).unwrap(), Address::SENTINEL);
        assert_eq!(prev_owner(&owners, owners[2]).unwrap(), owners[1]);
    }

    #[test]
    fn prev_owner_rejects_stranger() {
        let owners = vec![Address([1; 20])];
        assert!(matches!(
            prev_owner(&owners, Address([9; 20])),
            Err(TxFlowError::OwnerNotFound(_))
        ));
    }
}
