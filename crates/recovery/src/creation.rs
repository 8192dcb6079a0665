//! Memoized lookup of the block an account was created in, the lower bound
//! of every recovery log query.

use std::collections::HashMap;
use std::sync::Mutex;

use safekit_gateway::{ChainClient, SafeGateway};
use safekit_types::Address;

use crate::RecoveryError;

/// Keyed by `(service_url, safe_address)` so one cache serves accounts
/// across environments. The lock is never held across a fetch: the first
/// resolved value wins and concurrent duplicate fetches are a tolerated
/// inefficiency, not a correctness issue.
#[derive(Default)]
pub struct CreationBlockCache {
    blocks: Mutex<HashMap<(String, Address), u64>>,
}

impl CreationBlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_fetch(
        &self,
        service_url: &str,
        chain_id: u64,
        safe_address: Address,
        gateway: &dyn SafeGateway,
        chain: &dyn ChainClient,
    ) -> Result<u64, RecoveryError> {
        let key = (service_url.to_string(), safe_address);
        if let Some(block) = self.blocks.lock().expect("cache lock poisoned").get(&key) {
            return Ok(*block);
        }

        let receipt = gateway.get_creation_receipt(chain_id, safe_address).await?;
        let mined = chain
            .get_transaction_receipt(receipt.transaction_hash)
            .await?
            .ok_or(RecoveryError::CreationNotMined)?;

        self.blocks
            .lock()
            .expect("cache lock poisoned")
            .insert(key, mined.block_number);
        Ok(mined.block_number)
    }

    /// Test isolation hook.
    pub fn clear(&self) {
        self.blocks.lock().expect("cache lock poisoned").clear();
    }
}
