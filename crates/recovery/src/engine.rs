//! Reconstruction of the pending recovery queue from on-chain state.

use std::sync::Arc;
use tracing::{debug, info};

use safekit_gateway::{ChainClient, SafeGateway};
use safekit_types::{Address, SafeVersion};

use crate::classify::is_malicious;
use crate::creation::CreationBlockCache;
use crate::module::DelayModuleReader;
use crate::state::{RecoveryQueueItem, RecoveryState};
use crate::RecoveryError;

pub struct RecoveryQueueEngine {
    reader: Arc<dyn DelayModuleReader>,
    gateway: Arc<dyn SafeGateway>,
    chain: Arc<dyn ChainClient>,
    cache: Arc<CreationBlockCache>,
    service_url: String,
    chain_id: u64,
    safe_address: Address,
    safe_version: SafeVersion,
}

impl RecoveryQueueEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reader: Arc<dyn DelayModuleReader>,
        gateway: Arc<dyn SafeGateway>,
        chain: Arc<dyn ChainClient>,
        cache: Arc<CreationBlockCache>,
        service_url: impl Into<String>,
        chain_id: u64,
        safe_address: Address,
        safe_version: SafeVersion,
    ) -> Self {
        Self {
            reader,
            gateway,
            chain,
            cache,
            service_url: service_url.into(),
            chain_id,
            safe_address,
            safe_version,
        }
    }

    /// Produce a fresh snapshot of the module's pending queue.
    ///
    /// When `queueNonce == txNonce` nothing is pending and no log query is
    /// made at all; the common empty case costs exactly one batched read.
    pub async fn reconstruct(&self) -> Result<RecoveryState, RecoveryError> {
        let parameters = self.reader.module_parameters().await?;
        let module_address = self.reader.address();

        if parameters.queue_nonce == parameters.tx_nonce {
            debug!(module = %module_address, "recovery queue empty, skipping log query");
            return Ok(RecoveryState {
                address: module_address,
                recoverers: parameters.recoverers,
                expiry: parameters.expiry,
                delay: parameters.delay,
                tx_nonce: parameters.tx_nonce,
                queue_nonce: parameters.queue_nonce,
                queue: Vec::new(),
            });
        }

        let creation_block = self
            .cache
            .get_or_fetch(
                &self.service_url,
                self.chain_id,
                self.safe_address,
                self.gateway.as_ref(),
                self.chain.as_ref(),
            )
            .await?;

        let logs = self
            .reader
            .transaction_added_logs(
                creation_block,
                parameters.tx_nonce..parameters.queue_nonce,
            )
            .await?;

        let mut queue = Vec::with_capacity(logs.len());
        for log in logs {
            if log.removed {
                // dropped by a chain reorganization
                continue;
            }

            let timestamp_secs = self.reader.tx_created_at(log.queue_nonce).await?;
            let timestamp_ms = timestamp_secs * 1000;
            let valid_from_ms = (timestamp_secs + parameters.delay) * 1000;
            let expires_at_ms = if parameters.expiry == 0 {
                // an expiry of exactly zero means the item never expires
                None
            } else {
                Some((timestamp_secs + parameters.delay + parameters.expiry) * 1000)
            };

            let is_malicious = is_malicious(
                self.safe_address,
                self.safe_version,
                self.chain_id,
                log.to,
                log.data.as_slice(),
            );

            queue.push(RecoveryQueueItem {
                timestamp_ms,
                valid_from_ms,
                expires_at_ms,
                is_malicious,
                executor: log.sender,
                log,
            });
        }

        info!(
            module = %module_address,
            queued = queue.len(),
            "recovery queue reconstructed"
        );

        Ok(RecoveryState {
            address: module_address,
            recoverers: parameters.recoverers,
            expiry: parameters.expiry,
            delay: parameters.delay,
            tx_nonce: parameters.tx_nonce,
            queue_nonce: parameters.queue_nonce,
            queue,
        })
    }
}
