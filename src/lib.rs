//! Client-side coordination of a Safe account's transaction lifecycle:
//! building, signing, proposing, executing, and watching transactions, plus
//! recovery-queue handling for accounts guarded by a delay module.
//!
//! Each concern lives in its own crate; this facade re-exports them and
//! bundles the per-account collaborators behind [`Lifecycle`].

pub use safekit_config as config;
pub use safekit_dispatch as dispatch;
pub use safekit_events as events;
pub use safekit_gateway as gateway;
pub use safekit_multisend as multisend;
pub use safekit_recovery as recovery;
pub use safekit_txflow as txflow;
pub use safekit_types as types;

use std::sync::Arc;

use safekit_dispatch::{Executor, PendingTxStore};
use safekit_events::TxEventBus;
use safekit_gateway::{ChainClient, ReplacementClassifier, SafeGateway};
use safekit_txflow::{Proposer, SigningCoordinator, TxBuilder};
use safekit_types::{Address, SafeVersion};

/// The lifecycle collaborators for one Safe account on one chain, wired to
/// a shared event bus and pending store.
pub struct Lifecycle {
    builder: TxBuilder,
    signer: SigningCoordinator,
    proposer: Proposer,
    executor: Executor,
    bus: TxEventBus,
}

impl Lifecycle {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        gateway: Arc<dyn SafeGateway>,
        classifier: Arc<dyn ReplacementClassifier>,
        bus: TxEventBus,
        chain_id: u64,
        safe_address: Address,
        safe_version: SafeVersion,
    ) -> Self {
        let builder = TxBuilder::new(Arc::clone(&gateway), chain_id, safe_address, safe_version);
        let signer = SigningCoordinator::new(bus.clone(), chain_id, safe_address);
        let proposer = Proposer::new(Arc::clone(&gateway), bus.clone());
        let executor = Executor::new(
            chain,
            gateway,
            classifier,
            bus.clone(),
            PendingTxStore::new(),
            chain_id,
            safe_address,
            safe_version,
        );

        Self {
            builder,
            signer,
            proposer,
            executor,
            bus,
        }
    }

    /// Apply relay polling settings from configuration.
    pub fn with_relay_config(mut self, relay: &config::RelayConfig) -> Self {
        self.executor = self.executor.with_relay_polling(
            std::time::Duration::from_secs(relay.poll_interval_secs),
            relay.max_attempts,
        );
        self
    }

    pub fn builder(&self) -> &TxBuilder {
        &self.builder
    }

    pub fn signer(&self) -> &SigningCoordinator {
        &self.signer
    }

    pub fn proposer(&self) -> &Proposer {
        &self.proposer
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn bus(&self) -> &TxEventBus {
        &self.bus
    }
}
