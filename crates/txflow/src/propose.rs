//! Proposal submission to the backend aggregation service.

use std::sync::Arc;
use tracing::info;

use safekit_events::{TxEvent, TxEventBus};
use safekit_gateway::{proposal_request, GatewayError, SafeGateway, TransactionDetails};
use safekit_types::{Address, SafeTransaction};

pub struct ProposeArgs {
    pub chain_id: u64,
    pub safe_address: Address,
    pub sender: Address,
    pub tx: SafeTransaction,
    /// Backend id of an existing proposal; present when this submission
    /// adds a signature rather than creating a new proposal.
    pub tx_id: Option<String>,
    pub origin: Option<String>,
}

pub struct Proposer {
    gateway: Arc<dyn SafeGateway>,
    bus: TxEventBus,
}

impl Proposer {
    pub fn new(gateway: Arc<dyn SafeGateway>, bus: TxEventBus) -> Self {
        Self { gateway, bus }
    }

    /// Submit core fields + hash + sender + encoded signatures.
    ///
    /// An unsigned submission (used purely to obtain a backend-confirmed
    /// hash) emits no success event: it is not yet visible in any queue.
    pub async fn propose(&self, args: ProposeArgs) -> Result<TransactionDetails, GatewayError> {
        let safe_tx_hash = args.tx.safe_tx_hash(args.chain_id, &args.safe_address);
        let request = proposal_request(&args.tx, safe_tx_hash, args.sender, args.origin);
        let is_additional_signature = args.tx_id.is_some();

        let details = match self
            .gateway
            .propose_transaction(args.chain_id, args.safe_address, request)
            .await
        {
            Ok(details) => details,
            Err(e) => {
                if is_additional_signature {
                    self.bus.dispatch(TxEvent::SignatureProposeFailed {
                        error: e.to_string(),
                    });
                } else {
                    self.bus.dispatch(TxEvent::ProposeFailed {
                        error: e.to_string(),
                    });
                }
                return Err(e);
            }
        };

        if args.tx.signature_count() > 0 {
            if let Some(tx_id) = args.tx_id {
                info!(tx_id = %tx_id, signer = %args.sender, "signature proposed");
                self.bus.dispatch(TxEvent::SignatureProposed {
                    tx_id,
                    signer: args.sender,
                });
            } else {
                info!(tx_id = %details.tx_id, "transaction proposed");
                self.bus.dispatch(TxEvent::Proposed {
                    tx_id: details.tx_id.clone(),
                });
            }
        }

        Ok(details)
    }
}
