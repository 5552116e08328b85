//! Node orchestration - message dispatch and periodic maintenance
//!
//! Thin glue between the wire, the spork registry, and peer scoring. All
//! protocol decisions live in the registry; this layer only routes and
//! penalizes.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use crate::chain::{BlockRevalidator, ChainView};
use crate::p2p::{InvType, Message, PeerManager};
use crate::spork::{IngestOutcome, RejectReason, SporkId, SporkRegistry};

/// Penalty for a spork message whose signature does not recover to the
/// governance key.
pub const BAD_SPORK_PENALTY: u32 = 100;

/// Routes spork traffic between peers and the registry
pub struct SporkHandler {
    registry: Arc<SporkRegistry>,
    peers: Arc<Mutex<PeerManager>>,
    chain: Arc<Mutex<ChainView>>,
    revalidator: Arc<dyn BlockRevalidator>,
}

impl SporkHandler {
    pub fn new(
        registry: Arc<SporkRegistry>,
        peers: Arc<Mutex<PeerManager>>,
        chain: Arc<Mutex<ChainView>>,
        revalidator: Arc<dyn BlockRevalidator>,
    ) -> Self {
        Self {
            registry,
            peers,
            chain,
            revalidator,
        }
    }

    /// Process one inbound message; returns the replies to send back to the
    /// originating peer.
    pub fn handle_message(&self, from: SocketAddr, msg: &Message) -> Vec<Message> {
        match msg {
            Message::Spork(spork) => {
                if let IngestOutcome::Rejected(RejectReason::BadSignature) =
                    self.registry.ingest(spork)
                {
                    self.peers
                        .lock()
                        .unwrap()
                        .report_misbehavior(&from, BAD_SPORK_PENALTY);
                }
                vec![]
            }
            Message::GetSporks => self
                .registry
                .snapshot()
                .into_iter()
                .map(Message::Spork)
                .collect(),
            Message::Inv(items) => {
                // Request spork payloads we have not validated yet
                let wanted: Vec<_> = items
                    .iter()
                    .filter(|item| {
                        item.inv_type == InvType::Spork && !self.registry.has_seen(&item.hash)
                    })
                    .cloned()
                    .collect();
                if wanted.is_empty() {
                    vec![]
                } else {
                    vec![Message::GetData(wanted)]
                }
            }
            Message::GetData(items) => items
                .iter()
                .filter(|item| item.inv_type == InvType::Spork)
                .filter_map(|item| self.registry.seen(&item.hash))
                .map(Message::Spork)
                .collect(),
            Message::Ping(nonce) => vec![Message::Pong(*nonce)],
            Message::Pong(_) => vec![],
        }
    }

    /// Periodic maintenance hook, driven by an external timer.
    ///
    /// When governance sets the reconsider-blocks spork to a positive block
    /// count, recently rejected blocks leave the rejected ledger and are
    /// handed to the validation engine for another pass.
    pub fn maintenance_tick(&self, now: i64) {
        let blocks = self.registry.value_of(SporkId::ReconsiderBlocks);
        if blocks <= 0 {
            return;
        }

        let revalidator = self.revalidator.clone();
        let count = self
            .chain
            .lock()
            .unwrap()
            .reprocess_blocks(blocks as u64, now, &mut |hash| {
                tracing::info!(block = %hash, "reconsidering rejected block");
                revalidator.reconsider(hash);
            });
        if count > 0 {
            tracing::info!(count, "requeued rejected blocks");
        }
    }
}
