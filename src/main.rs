//! OBOL (OBL) Masternode Node
//!
//! Main entry point for running an OBL node.
//! OBL is the short form used in addresses and logos.

use obl_core::chain::{BlockRevalidator, ChainView};
use obl_core::constants::GOVERNANCE_PUBKEY;
use obl_core::crypto::{Hash, PublicKey};
use obl_core::node::SporkHandler;
use obl_core::p2p::{PeerManager, RelayQueue};
use obl_core::spork::{SporkId, SporkRegistry};
use obl_core::storage::NodeDb;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Stand-in until the validation engine is attached: requeued blocks are
/// surfaced to the operator instead of revalidated.
struct LogRevalidator;

impl BlockRevalidator for LogRevalidator {
    fn reconsider(&self, block_hash: Hash) {
        warn!(block = %block_hash, "block requeued but no validation engine attached");
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║                 OBOL (OBL) MASTERNODE NODE               ║");
    println!("║          Spork-governed · Decentralized · Signed         ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();

    let governance_pubkey = PublicKey::from_hex(GOVERNANCE_PUBKEY)?;

    let db = Arc::new(NodeDb::open("obl-data")?);
    let relay = Arc::new(RelayQueue::new());
    let registry = Arc::new(SporkRegistry::new(
        governance_pubkey,
        db.clone(),
        relay.clone(),
    ));

    // Restore spork values from the previous session
    registry.bootstrap();

    // Operators holding the governance secret can enable spork signing
    if let Ok(secret) = std::env::var("OBL_SPORK_KEY") {
        match registry.set_signing_key(&secret) {
            Ok(()) => info!("spork signing enabled"),
            Err(e) => error!(error = %e, "spork signing NOT enabled"),
        }
    }

    let peers = Arc::new(Mutex::new(PeerManager::new()));
    let chain = Arc::new(Mutex::new(ChainView::new()));
    let handler = Arc::new(SporkHandler::new(
        registry.clone(),
        peers.clone(),
        chain,
        Arc::new(LogRevalidator),
    ));

    info!(
        payment_enforcement = registry.is_active(SporkId::MasternodePaymentEnforcement, unix_now()),
        "spork state ready"
    );

    // Maintenance ticker: fixed cadence, correctness does not depend on it
    let ticker_handler = handler.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            interval.tick().await;
            ticker_handler.maintenance_tick(unix_now());
        }
    });

    // P2P listener loop
    let listener = TcpListener::bind("0.0.0.0:8335").await?;
    info!("node started on port 8335, press Ctrl+C to stop");

    tokio::select! {
        _ = async {
            loop {
                match listener.accept().await {
                    Ok((_socket, addr)) => {
                        if peers.lock().unwrap().is_banned(&addr) {
                            warn!(peer = %addr, "banned peer rejected");
                            continue;
                        }
                        peers.lock().unwrap().peer_connected(addr);
                        info!(peer = %addr, "peer connected");
                    }
                    Err(e) => {
                        warn!(error = %e, "connection error");
                    }
                }
            }
        } => {},
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received, stopping node");
        }
    }

    Ok(())
}
