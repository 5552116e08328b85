//! Height-indexed masternode collateral tiers
//!
//! The required collateral amount is itself governed: each tier's height
//! threshold is a spork value, so the governance key can move the schedule
//! without a release. Tiers are scanned in introduction order and the first
//! threshold covering the height wins; a later tier configured below an
//! earlier one will shadow it, so threshold ordering is an operator
//! responsibility.

use std::sync::Arc;

use crate::chain::{ChainIndex, OutPoint};
use crate::constants::COIN;
use crate::crypto::PublicKey;
use crate::spork::{SporkId, SporkRegistry};

use super::signer::derive_collateral_script;

/// Collateral required when no tier threshold covers the height
pub const BASE_COLLATERAL: u64 = 7_500 * COIN;

/// Tier schedule in scan order: threshold spork, required amount
pub const COLLATERAL_TIERS: [(SporkId, u64); 11] = [
    (SporkId::Collateral01, 10_000 * COIN),
    (SporkId::Collateral02, 15_000 * COIN),
    (SporkId::Collateral03, 20_000 * COIN),
    (SporkId::Collateral04, 30_000 * COIN),
    (SporkId::Collateral05, 40_000 * COIN),
    (SporkId::Collateral06, 50_000 * COIN),
    (SporkId::Collateral07, 60_000 * COIN),
    (SporkId::Collateral08, 70_000 * COIN),
    (SporkId::Collateral09, 80_000 * COIN),
    (SporkId::Collateral10, 90_000 * COIN),
    (SporkId::Collateral11, 100_000 * COIN),
];

/// Resolves the collateral amount for a block height and validates that a
/// referenced output actually pays it to the claimed key.
pub struct CollateralResolver {
    sporks: Arc<SporkRegistry>,
}

impl CollateralResolver {
    pub fn new(sporks: Arc<SporkRegistry>) -> Self {
        Self { sporks }
    }

    /// The collateral amount required for an output confirmed at `height`.
    ///
    /// First tier whose threshold spork covers the height wins; negative
    /// threshold values never match.
    pub fn tier_for_height(&self, height: u64) -> u64 {
        for (id, amount) in COLLATERAL_TIERS {
            let threshold = self.sporks.value_of(id);
            if threshold >= 0 && height <= threshold as u64 {
                return amount;
            }
        }
        BASE_COLLATERAL
    }

    /// Whether an amount matches any tier in the schedule
    pub fn is_collateral_amount(amount: u64) -> bool {
        COLLATERAL_TIERS.iter().any(|(_, tier)| *tier == amount)
    }

    /// Check that `outpoint` funds a collateral for `claimed` at the tier of
    /// its confirming height.
    ///
    /// A transaction that cannot be located is "not associated", a negative
    /// result rather than an error: dangling references are a normal outcome
    /// of validating untrusted masternode announcements. A block whose height
    /// is unknown falls back to the base tier, matching the unsynced-index
    /// case.
    pub fn verify_collateral(
        &self,
        chain: &dyn ChainIndex,
        outpoint: &OutPoint,
        claimed: &PublicKey,
    ) -> bool {
        let expected_script = derive_collateral_script(claimed);

        let Some((tx, block_hash)) = chain.find_transaction(&outpoint.tx_hash) else {
            return false;
        };

        let required = match chain.height_of(&block_hash) {
            Some(height) => self.tier_for_height(height),
            None => BASE_COLLATERAL,
        };

        tx.outputs
            .iter()
            .any(|out| out.amount == required && out.pubkey_hash == expected_script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainView, Transaction, TxOutput};
    use crate::crypto::{hash_bytes, Hash, PrivateKey};
    use crate::masternode::signer;
    use crate::spork::{SporkMessage, SporkRelay, SporkStore};

    struct NullStore;
    impl SporkStore for NullStore {
        fn read(&self, _id: SporkId) -> Option<SporkMessage> {
            None
        }
        fn write(&self, _id: SporkId, _msg: &SporkMessage) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct NullRelay;
    impl SporkRelay for NullRelay {
        fn announce(&self, _digest: Hash) {}
    }

    fn governed_registry() -> (PrivateKey, Arc<SporkRegistry>) {
        let key = PrivateKey::generate();
        let registry = Arc::new(SporkRegistry::new(
            key.public_key(),
            Arc::new(NullStore),
            Arc::new(NullRelay),
        ));
        (key, registry)
    }

    fn set_spork(key: &PrivateKey, registry: &SporkRegistry, id: SporkId, value: i64, at: i64) {
        let mut msg = SporkMessage::unsigned(id.code(), value, at);
        msg.signature = signer::sign_message(key, &msg.canonical_payload()).unwrap();
        assert_eq!(
            registry.ingest(&msg),
            crate::spork::IngestOutcome::Accepted
        );
    }

    #[test]
    fn test_default_thresholds_select_first_tier() {
        let (_, registry) = governed_registry();
        let resolver = CollateralResolver::new(registry);

        // Every tier defaults to the open sentinel, so tier 1 covers all
        assert_eq!(resolver.tier_for_height(0), 10_000 * COIN);
        assert_eq!(resolver.tier_for_height(5_000_000), 10_000 * COIN);
    }

    #[test]
    fn test_tier_scan_order_fixture() {
        let (key, registry) = governed_registry();

        // Tier 1 covers heights up to 500, tier 2 up to 1000; tiers beyond
        // keep their open-sentinel defaults.
        set_spork(&key, &registry, SporkId::Collateral01, 500, 100);
        set_spork(&key, &registry, SporkId::Collateral02, 1000, 100);
        let resolver = CollateralResolver::new(registry);

        assert_eq!(resolver.tier_for_height(400), 10_000 * COIN);
        assert_eq!(resolver.tier_for_height(500), 10_000 * COIN);
        assert_eq!(resolver.tier_for_height(700), 15_000 * COIN);
        // Past both configured thresholds, tier 3's default sentinel covers it
        assert_eq!(resolver.tier_for_height(1_100), 20_000 * COIN);
    }

    #[test]
    fn test_all_tiers_exhausted_falls_back_to_base() {
        let (key, registry) = governed_registry();
        for (id, _) in COLLATERAL_TIERS {
            set_spork(&key, &registry, id, 100, 50);
        }
        let resolver = CollateralResolver::new(registry);

        assert_eq!(resolver.tier_for_height(101), BASE_COLLATERAL);
        assert_eq!(resolver.tier_for_height(100), 10_000 * COIN);
    }

    #[test]
    fn test_is_collateral_amount() {
        assert!(CollateralResolver::is_collateral_amount(10_000 * COIN));
        assert!(CollateralResolver::is_collateral_amount(100_000 * COIN));
        assert!(!CollateralResolver::is_collateral_amount(BASE_COLLATERAL));
        assert!(!CollateralResolver::is_collateral_amount(10_001 * COIN));
    }

    #[test]
    fn test_verify_collateral() {
        let (_, registry) = governed_registry();
        let resolver = CollateralResolver::new(registry);
        let owner = PrivateKey::generate().public_key();

        // Default tier 1 requirement is 10,000 OBL
        let tx = Transaction::new(
            vec![],
            vec![TxOutput {
                amount: 10_000 * COIN,
                pubkey_hash: derive_collateral_script(&owner),
            }],
        );
        let outpoint = OutPoint {
            tx_hash: tx.hash(),
            index: 0,
        };

        let mut chain = ChainView::new();
        chain.connect_block(hash_bytes(b"block"), 10, vec![tx]);

        assert!(resolver.verify_collateral(&chain, &outpoint, &owner));

        // Wrong key: output pays someone else
        let stranger = PrivateKey::generate().public_key();
        assert!(!resolver.verify_collateral(&chain, &outpoint, &stranger));

        // Unknown transaction: not associated, not an error
        let dangling = OutPoint {
            tx_hash: hash_bytes(b"missing"),
            index: 0,
        };
        assert!(!resolver.verify_collateral(&chain, &dangling, &owner));
    }

    #[test]
    fn test_verify_collateral_wrong_amount() {
        let (_, registry) = governed_registry();
        let resolver = CollateralResolver::new(registry);
        let owner = PrivateKey::generate().public_key();

        let tx = Transaction::new(
            vec![],
            vec![TxOutput {
                amount: 9_999 * COIN,
                pubkey_hash: derive_collateral_script(&owner),
            }],
        );
        let outpoint = OutPoint {
            tx_hash: tx.hash(),
            index: 0,
        };

        let mut chain = ChainView::new();
        chain.connect_block(hash_bytes(b"block"), 10, vec![tx]);

        assert!(!resolver.verify_collateral(&chain, &outpoint, &owner));
    }
}
