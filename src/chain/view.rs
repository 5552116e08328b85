//! Chain index view
//!
//! Answers "which block confirms this transaction" and "how high is this
//! block" for consensus-adjacent code, and keeps the ledger of rejected
//! blocks eligible for reconsideration when governance flips the switch.

use std::collections::HashMap;

use super::Transaction;
use crate::crypto::Hash;

/// Lookup surface the masternode layer requires from the chain
pub trait ChainIndex: Send + Sync {
    /// Find a transaction and the hash of its confirming block
    fn find_transaction(&self, tx_hash: &Hash) -> Option<(Transaction, Hash)>;
    /// Height of a block by hash
    fn height_of(&self, block_hash: &Hash) -> Option<u64>;
}

/// Validation-engine hook for blocks handed back for reconsideration
pub trait BlockRevalidator: Send + Sync {
    /// Re-run validation for a previously rejected block
    fn reconsider(&self, block_hash: Hash);
}

/// In-memory chain index
#[derive(Debug, Default)]
pub struct ChainView {
    /// tx hash -> (transaction, confirming block hash)
    transactions: HashMap<Hash, (Transaction, Hash)>,
    /// block hash -> height
    heights: HashMap<Hash, u64>,
    /// block hash -> rejection timestamp
    rejected: HashMap<Hash, i64>,
}

impl ChainView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a confirmed block and its transactions
    pub fn connect_block(&mut self, block_hash: Hash, height: u64, txs: Vec<Transaction>) {
        self.heights.insert(block_hash, height);
        for tx in txs {
            self.transactions.insert(tx.hash(), (tx, block_hash));
        }
    }

    /// Record a block the validation engine rejected
    pub fn mark_rejected(&mut self, block_hash: Hash, when: i64) {
        self.rejected.insert(block_hash, when);
    }

    /// Number of blocks currently in the rejected ledger
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    /// Hand eligible rejected blocks back to the validation engine.
    ///
    /// Rejections newer than `n_blocks * 5 * 60` seconds qualify, twice the
    /// nominal block spacing per block being reset. Each eligible block is
    /// removed from the rejected ledger and passed to `reconsider`; a block
    /// that fails validation again re-enters via [`mark_rejected`].
    ///
    /// [`mark_rejected`]: ChainView::mark_rejected
    pub fn reprocess_blocks(
        &mut self,
        n_blocks: u64,
        now: i64,
        reconsider: &mut dyn FnMut(Hash),
    ) -> usize {
        let window = i64::try_from(n_blocks)
            .unwrap_or(i64::MAX)
            .saturating_mul(60 * 5);
        let eligible: Vec<Hash> = self
            .rejected
            .iter()
            .filter(|(_, rejected_at)| **rejected_at > now.saturating_sub(window))
            .map(|(hash, _)| *hash)
            .collect();

        for hash in &eligible {
            self.rejected.remove(hash);
            reconsider(*hash);
        }
        eligible.len()
    }
}

impl ChainIndex for ChainView {
    fn find_transaction(&self, tx_hash: &Hash) -> Option<(Transaction, Hash)> {
        self.transactions.get(tx_hash).cloned()
    }

    fn height_of(&self, block_hash: &Hash) -> Option<u64> {
        self.heights.get(block_hash).copied()
    }
}
