//! Transaction records
//!
//! Structural form only: outputs carry an amount and a pubkey-hash lock.
//! Script-level validation is the validation engine's concern, not this
//! crate's.

use serde::{Deserialize, Serialize};

use crate::crypto::{hash_bytes, Hash};

/// Reference to a specific transaction output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// Hash of the transaction containing the output
    pub tx_hash: Hash,
    /// Index of the output in that transaction
    pub index: u32,
}

/// A transaction output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutput {
    /// Amount in base units
    pub amount: u64,
    /// Public key hash of the recipient
    pub pubkey_hash: Hash,
}

/// A transaction as the masternode layer sees it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction version
    pub version: u32,
    /// Spent outpoints
    pub inputs: Vec<OutPoint>,
    /// Created outputs
    pub outputs: Vec<TxOutput>,
    /// Lock time (block height or timestamp)
    pub lock_time: u32,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(inputs: Vec<OutPoint>, outputs: Vec<TxOutput>) -> Self {
        Self {
            version: 1,
            inputs,
            outputs,
            lock_time: 0,
        }
    }

    /// Calculate transaction hash
    pub fn hash(&self) -> Hash {
        let mut bytes = Vec::new();

        bytes.extend_from_slice(&self.version.to_le_bytes());

        bytes.extend_from_slice(&(self.inputs.len() as u32).to_le_bytes());
        for input in &self.inputs {
            bytes.extend_from_slice(&input.tx_hash.0);
            bytes.extend_from_slice(&input.index.to_le_bytes());
        }

        bytes.extend_from_slice(&(self.outputs.len() as u32).to_le_bytes());
        for output in &self.outputs {
            bytes.extend_from_slice(&output.amount.to_le_bytes());
            bytes.extend_from_slice(&output.pubkey_hash.0);
        }

        bytes.extend_from_slice(&self.lock_time.to_le_bytes());

        hash_bytes(&bytes)
    }

    /// Calculate total output value
    pub fn total_output_value(&self) -> u64 {
        self.outputs.iter().map(|o| o.amount).sum()
    }
}
