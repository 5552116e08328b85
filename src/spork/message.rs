//! The spork wire message
//!
//! A spork message is a passive, signed record of one configuration value.
//! Its identity digest (used for dedup and inventory addressing) covers only
//! the core fields, so two differently-signed copies of the same update are
//! one inventory item.

use serde::{Deserialize, Serialize};

use super::SporkId;
use crate::crypto::{hash_bytes, Hash, MessageSignature};

/// A signed spork update, serialized on the wire as
/// `(code, value, signed_at, signature)` in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SporkMessage {
    /// Raw wire code; may reference a spork this build does not know
    pub code: i32,
    /// Id-specific meaning: activation timestamp or raw numeric parameter
    pub value: i64,
    /// When the governance key signed this update
    pub signed_at: i64,
    /// Recoverable signature over `canonical_payload()`
    pub signature: MessageSignature,
}

impl SporkMessage {
    /// Build an unsigned message with a zeroed signature placeholder
    pub fn unsigned(code: i32, value: i64, signed_at: i64) -> Self {
        Self {
            code,
            value,
            signed_at,
            signature: MessageSignature::empty(),
        }
    }

    /// The known spork id, if any
    pub fn id(&self) -> Option<SporkId> {
        SporkId::from_code(self.code)
    }

    /// Deduplication/inventory digest over the core fields only.
    /// Deliberately excludes the signature: re-signed copies of the same
    /// update must collapse to one inventory item.
    pub fn identity(&self) -> Hash {
        let mut bytes = Vec::with_capacity(20);
        bytes.extend_from_slice(&self.code.to_le_bytes());
        bytes.extend_from_slice(&self.value.to_le_bytes());
        bytes.extend_from_slice(&self.signed_at.to_le_bytes());
        hash_bytes(&bytes)
    }

    /// The exact text the governance key signs: the three fields rendered as
    /// decimal and concatenated with no delimiter. Peers sign and verify this
    /// byte-for-byte, so a delimiter cannot be introduced without breaking
    /// signature compatibility network-wide. The concatenation is ambiguous
    /// across field boundaries for adversarially chosen digits; accepted as a
    /// wire-format constraint.
    pub fn canonical_payload(&self) -> Vec<u8> {
        format!("{}{}{}", self.code, self.value, self.signed_at).into_bytes()
    }
}
