//! P2P protocol messages
//!
//! Defines the message types for network communication. Sporks travel both
//! as direct `Spork` payloads and as inventory announcements keyed by their
//! identity digest.

use serde::{Deserialize, Serialize};

use crate::crypto::Hash;
use crate::spork::SporkMessage;

/// Protocol version
pub const PROTOCOL_VERSION: u32 = 1;

/// Network magic bytes (identifies the OBL network)
pub const NETWORK_MAGIC: [u8; 4] = [0x4F, 0x42, 0x4C, 0x4E]; // "OBLN"

/// Maximum message size (4 MB)
pub const MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

/// P2P message types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    /// Ping (liveness check)
    Ping(u64),
    /// Pong (liveness response)
    Pong(u64),
    /// Announce data by hash
    Inv(Vec<InvItem>),
    /// Request announced data
    GetData(Vec<InvItem>),
    /// One signed spork update
    Spork(SporkMessage),
    /// Request the full active spork set; answered with one Spork per entry
    GetSporks,
}

/// Inventory item type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InvType {
    Transaction,
    Block,
    Spork,
}

/// Inventory item (reference to relayed data)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvItem {
    pub inv_type: InvType,
    pub hash: Hash,
}

impl Message {
    /// Serialize message to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, String> {
        let payload =
            bincode::serialize(self).map_err(|e| format!("Serialization error: {}", e))?;

        let mut bytes = Vec::with_capacity(4 + 4 + payload.len());
        bytes.extend_from_slice(&NETWORK_MAGIC);
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&payload);

        Ok(bytes)
    }

    /// Deserialize message from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        if bytes.len() < 8 {
            return Err("Message too short".to_string());
        }

        // Check magic
        if bytes[0..4] != NETWORK_MAGIC {
            return Err("Invalid network magic".to_string());
        }

        let length = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;

        if length > MAX_MESSAGE_SIZE {
            return Err("Message too large".to_string());
        }

        if bytes.len() < 8 + length {
            return Err("Incomplete message".to_string());
        }

        bincode::deserialize(&bytes[8..8 + length])
            .map_err(|e| format!("Deserialization error: {}", e))
    }

    /// Get the command name for this message
    pub fn command(&self) -> &'static str {
        match self {
            Message::Ping(_) => "ping",
            Message::Pong(_) => "pong",
            Message::Inv(_) => "inv",
            Message::GetData(_) => "getdata",
            Message::Spork(_) => "spork",
            Message::GetSporks => "getsporks",
        }
    }
}
