//! OBOL (OBL) Blockchain Core Library
//!
//! A masternode cryptocurrency whose consensus-adjacent parameters are
//! governed by sporks: signed, network-propagated configuration values
//! controlled by a single compiled-in governance key.
//!
//! OBL is the short form used in addresses, logos, and protocol identifiers.

pub mod crypto;
pub mod chain;
pub mod spork;
pub mod masternode;
pub mod storage;
pub mod p2p;
pub mod node;

/// Protocol constants - HARD-CODED, NEVER CONFIGURABLE
pub mod constants {
    /// Base units per OBL (8 decimal places)
    pub const COIN: u64 = 100_000_000;

    /// Number of decimal places
    pub const DECIMAL_PLACES: u8 = 8;

    /// Chain name (short form for addresses/logos)
    pub const CHAIN_NAME: &str = "OBL";

    /// Full chain name
    pub const CHAIN_FULL_NAME: &str = "OBOL";

    /// Prefix hashed into every signed text message so a message signature
    /// can never be replayed as a transaction or block signature.
    pub const MESSAGE_MAGIC: &[u8] = b"OBOL Signed Message:\n";

    /// Compressed SEC1 public key of the spork governance signer.
    /// Compiled into every node; the matching secret exists only on the
    /// governance operator's machine.
    pub const GOVERNANCE_PUBKEY: &str =
        "02c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5";

    /// Version byte prefixing a Base58Check-encoded governance secret.
    pub const SECRET_KEY_VERSION: u8 = 0x9e;
}
