//! Cryptography module - BLAKE3 hashing and recoverable ECDSA signatures

mod hash;
mod ecdsa;

pub use hash::*;
pub use ecdsa::*;
