//! Masternode module - message authentication and collateral validation

pub mod signer;
mod collateral;

pub use collateral::*;
