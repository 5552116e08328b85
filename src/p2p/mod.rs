//! P2P networking module - peer tracking, wire messages, spork relay

mod peer;
mod protocol;
mod relay;

pub use peer::*;
pub use protocol::*;
pub use relay::*;
