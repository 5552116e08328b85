//! Chain module - transaction records and the block/transaction index
//!
//! The spork and masternode layers treat the chain as a lookup service; the
//! validation engine itself lives elsewhere.

mod transaction;
mod view;

pub use transaction::*;
pub use view::*;
