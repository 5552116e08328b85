//! Outbound inventory relay queue
//!
//! The registry enqueues identity digests here as a non-blocking side
//! effect; the connection loop drains the queue into `Inv` messages for
//! every connected peer.

use std::sync::Mutex;

use crate::crypto::Hash;
use crate::spork::SporkRelay;

use super::{InvItem, InvType, Message};

/// Pending spork inventory announcements
#[derive(Debug, Default)]
pub struct RelayQueue {
    pending: Mutex<Vec<Hash>>,
}

impl RelayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain all pending announcements into one `Inv` message, if any
    pub fn drain(&self) -> Option<Message> {
        let digests: Vec<Hash> = std::mem::take(&mut *self.pending.lock().unwrap());
        if digests.is_empty() {
            return None;
        }
        let items = digests
            .into_iter()
            .map(|hash| InvItem {
                inv_type: InvType::Spork,
                hash,
            })
            .collect();
        Some(Message::Inv(items))
    }
}

impl SporkRelay for RelayQueue {
    fn announce(&self, digest: Hash) {
        self.pending.lock().unwrap().push(digest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash_bytes;

    #[test]
    fn test_announce_then_drain() {
        let queue = RelayQueue::new();
        assert!(queue.drain().is_none());

        queue.announce(hash_bytes(b"a"));
        queue.announce(hash_bytes(b"b"));

        match queue.drain().unwrap() {
            Message::Inv(items) => {
                assert_eq!(items.len(), 2);
                assert!(items.iter().all(|i| i.inv_type == InvType::Spork));
            }
            _ => panic!("expected inv"),
        }

        // Queue is empty after draining
        assert!(queue.drain().is_none());
    }
}
