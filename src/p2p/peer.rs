//! Peer management
//!
//! Tracks peer state and misbehavior. A forged spork signature is worth the
//! full ban threshold on its own.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Misbehavior score at which a peer is banned
pub const BAN_THRESHOLD: u32 = 100;

/// Peer connection state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerState {
    /// Not yet connected
    Disconnected,
    /// Fully connected and handshake complete
    Connected,
    /// Banned due to misbehavior
    Banned,
}

/// Information about a peer
#[derive(Debug, Clone)]
pub struct PeerInfo {
    /// Peer's network address
    pub addr: SocketAddr,
    /// Current connection state
    pub state: PeerState,
    /// Last seen timestamp
    pub last_seen: Instant,
    /// Misbehavior score (BAN_THRESHOLD = ban)
    pub misbehavior_score: u32,
}

impl PeerInfo {
    /// Create new peer info
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            state: PeerState::Disconnected,
            last_seen: Instant::now(),
            misbehavior_score: 0,
        }
    }

    /// Update last seen time
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Add misbehavior points
    pub fn add_misbehavior(&mut self, points: u32) {
        self.misbehavior_score = self.misbehavior_score.saturating_add(points);
        if self.misbehavior_score >= BAN_THRESHOLD {
            self.state = PeerState::Banned;
        }
    }

    /// Check if peer should be banned
    pub fn should_ban(&self) -> bool {
        self.misbehavior_score >= BAN_THRESHOLD
    }

    /// Check if connection has timed out
    pub fn is_stale(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Peer manager
#[derive(Debug, Default)]
pub struct PeerManager {
    /// Known peers
    peers: HashMap<SocketAddr, PeerInfo>,
    /// Connected peer addresses
    connected: HashSet<SocketAddr>,
}

impl PeerManager {
    /// Create a new peer manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark peer as connected, registering it if unknown
    pub fn peer_connected(&mut self, addr: SocketAddr) {
        let peer = self.peers.entry(addr).or_insert_with(|| PeerInfo::new(addr));
        if peer.state == PeerState::Banned {
            return;
        }
        peer.state = PeerState::Connected;
        peer.touch();
        self.connected.insert(addr);
    }

    /// Mark peer as disconnected
    pub fn peer_disconnected(&mut self, addr: &SocketAddr) {
        if let Some(peer) = self.peers.get_mut(addr) {
            if peer.state != PeerState::Banned {
                peer.state = PeerState::Disconnected;
            }
        }
        self.connected.remove(addr);
    }

    /// Report misbehavior; bans and drops the peer past the threshold
    pub fn report_misbehavior(&mut self, addr: &SocketAddr, points: u32) {
        let peer = self.peers.entry(*addr).or_insert_with(|| PeerInfo::new(*addr));
        peer.add_misbehavior(points);
        if peer.should_ban() {
            tracing::warn!(peer = %addr, score = peer.misbehavior_score, "peer banned");
            self.connected.remove(addr);
        }
    }

    /// Whether a peer is banned
    pub fn is_banned(&self, addr: &SocketAddr) -> bool {
        self.peers
            .get(addr)
            .map(|p| p.state == PeerState::Banned)
            .unwrap_or(false)
    }

    /// Get number of connected peers
    pub fn connected_count(&self) -> usize {
        self.connected.len()
    }

    /// Remove stale disconnected peers
    pub fn remove_stale_peers(&mut self, timeout: Duration) {
        let stale: Vec<SocketAddr> = self
            .peers
            .iter()
            .filter(|(_, p)| p.state == PeerState::Disconnected && p.is_stale(timeout))
            .map(|(addr, _)| *addr)
            .collect();

        for addr in stale {
            self.peers.remove(&addr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{}", port).parse().unwrap()
    }

    #[test]
    fn test_peer_connection() {
        let mut pm = PeerManager::new();
        let addr = make_addr(8000);

        pm.peer_connected(addr);
        assert_eq!(pm.connected_count(), 1);

        pm.peer_disconnected(&addr);
        assert_eq!(pm.connected_count(), 0);
    }

    #[test]
    fn test_misbehavior_accumulates_to_ban() {
        let mut pm = PeerManager::new();
        let addr = make_addr(8000);

        pm.peer_connected(addr);
        pm.report_misbehavior(&addr, 50);
        assert!(!pm.is_banned(&addr));
        assert_eq!(pm.connected_count(), 1);

        pm.report_misbehavior(&addr, 60);
        assert!(pm.is_banned(&addr));
        assert_eq!(pm.connected_count(), 0);
    }

    #[test]
    fn test_banned_peer_cannot_reconnect() {
        let mut pm = PeerManager::new();
        let addr = make_addr(8000);

        pm.report_misbehavior(&addr, BAN_THRESHOLD);
        pm.peer_connected(addr);
        assert_eq!(pm.connected_count(), 0);
        assert!(pm.is_banned(&addr));
    }
}
