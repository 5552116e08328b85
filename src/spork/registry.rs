//! The spork registry - authoritative current value per spork id
//!
//! Owns conflict resolution (newest `signed_at` wins, incumbent keeps ties),
//! the append-only log of validated messages, persistence, and local
//! authoring. Network-origin problems (unknown ids, stale copies, forged
//! signatures) never surface as errors; they resolve to an [`IngestOutcome`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use super::{SporkId, SporkMessage};
use crate::crypto::{Hash, PrivateKey, PublicKey, SignatureError};
use crate::masternode::signer;

/// Persistent one-record-per-spork storage
pub trait SporkStore: Send + Sync {
    /// Read the persisted message for a spork, if any
    fn read(&self, id: SporkId) -> Option<SporkMessage>;
    /// Overwrite the persisted message for a spork
    fn write(&self, id: SporkId, msg: &SporkMessage) -> std::io::Result<()>;
}

/// Outbound inventory announcements for accepted sporks
pub trait SporkRelay: Send + Sync {
    /// Announce an accepted message by its identity digest
    fn announce(&self, digest: Hash);
}

/// Result of feeding one network message to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Verified and now the active value for its id
    Accepted,
    /// Dropped without penalty
    Ignored(IgnoreReason),
    /// Dropped; the sending peer should be penalized
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Code not in this build's spork table (peer may run a newer id set)
    UnknownId,
    /// Active message is as new or newer
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Signature does not recover to the governance key
    BadSignature,
}

/// Errors installing the governance signing key
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("malformed governance secret: {0}")]
    Malformed(SignatureError),
    #[error("governance key self-test failed: signature does not match the compiled pubkey")]
    SelfTestFailed,
}

/// Errors authoring a spork update locally
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("no governance signing key installed")]
    NoSigningKey,
    #[error("signing failed: {0}")]
    Signing(SignatureError),
    #[error("self-verification failed: signing key does not match the compiled pubkey")]
    SelfVerifyFailed,
}

struct RegistryState {
    /// Authoritative current message per id
    active: HashMap<SporkId, SporkMessage>,
    /// Append-only log of every validated message, keyed by identity digest
    seen: HashMap<Hash, SporkMessage>,
    /// Installed governance secret, if this node is the signer
    signing_key: Option<PrivateKey>,
}

/// Process-wide spork state, created once at startup.
///
/// A single mutex guards the maps; update frequency is governance actions,
/// not per-transaction, so finer locking buys nothing.
pub struct SporkRegistry {
    governance_pubkey: PublicKey,
    store: Arc<dyn SporkStore>,
    relay: Arc<dyn SporkRelay>,
    inner: Mutex<RegistryState>,
}

impl SporkRegistry {
    pub fn new(
        governance_pubkey: PublicKey,
        store: Arc<dyn SporkStore>,
        relay: Arc<dyn SporkRelay>,
    ) -> Self {
        Self {
            governance_pubkey,
            store,
            relay,
            inner: Mutex::new(RegistryState {
                active: HashMap::new(),
                seen: HashMap::new(),
                signing_key: None,
            }),
        }
    }

    /// Hydrate from the persistent store.
    ///
    /// Records are trusted on read: they were verified before being written,
    /// and local storage is the source of truth across restarts.
    pub fn bootstrap(&self) {
        for id in SporkId::all() {
            let Some(msg) = self.store.read(id) else {
                tracing::info!(spork = id.name(), "no previous value found in database");
                continue;
            };

            {
                let mut state = self.inner.lock().unwrap();
                state.seen.insert(msg.identity(), msg.clone());
                state.active.insert(id, msg.clone());
            }

            // Values above 1,000,000 are assumed to be timestamps and get a
            // calendar rendering alongside the raw number.
            if msg.value > 1_000_000 {
                tracing::info!(
                    spork = id.name(),
                    value = msg.value,
                    time = %render_timestamp(msg.value),
                    "loaded spork"
                );
            } else {
                tracing::info!(spork = id.name(), value = msg.value, "loaded spork");
            }
        }
    }

    /// Process one spork message from the network.
    pub fn ingest(&self, msg: &SporkMessage) -> IngestOutcome {
        // Ignore messages about unknown/deleted sporks
        let Some(id) = msg.id() else {
            tracing::debug!(code = msg.code, "spork with unknown id ignored");
            return IngestOutcome::Ignored(IgnoreReason::UnknownId);
        };

        // Fast reject on staleness before any signature work
        {
            let state = self.inner.lock().unwrap();
            if let Some(current) = state.active.get(&id) {
                if current.signed_at >= msg.signed_at {
                    tracing::debug!(spork = id.name(), hash = %msg.identity(), "seen");
                    return IngestOutcome::Ignored(IgnoreReason::Stale);
                }
            }
        }

        // Verification is CPU-bound and runs outside the lock
        if !signer::verify_message(
            &self.governance_pubkey,
            &msg.signature,
            &msg.canonical_payload(),
        ) {
            tracing::warn!(spork = id.name(), "spork with invalid signature");
            return IngestOutcome::Rejected(RejectReason::BadSignature);
        }

        // Re-check staleness under the lock: a concurrent ingest for the same
        // id may have won while we were verifying.
        let inserted = {
            let mut state = self.inner.lock().unwrap();
            match state.active.get(&id) {
                Some(current) if current.signed_at >= msg.signed_at => false,
                _ => {
                    state.seen.insert(msg.identity(), msg.clone());
                    state.active.insert(id, msg.clone());
                    true
                }
            }
        };
        if !inserted {
            return IngestOutcome::Ignored(IgnoreReason::Stale);
        }

        tracing::info!(
            spork = id.name(),
            value = msg.value,
            hash = %msg.identity(),
            "new spork accepted"
        );
        self.publish(id, msg);
        IngestOutcome::Accepted
    }

    /// The active value for a known spork, falling back to its default.
    pub fn value_of(&self, id: SporkId) -> i64 {
        let state = self.inner.lock().unwrap();
        state
            .active
            .get(&id)
            .map(|msg| msg.value)
            .unwrap_or_else(|| id.default_value())
    }

    /// The active value for a raw wire code; `-1` for unknown codes.
    pub fn value_of_code(&self, code: i32) -> i64 {
        match SporkId::from_code(code) {
            Some(id) => self.value_of(id),
            None => {
                tracing::warn!(code, "value requested for unknown spork");
                -1
            }
        }
    }

    /// Timestamp-gate interpretation: active once the value is in the past.
    /// Sporks whose value is a raw parameter must be read with [`value_of`]
    /// instead.
    ///
    /// [`value_of`]: SporkRegistry::value_of
    pub fn is_active(&self, id: SporkId, now: i64) -> bool {
        let value = self.value_of(id);
        value != -1 && value < now
    }

    /// Install the governance secret after a sign/verify self-test against
    /// the compiled pubkey. A failed self-test is an operator configuration
    /// error; the key is not retained.
    pub fn set_signing_key(&self, secret: &str) -> Result<(), KeyError> {
        let key = PrivateKey::from_secret_str(secret).map_err(KeyError::Malformed)?;

        let probe = SporkMessage::unsigned(0, 0, 0);
        let signature = signer::sign_message(&key, &probe.canonical_payload())
            .map_err(|_| KeyError::SelfTestFailed)?;
        if !signer::verify_message(&self.governance_pubkey, &signature, &probe.canonical_payload())
        {
            return Err(KeyError::SelfTestFailed);
        }

        self.inner.lock().unwrap().signing_key = Some(key);
        tracing::info!("successfully initialized as spork signer");
        Ok(())
    }

    /// Author, sign, apply, and announce a spork update.
    ///
    /// The freshly signed message is verified against the compiled pubkey
    /// before anything is applied or broadcast; a mismatch means the
    /// installed key is wrong or corrupted.
    pub fn propose_update(&self, id: SporkId, value: i64, now: i64) -> Result<(), UpdateError> {
        let key = {
            let state = self.inner.lock().unwrap();
            state.signing_key.clone().ok_or(UpdateError::NoSigningKey)?
        };

        let mut msg = SporkMessage::unsigned(id.code(), value, now);
        msg.signature =
            signer::sign_message(&key, &msg.canonical_payload()).map_err(UpdateError::Signing)?;

        if !signer::verify_message(
            &self.governance_pubkey,
            &msg.signature,
            &msg.canonical_payload(),
        ) {
            return Err(UpdateError::SelfVerifyFailed);
        }

        {
            let mut state = self.inner.lock().unwrap();
            state.seen.insert(msg.identity(), msg.clone());
            state.active.insert(id, msg.clone());
        }
        tracing::info!(spork = id.name(), value, "spork updated locally");
        self.publish(id, &msg);
        Ok(())
    }

    /// All active entries, for answering a peer's `getsporks` request.
    pub fn snapshot(&self) -> Vec<SporkMessage> {
        let state = self.inner.lock().unwrap();
        state.active.values().cloned().collect()
    }

    /// Look up a validated message by identity digest.
    pub fn seen(&self, digest: &Hash) -> Option<SporkMessage> {
        let state = self.inner.lock().unwrap();
        state.seen.get(digest).cloned()
    }

    /// Whether a message with this identity digest was already validated.
    pub fn has_seen(&self, digest: &Hash) -> bool {
        self.inner.lock().unwrap().seen.contains_key(digest)
    }

    /// Persistence and relay are fire-and-forget side effects after the
    /// in-memory mutation; a crash in between self-heals from the store on
    /// the next bootstrap.
    fn publish(&self, id: SporkId, msg: &SporkMessage) {
        if let Err(e) = self.store.write(id, msg) {
            tracing::warn!(spork = id.name(), error = %e, "failed to persist spork");
        }
        self.relay.announce(msg.identity());
    }
}

/// Render a unix timestamp as a calendar date for diagnostics.
fn render_timestamp(ts: i64) -> String {
    let days = ts.div_euclid(86_400);
    let secs = ts.rem_euclid(86_400);
    let (hour, min, sec) = (secs / 3600, (secs % 3600) / 60, secs % 60);

    // Civil-from-days conversion over 400-year eras
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);

    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
        year, month, day, hour, min, sec
    )
}
