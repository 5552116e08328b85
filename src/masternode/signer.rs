//! Text-message signing for masternodes
//!
//! One primitive, two call sites: spork authentication and masternode
//! identity proofs. The message magic is hashed in front of the payload so
//! these signatures live in their own domain.

use crate::constants::MESSAGE_MAGIC;
use crate::crypto::{
    hash_bytes, Hash, MessageSignature, PrivateKey, PublicKey, SignatureError,
};

/// The digest actually signed: BLAKE3 over magic prefix plus payload.
fn message_digest(payload: &[u8]) -> Hash {
    let mut data = Vec::with_capacity(MESSAGE_MAGIC.len() + payload.len());
    data.extend_from_slice(MESSAGE_MAGIC);
    data.extend_from_slice(payload);
    hash_bytes(&data)
}

/// Sign a payload with a recoverable signature.
pub fn sign_message(
    key: &PrivateKey,
    payload: &[u8],
) -> Result<MessageSignature, SignatureError> {
    key.sign_recoverable(&message_digest(payload))
}

/// Check a payload signature against an expected public key.
///
/// Recovers the signer from the signature and compares key hashes; malformed
/// signatures and recovery failures return false, never an error, so callers
/// cannot distinguish them from a plain mismatch.
pub fn verify_message(
    expected: &PublicKey,
    signature: &MessageSignature,
    payload: &[u8],
) -> bool {
    match PublicKey::recover(&message_digest(payload), signature) {
        Some(recovered) => recovered.pubkey_hash() == expected.pubkey_hash(),
        None => false,
    }
}

/// The output-locking form a collateral payment to `pubkey` must use.
pub fn derive_collateral_script(pubkey: &PublicKey) -> Hash {
    pubkey.pubkey_hash()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_roundtrip() {
        let key = PrivateKey::generate();
        let sig = sign_message(&key, b"masternode ping").unwrap();
        assert!(verify_message(&key.public_key(), &sig, b"masternode ping"));
    }

    #[test]
    fn test_wrong_key_fails() {
        let key = PrivateKey::generate();
        let other = PrivateKey::generate();
        let sig = sign_message(&key, b"payload").unwrap();
        assert!(!verify_message(&other.public_key(), &sig, b"payload"));
    }

    #[test]
    fn test_wrong_payload_fails() {
        let key = PrivateKey::generate();
        let sig = sign_message(&key, b"payload a").unwrap();
        assert!(!verify_message(&key.public_key(), &sig, b"payload b"));
    }

    #[test]
    fn test_malformed_signature_is_false_not_error() {
        let key = PrivateKey::generate();
        let garbage = MessageSignature::from_bytes(&[0xffu8; 65]);
        assert!(!verify_message(&key.public_key(), &garbage, b"payload"));
    }

    #[test]
    fn test_collateral_script_matches_pubkey_hash() {
        let pubkey = PrivateKey::generate().public_key();
        assert_eq!(derive_collateral_script(&pubkey), pubkey.pubkey_hash());
        // First 20 bytes carry the hash, the rest is padding
        assert_eq!(derive_collateral_script(&pubkey).0[20..], [0u8; 12]);
    }
}
