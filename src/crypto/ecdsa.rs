//! Recoverable ECDSA keys over secp256k1
//!
//! Message signatures carry a recovery id so verification can recover the
//! signer's public key from the signature alone and compare key hashes.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{double_hash, hash_bytes, Hash};
use crate::constants::SECRET_KEY_VERSION;

/// Signature errors
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid secret string")]
    InvalidSecretString,
    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

/// secp256k1 private key
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrivateKey([REDACTED])")
    }
}

/// 33-byte compressed SEC1 public key
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey(#[serde(with = "pubkey_serde")] pub [u8; 33]);

/// 65-byte recoverable signature: recovery id byte followed by r and s
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSignature(#[serde(with = "sig_serde")] pub [u8; 65]);

mod pubkey_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 33], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 33], D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Deserialize::deserialize(deserializer)?;
        if bytes.len() != 33 {
            return Err(serde::de::Error::custom("Invalid public key length"));
        }
        let mut arr = [0u8; 33];
        arr.copy_from_slice(&bytes);
        Ok(arr)
    }
}

mod sig_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 65], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 65], D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Deserialize::deserialize(deserializer)?;
        if bytes.len() != 65 {
            return Err(serde::de::Error::custom("Invalid signature length"));
        }
        let mut arr = [0u8; 65];
        arr.copy_from_slice(&bytes);
        Ok(arr)
    }
}

impl PrivateKey {
    /// Generate a new random private key
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        PrivateKey(signing_key)
    }

    /// Create from 32 bytes
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, SignatureError> {
        SigningKey::from_slice(bytes)
            .map(PrivateKey)
            .map_err(|_| SignatureError::InvalidPrivateKey)
    }

    /// Parse a Base58Check-encoded secret: version byte, 32 key bytes,
    /// 4-byte double-hash checksum.
    pub fn from_secret_str(secret: &str) -> Result<Self, SignatureError> {
        let decoded = bs58::decode(secret)
            .into_vec()
            .map_err(|_| SignatureError::InvalidSecretString)?;
        if decoded.len() != 37 || decoded[0] != SECRET_KEY_VERSION {
            return Err(SignatureError::InvalidSecretString);
        }
        let checksum = double_hash(&decoded[0..33]);
        if decoded[33..37] != checksum.0[0..4] {
            return Err(SignatureError::InvalidSecretString);
        }
        let mut key_bytes = [0u8; 32];
        key_bytes.copy_from_slice(&decoded[1..33]);
        Self::from_bytes(&key_bytes)
    }

    /// Encode as a Base58Check secret string
    pub fn to_secret_str(&self) -> String {
        let mut payload = Vec::with_capacity(37);
        payload.push(SECRET_KEY_VERSION);
        payload.extend_from_slice(&self.to_bytes());
        let checksum = double_hash(&payload);
        payload.extend_from_slice(&checksum.0[0..4]);
        bs58::encode(&payload).into_string()
    }

    /// Get the corresponding public key
    pub fn public_key(&self) -> PublicKey {
        let point = self.0.verifying_key().to_encoded_point(true);
        let mut bytes = [0u8; 33];
        bytes.copy_from_slice(point.as_bytes());
        PublicKey(bytes)
    }

    /// Produce a recoverable signature over a 32-byte digest
    pub fn sign_recoverable(&self, digest: &Hash) -> Result<MessageSignature, SignatureError> {
        let (signature, recovery_id) = self
            .0
            .sign_prehash_recoverable(&digest.0)
            .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;

        let mut bytes = [0u8; 65];
        bytes[0] = recovery_id.to_byte();
        bytes[1..65].copy_from_slice(&signature.to_bytes());
        Ok(MessageSignature(bytes))
    }

    /// Export to bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes().into()
    }
}

impl PublicKey {
    /// Create from 33 compressed bytes
    pub fn from_bytes(bytes: &[u8; 33]) -> Result<Self, SignatureError> {
        // Validate by trying to create a verifying key
        VerifyingKey::from_sec1_bytes(bytes).map_err(|_| SignatureError::InvalidPublicKey)?;
        Ok(PublicKey(*bytes))
    }

    /// Create from a compressed SEC1 hex string
    pub fn from_hex(hex_str: &str) -> Result<Self, SignatureError> {
        let bytes = hex::decode(hex_str).map_err(|_| SignatureError::InvalidPublicKey)?;
        if bytes.len() != 33 {
            return Err(SignatureError::InvalidPublicKey);
        }
        let mut arr = [0u8; 33];
        arr.copy_from_slice(&bytes);
        Self::from_bytes(&arr)
    }

    /// Recover the signing public key from a recoverable signature over a digest.
    /// Returns `None` for any malformed signature; callers treat that the same
    /// as a key mismatch.
    pub fn recover(digest: &Hash, signature: &MessageSignature) -> Option<PublicKey> {
        let recovery_id = RecoveryId::from_byte(signature.0[0])?;
        let sig = Signature::from_slice(&signature.0[1..65]).ok()?;
        let key = VerifyingKey::recover_from_prehash(&digest.0, &sig, recovery_id).ok()?;

        let point = key.to_encoded_point(true);
        let mut bytes = [0u8; 33];
        bytes.copy_from_slice(point.as_bytes());
        Some(PublicKey(bytes))
    }

    /// The pubkey hash used as an output lock and for key identity checks.
    /// First 20 bytes of BLAKE3(pubkey), zero-padded to 32 bytes; matches the
    /// address encoding format.
    pub fn pubkey_hash(&self) -> Hash {
        let full_hash = hash_bytes(&self.0);
        let mut addr_hash = [0u8; 32];
        addr_hash[0..20].copy_from_slice(&full_hash.0[0..20]);
        Hash(addr_hash)
    }

    /// Convert to address with checksum
    pub fn to_address(&self) -> String {
        let hash = hash_bytes(&self.0);
        let addr_bytes = &hash.0[0..20];

        // 4-byte double-hash checksum
        let checksum = double_hash(addr_bytes);

        let mut with_checksum = Vec::with_capacity(24);
        with_checksum.extend_from_slice(addr_bytes);
        with_checksum.extend_from_slice(&checksum.0[0..4]);

        format!("OBL{}", bs58::encode(&with_checksum).into_string())
    }

    /// Export to bytes
    pub fn to_bytes(&self) -> [u8; 33] {
        self.0
    }
}

impl MessageSignature {
    /// A zeroed placeholder for unsigned messages
    pub const fn empty() -> Self {
        MessageSignature([0u8; 65])
    }

    /// Create from 65 bytes
    pub fn from_bytes(bytes: &[u8; 65]) -> Self {
        MessageSignature(*bytes)
    }

    /// Export to bytes
    pub fn to_bytes(&self) -> [u8; 65] {
        self.0
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.0))
    }
}

impl std::fmt::Debug for MessageSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({})", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation() {
        let private = PrivateKey::generate();
        let public = private.public_key();
        assert!(public.0[0] == 0x02 || public.0[0] == 0x03);
    }

    #[test]
    fn test_sign_recover() {
        let private = PrivateKey::generate();
        let public = private.public_key();

        let digest = hash_bytes(b"test message");
        let signature = private.sign_recoverable(&digest).unwrap();

        let recovered = PublicKey::recover(&digest, &signature).unwrap();
        assert_eq!(recovered, public);
    }

    #[test]
    fn test_recover_wrong_digest_mismatches() {
        let private = PrivateKey::generate();
        let public = private.public_key();

        let signature = private.sign_recoverable(&hash_bytes(b"message 1")).unwrap();
        let recovered = PublicKey::recover(&hash_bytes(b"message 2"), &signature);

        // Recovery from the wrong digest yields some other key, never ours
        assert_ne!(recovered, Some(public));
    }

    #[test]
    fn test_malformed_signature_recovers_none() {
        let digest = hash_bytes(b"test");
        let mut bytes = [0u8; 65];
        bytes[0] = 0xff; // recovery id out of range
        assert!(PublicKey::recover(&digest, &MessageSignature(bytes)).is_none());
    }

    #[test]
    fn test_secret_str_roundtrip() {
        let private = PrivateKey::generate();
        let secret = private.to_secret_str();
        let recovered = PrivateKey::from_secret_str(&secret).unwrap();
        assert_eq!(private.public_key(), recovered.public_key());
    }

    #[test]
    fn test_secret_str_bad_checksum_rejected() {
        let private = PrivateKey::generate();
        let mut secret = private.to_secret_str();
        // Corrupt the tail; either the checksum or the alphabet check must fail
        let last = secret.pop().unwrap();
        secret.push(if last == '1' { '2' } else { '1' });
        assert!(PrivateKey::from_secret_str(&secret).is_err());
    }

    #[test]
    fn test_governance_pubkey_constant_parses() {
        PublicKey::from_hex(crate::constants::GOVERNANCE_PUBKEY).unwrap();
    }

    #[test]
    fn test_address_generation() {
        let public = PrivateKey::generate().public_key();
        let address = public.to_address();
        assert!(address.starts_with("OBL"));
        assert!(address.len() > 10);
    }
}
