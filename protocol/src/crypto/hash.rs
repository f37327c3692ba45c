//! # Hashing Utilities
//!
//! The ledger network identifies every entity by the SHA-256 digest of its
//! canonical cell encoding. Envelopes, inbound messages and transactions are
//! all compared by that digest, so this module owns both the raw hashing
//! helpers and the [`ContentHash`] newtype that flows through the rest of the
//! crate.
//!
//! Hex is the display format. The trade tracker expects lower-case hex
//! without a prefix, and so does every log line we emit.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Digest length in bytes.
pub const HASH_LENGTH: usize = 32;

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use omniswap_protocol::crypto::sha256_array;
///
/// let hash = sha256_array(b"omniswap");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256_array(data: &[u8]) -> [u8; HASH_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash multiple byte slices together without concatenating them first.
///
/// Cell hashing feeds descriptors, data, child depths and child hashes into a
/// single digest; this keeps that path allocation-free.
pub fn sha256_multi(parts: &[&[u8]]) -> [u8; HASH_LENGTH] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

// ---------------------------------------------------------------------------
// ContentHash
// ---------------------------------------------------------------------------

/// Errors from parsing a [`ContentHash`] out of text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("wrong digest length: expected {HASH_LENGTH} bytes, got {0}")]
    WrongLength(usize),
}

/// A 32-byte content hash: the identity of an envelope, message or
/// transaction.
///
/// Serialized as lower-case hex so it can be dropped straight into JSON
/// payloads for the trade tracker.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; HASH_LENGTH]);

impl ContentHash {
    /// Wrap a raw digest.
    pub const fn from_bytes(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Hash arbitrary bytes with SHA-256.
    pub fn digest(data: &[u8]) -> Self {
        Self(sha256_array(data))
    }

    /// Borrow the raw digest.
    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    /// Lower-case hex, no prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex (an optional `0x` prefix is tolerated).
    pub fn from_hex(s: &str) -> Result<Self, HashParseError> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed).map_err(|e| HashParseError::InvalidHex(e.to_string()))?;
        Self::try_from(bytes.as_slice())
    }
}

impl TryFrom<&[u8]> for ContentHash {
    type Error = HashParseError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; HASH_LENGTH] = bytes
            .try_into()
            .map_err(|_| HashParseError::WrongLength(bytes.len()))?;
        Ok(Self(array))
    }
}

impl From<[u8; HASH_LENGTH]> for ContentHash {
    fn from(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        let hash = sha256_array(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_sha256_multi_matches_concatenation() {
        let multi = sha256_multi(&[b"hello", b" world"]);
        assert_eq!(multi, sha256_array(b"hello world"));
    }

    #[test]
    fn content_hash_hex_roundtrip() {
        let hash = ContentHash::digest(b"envelope");
        let hex = hash.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(hex, hex.to_lowercase());
        assert_eq!(ContentHash::from_hex(&hex).unwrap(), hash);
        assert_eq!(ContentHash::from_hex(&format!("0x{hex}")).unwrap(), hash);
    }

    #[test]
    fn content_hash_rejects_bad_input() {
        assert!(matches!(
            ContentHash::from_hex("zz"),
            Err(HashParseError::InvalidHex(_))
        ));
        assert_eq!(
            ContentHash::from_hex("abcd"),
            Err(HashParseError::WrongLength(2))
        );
    }

    #[test]
    fn content_hash_serializes_as_hex_string() {
        let hash = ContentHash::from_bytes([0xab; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }
}
