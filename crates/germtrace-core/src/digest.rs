//! # Content Hash: Stage Payload Fingerprints
//!
//! Defines `ContentHash` and [`content_hash()`], the integrity hasher used to
//! stamp every stage payload written to the ledger.
//!
//! ## Hashing Rule
//!
//! The input is the ordered list of a stage's field values exactly as they
//! were bound. The values are concatenated in order with **no separator** and
//! hashed with SHA-256. The digest is rendered as 64 lowercase hex chars.
//!
//! Because there is no separator, `["ab", "c"]` and `["a", "bc"]` produce the
//! same digest. This is kept deliberately: existing records on the ledger
//! were stamped with this rule and an auditor must be able to reproduce them.
//!
//! ## Security Invariant
//!
//! The hash is a pure function of its input. No salt, no clock, no
//! process-local randomness enters the digest, so every peer replaying a
//! transaction stamps the same hash.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// A SHA-256 digest over a stage payload's ordered fields.
///
/// Serializes as its lowercase hex string so stored records stay readable
/// and comparable with hashes computed by external auditors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Access the raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a 64-character hex string.
    ///
    /// Accepts upper- or lowercase digits. Rejects any other length or
    /// non-hex input.
    pub fn from_hex(hex: &str) -> Result<Self, CoreError> {
        if hex.len() != 64 {
            return Err(CoreError::InvalidDigest(format!(
                "expected 64 hex chars, got {}",
                hex.len()
            )));
        }
        if let Some(bad) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidDigest(format!(
                "invalid hex character {bad:?}"
            )));
        }
        let mut bytes = [0u8; 32];
        for (i, pair) in hex.as_bytes().chunks(2).enumerate() {
            bytes[i] = (nibble(pair[0]) << 4) | nibble(pair[1]);
        }
        Ok(Self(bytes))
    }
}

fn nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        _ => c - b'A' + 10,
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

/// Compute the content hash of an ordered list of fields.
///
/// Feeds each field into the hasher in order, which is byte-for-byte the
/// same as hashing the separator-free concatenation without allocating it.
pub fn content_hash<I, S>(fields: I) -> ContentHash
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update(field.as_ref().as_bytes());
    }
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hasher.finalize());
    ContentHash(bytes)
}
