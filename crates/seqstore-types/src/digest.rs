use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Content-addressed identifier for a stored sequence.
///
/// A `RealDigest` is a 128-bit hash of a sequence's full content, written on
/// the wire as 32 lowercase hex characters. Identical content always produces
/// the same `RealDigest`; it is the only key under which content is
/// physically stored.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RealDigest([u8; 16]);

impl RealDigest {
    /// Number of raw bytes in a digest.
    pub const LEN: usize = 16;

    /// Number of hex characters in the textual form.
    pub const HEX_LEN: usize = Self::LEN * 2;

    /// Create a `RealDigest` from a pre-computed hash.
    pub const fn from_hash(hash: [u8; 16]) -> Self {
        Self(hash)
    }

    /// The raw 16-byte hash.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from the 32-character lowercase hex form.
    ///
    /// Uppercase hex is rejected: the wire format is `^[a-f0-9]{32}$`.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != Self::HEX_LEN {
            return Err(TypeError::InvalidLength {
                expected: Self::HEX_LEN,
                actual: s.len(),
            });
        }
        if !is_lower_hex(s) {
            return Err(TypeError::InvalidHex(s.to_string()));
        }
        let mut arr = [0u8; 16];
        hex::decode_to_slice(s, &mut arr).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Ok(Self(arr))
    }

    /// Returns `true` if `s` is a syntactically valid bare digest.
    pub fn is_valid(s: &str) -> bool {
        s.len() == Self::HEX_LEN && is_lower_hex(s)
    }
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

impl fmt::Debug for RealDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RealDigest({})", self.short_hex())
    }
}

impl fmt::Display for RealDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for RealDigest {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 16]> for RealDigest {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl From<RealDigest> for [u8; 16] {
    fn from(digest: RealDigest) -> Self {
        digest.0
    }
}

impl Serialize for RealDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RealDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
