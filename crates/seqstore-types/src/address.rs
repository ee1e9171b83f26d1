use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::digest::RealDigest;
use crate::error::TypeError;
use crate::range::{ByteRange, Span};

/// Logical reference to stored content, optionally scoped to a byte range.
///
/// Wire form is either the bare digest, `c31e41940cd12cf9b24b0e528ab955bc`,
/// or the digest followed by a half-open range,
/// `c31e41940cd12cf9b24b0e528ab955bc[23:958]`. Only the digest is durable;
/// the range is metadata carried by whichever record holds the address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PseudoAddress {
    digest: RealDigest,
    range: Option<ByteRange>,
}

impl PseudoAddress {
    pub fn new(digest: RealDigest, range: Option<ByteRange>) -> Self {
        Self { digest, range }
    }

    /// Address of the whole content under `digest`.
    pub fn whole(digest: RealDigest) -> Self {
        Self::new(digest, None)
    }

    /// Address of `range` within the content under `digest`.
    pub fn ranged(digest: RealDigest, range: ByteRange) -> Self {
        Self::new(digest, Some(range))
    }

    /// Parse the wire form.
    ///
    /// Fails with [`TypeError::MalformedAddress`] when the text matches
    /// neither `<hex-digest>` nor `<hex-digest>[<int>:<int>]`, and with
    /// [`TypeError::InvalidRange`] when a well-formed range has
    /// `start >= end`.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let malformed = || TypeError::MalformedAddress(s.to_string());

        if s.len() < RealDigest::HEX_LEN || !s.is_char_boundary(RealDigest::HEX_LEN) {
            return Err(malformed());
        }
        let (hash, rest) = s.split_at(RealDigest::HEX_LEN);
        let digest = RealDigest::from_hex(hash).map_err(|_| malformed())?;

        if rest.is_empty() {
            return Ok(Self::whole(digest));
        }

        let inner = rest
            .strip_prefix('[')
            .and_then(|r| r.strip_suffix(']'))
            .ok_or_else(malformed)?;
        let (start, end) = inner.split_once(':').ok_or_else(malformed)?;
        let start = parse_bound(start).ok_or_else(malformed)?;
        let end = parse_bound(end).ok_or_else(malformed)?;

        Ok(Self::ranged(digest, ByteRange::new(start, end)?))
    }

    pub fn digest(&self) -> RealDigest {
        self.digest
    }

    pub fn range(&self) -> Option<ByteRange> {
        self.range
    }

    pub fn has_range(&self) -> bool {
        self.range.is_some()
    }

    /// The part of the content this address asks for.
    pub fn span(&self) -> Span {
        Span::from(self.range)
    }

    /// Drop a range that covers exactly `[0, len)`, yielding the bare form.
    pub fn canonicalize(self, len: u64) -> Self {
        match self.range {
            Some(r) if r.spans_whole(len) => Self::whole(self.digest),
            _ => self,
        }
    }
}

/// Decimal bound: one or more ASCII digits that fit in a `u64`.
fn parse_bound(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parse an optional address.
///
/// A missing or empty address is not an error: a block that has no sequence
/// yet simply has nothing to resolve, so the result is `Ok(None)`.
pub fn parse_address(address: Option<&str>) -> Result<Option<PseudoAddress>, TypeError> {
    match address {
        None | Some("") => Ok(None),
        Some(s) => PseudoAddress::parse(s).map(Some),
    }
}

/// Generate the wire form for `real_digest`, optionally scoped to
/// `[start, end)`.
///
/// `real_digest` must be a bare digest; layering a range on an address that
/// already carries one is rejected as malformed. Supplying only one bound is
/// [`TypeError::IncompleteRange`].
pub fn generate(
    real_digest: &str,
    start: Option<u64>,
    end: Option<u64>,
) -> Result<String, TypeError> {
    let digest = RealDigest::from_hex(real_digest)
        .map_err(|_| TypeError::MalformedAddress(real_digest.to_string()))?;
    let range = match (start, end) {
        (None, None) => None,
        (Some(start), Some(end)) => Some(ByteRange::new(start, end)?),
        _ => return Err(TypeError::IncompleteRange),
    };
    Ok(PseudoAddress::new(digest, range).to_string())
}

impl fmt::Display for PseudoAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.range {
            None => write!(f, "{}", self.digest),
            Some(r) => write!(f, "{}{}", self.digest, r),
        }
    }
}

impl FromStr for PseudoAddress {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<RealDigest> for PseudoAddress {
    fn from(digest: RealDigest) -> Self {
        Self::whole(digest)
    }
}

impl Serialize for PseudoAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PseudoAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
