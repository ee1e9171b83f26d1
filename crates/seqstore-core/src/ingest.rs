use std::collections::BTreeMap;

use bytes::Bytes;
use seqstore_crypto::ContentHasher;
use seqstore_types::{PseudoAddress, RealDigest, Span};

use crate::error::{SequenceError, SequenceResult};

/// Name to the part of the ingested sequence it refers to.
///
/// Deserializes from the `{ "name": true | [start, end] }` shape.
pub type RangeMap = BTreeMap<String, Span>;

/// Name to the address derived for it.
pub type AddressMap = BTreeMap<String, PseudoAddress>;

/// IUPAC nucleotide codes plus gap, either case.
const LOOSE_ALPHABET: &[u8] = b"ACGTUWSMKRYBDHVN-";

/// Returns `true` if every byte is an IUPAC nucleotide code or `-`.
pub fn is_loose_dna(sequence: &[u8]) -> bool {
    sequence
        .iter()
        .all(|b| LOOSE_ALPHABET.contains(&b.to_ascii_uppercase()))
}

/// A validated chunked ingest: one digest, one blob, one address per name.
#[derive(Clone, Debug)]
pub struct ChunkPlan {
    digest: RealDigest,
    content: Bytes,
    addresses: AddressMap,
}

impl ChunkPlan {
    /// Hash `content` once and derive an address for every name in `ranges`.
    ///
    /// Ranges must lie within the content. A name whose range covers the
    /// whole content gets the bare digest, same as a name mapped to `true`.
    pub fn new(hasher: &ContentHasher, content: Bytes, ranges: &RangeMap) -> SequenceResult<Self> {
        if content.is_empty() {
            return Err(SequenceError::EmptyContent);
        }
        let len = content.len() as u64;
        for (name, span) in ranges {
            if let Span::Range(range) = span {
                if range.end() > len {
                    return Err(SequenceError::RangeOutOfBounds {
                        name: name.clone(),
                        range: *range,
                        len,
                    });
                }
            }
        }

        let digest = hasher.hash(&content);
        let addresses = ranges
            .iter()
            .map(|(name, span)| {
                let address = PseudoAddress::new(digest, span.as_range().copied()).canonicalize(len);
                (name.clone(), address)
            })
            .collect();
        Ok(Self {
            digest,
            content,
            addresses,
        })
    }

    pub fn digest(&self) -> RealDigest {
        self.digest
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn addresses(&self) -> &AddressMap {
        &self.addresses
    }

    pub fn into_parts(self) -> (RealDigest, Bytes, AddressMap) {
        (self.digest, self.content, self.addresses)
    }
}
