use serde::{Deserialize, Serialize};
use seqstore_types::RealDigest;

/// Hash function used to derive digests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// Plain MD5 of the content. Matches digests already held by blocks.
    #[default]
    Md5,
    /// Domain-separated BLAKE3, truncated to 128 bits.
    Blake3,
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Md5 => write!(f, "md5"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

/// Content hasher producing [`RealDigest`]s.
///
/// The BLAKE3 variant prepends a domain tag before hashing, so its digests
/// never collide with plain BLAKE3 hashes of the same bytes used elsewhere.
/// MD5 is computed over the raw content with no tag, so existing digests
/// stay valid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentHasher {
    algorithm: DigestAlgorithm,
}

impl ContentHasher {
    /// Hasher compatible with existing md5-keyed sequence stores.
    pub const MD5: Self = Self {
        algorithm: DigestAlgorithm::Md5,
    };
    /// Truncated BLAKE3 hasher.
    pub const BLAKE3: Self = Self {
        algorithm: DigestAlgorithm::Blake3,
    };

    const BLAKE3_DOMAIN: &'static str = "seqstore-sequence-v1";

    pub const fn new(algorithm: DigestAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Hash the full content.
    pub fn hash(&self, data: &[u8]) -> RealDigest {
        match self.algorithm {
            DigestAlgorithm::Md5 => RealDigest::from_hash(md5::compute(data).0),
            DigestAlgorithm::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                hasher.update(Self::BLAKE3_DOMAIN.as_bytes());
                hasher.update(b":");
                hasher.update(data);
                let full = hasher.finalize();
                let mut truncated = [0u8; RealDigest::LEN];
                truncated.copy_from_slice(&full.as_bytes()[..RealDigest::LEN]);
                RealDigest::from_hash(truncated)
            }
        }
    }

    /// Verify that data produces the expected digest.
    pub fn verify(&self, data: &[u8], expected: &RealDigest) -> bool {
        self.hash(data) == *expected
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::MD5
    }
}

impl From<DigestAlgorithm> for ContentHasher {
    fn from(algorithm: DigestAlgorithm) -> Self {
        Self::new(algorithm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEQ: &[u8] = b"ACTAGCTAGCTAGCTGACTAGCTAGCTGATCGTAGCGATCTACTGATCAGCTACTGTACGTACGTGACTG";

    #[test]
    fn md5_matches_known_digest() {
        let digest = ContentHasher::MD5.hash(SEQ);
        assert_eq!(digest.to_hex(), "367b632300f0b2a884310bbc3f91b11f");
        assert_eq!(
            ContentHasher::MD5.hash(b"hello").to_hex(),
            "5d41402abc4b2a76b9719d911017c592"
        );
    }

    #[test]
    fn hash_is_deterministic() {
        for hasher in [ContentHasher::MD5, ContentHasher::BLAKE3] {
            assert_eq!(hasher.hash(SEQ), hasher.hash(SEQ));
        }
    }

    #[test]
    fn algorithms_differ() {
        assert_ne!(ContentHasher::MD5.hash(SEQ), ContentHasher::BLAKE3.hash(SEQ));
    }

    #[test]
    fn blake3_is_domain_separated() {
        let plain = blake3::hash(SEQ);
        let ours = ContentHasher::BLAKE3.hash(SEQ);
        assert_ne!(&plain.as_bytes()[..16], ours.as_bytes());
        assert_eq!(ours.to_hex().len(), 32);
    }

    #[test]
    fn verify_correct_and_tampered() {
        let digest = ContentHasher::MD5.hash(SEQ);
        assert!(ContentHasher::MD5.verify(SEQ, &digest));
        assert!(!ContentHasher::MD5.verify(b"ACGT", &digest));
    }

    #[test]
    fn algorithm_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&DigestAlgorithm::Blake3).unwrap(),
            "\"blake3\""
        );
        let parsed: DigestAlgorithm = serde_json::from_str("\"md5\"").unwrap();
        assert_eq!(parsed, DigestAlgorithm::Md5);
        assert_eq!(ContentHasher::default().algorithm(), DigestAlgorithm::Md5);
    }
}
