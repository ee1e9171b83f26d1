use seqstore_store::StoreError;
use seqstore_types::{ByteRange, RealDigest, TypeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SequenceError {
    /// Malformed address, inverted range, or bad digest text.
    #[error(transparent)]
    Address(#[from] TypeError),

    #[error("range {range} for {name:?} exceeds sequence length {len}")]
    RangeOutOfBounds {
        name: String,
        range: ByteRange,
        len: u64,
    },

    #[error("cannot store an empty sequence")]
    EmptyContent,

    #[error("content hashes to {computed}, not {expected}")]
    DigestMismatch {
        expected: RealDigest,
        computed: RealDigest,
    },

    #[error("invalid sequence: {0}")]
    InvalidSequence(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl SequenceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_not_found())
    }

    /// Returns `true` for input that can never succeed as given.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Address(_)
                | Self::RangeOutOfBounds { .. }
                | Self::EmptyContent
                | Self::DigestMismatch { .. }
                | Self::InvalidSequence(_)
        )
    }
}

pub type SequenceResult<T> = Result<T, SequenceError>;
