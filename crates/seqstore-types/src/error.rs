use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("malformed address: {0:?}")]
    MalformedAddress(String),

    #[error("invalid range [{start}:{end}]: start must be less than end")]
    InvalidRange { start: u64, end: u64 },

    #[error("range requires both start and end")]
    IncompleteRange,

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid digest length: expected {expected} hex chars, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
