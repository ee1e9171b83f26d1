//! Foundation types for the sequence store.
//!
//! Every other `seqstore` crate depends on these.
//!
//! # Key Types
//!
//! - [`RealDigest`] -- 128-bit content hash, the physical storage key
//! - [`ByteRange`] -- half-open `[start, end)` range with `start < end`
//! - [`Span`] -- whole content, or one [`ByteRange`] of it
//! - [`PseudoAddress`] -- digest optionally scoped to a range, in the
//!   `<digest>` / `<digest>[<start>:<end>]` wire form

pub mod address;
pub mod digest;
pub mod error;
pub mod range;

pub use address::{generate, parse_address, PseudoAddress};
pub use digest::RealDigest;
pub use error::TypeError;
pub use range::{ByteRange, Span};
