//! Content hashing for the sequence store.
//!
//! Turns sequence content into a [`RealDigest`](seqstore_types::RealDigest).
//! All crypto operations wrap established libraries; nothing here is custom cryptography.

pub mod hasher;

pub use hasher::{ContentHasher, DigestAlgorithm};
