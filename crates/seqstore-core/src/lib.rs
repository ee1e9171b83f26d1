//! Sequence store engine.
//!
//! Sits between callers holding [`PseudoAddress`](seqstore_types::PseudoAddress)
//! strings and a [`ContentStore`](seqstore_store::ContentStore) backend.
//!
//! # Read path
//!
//! [`parse_requesters`] → [`coalesce`] → [`fetch_coalesced`] → [`remap`].
//! Many requesters naming ranges of the same digest cost one backend read:
//! the digest is fetched whole if anyone asked for all of it, otherwise over
//! the envelope of every requested range. Each requester then gets exactly
//! the range it asked for.
//!
//! # Write path
//!
//! [`ChunkPlan`] hashes a sequence once and derives a per-name address;
//! [`BatchWriter`] writes idempotently in bounded concurrent batches.
//!
//! [`SequenceStore`] ties both paths to a configured backend.

pub mod coalesce;
pub mod config;
pub mod error;
pub mod fetch;
pub mod ingest;
pub mod sequence;
pub mod writer;

pub use coalesce::{coalesce, parse_requesters, plan, CoalescedRequests, ParsedRequests, RequesterMap};
pub use config::{BackendConfig, SequenceConfig, DEFAULT_WRITE_BATCH_SIZE};
pub use error::{SequenceError, SequenceResult};
pub use fetch::{fetch_coalesced, remap, resolve, slice_for, FetchedContent, ResolvedMap};
pub use ingest::{is_loose_dna, AddressMap, ChunkPlan, RangeMap};
pub use sequence::SequenceStore;
pub use writer::BatchWriter;

pub use seqstore_crypto::{ContentHasher, DigestAlgorithm};
pub use seqstore_store::{ContentStore, FsContentStore, InMemoryContentStore, StoreError};
pub use seqstore_types::{ByteRange, PseudoAddress, RealDigest, Span, TypeError};
