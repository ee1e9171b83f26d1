//! Content store adapters for the sequence store.
//!
//! A content store is a pure key-value store: opaque sequence bytes keyed by
//! their [`RealDigest`](seqstore_types::RealDigest). The coalescing and
//! ingest logic above it only ever sees the [`ContentStore`] trait; which
//! backend sits behind it is decided by whoever constructs the store.
//!
//! # Storage Backends
//!
//! - [`InMemoryContentStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsContentStore`] -- one file per digest under `<root>/sequence/`
//!
//! # Design Rules
//!
//! 1. Content is immutable once written; the digest is derived from it.
//! 2. Writes are idempotent. The first write of a digest wins and later
//!    writes of the same digest are no-ops, never errors.
//! 3. Concurrent reads are always safe.
//! 4. Ranged reads clamp to the stored length.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsContentStore;
pub use memory::InMemoryContentStore;
pub use traits::{slice_span, ContentStore};
