use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use seqstore_types::{RealDigest, Span};

use crate::error::{StoreError, StoreResult};
use crate::traits::{slice_span, ContentStore};

/// In-memory, HashMap-based content store.
///
/// Intended for tests and embedding. Content is held behind a `RwLock`;
/// `Bytes` makes reads cheap clones. Read and write calls are counted so
/// callers can observe how many backend round trips a batch cost.
pub struct InMemoryContentStore {
    blobs: RwLock<HashMap<RealDigest, Bytes>>,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl InMemoryContentStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    /// Number of digests currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored content.
    pub fn total_bytes(&self) -> u64 {
        self.blobs
            .read()
            .expect("lock poisoned")
            .values()
            .map(|b| b.len() as u64)
            .sum()
    }

    /// Remove all content from the store.
    pub fn clear(&self) {
        self.blobs.write().expect("lock poisoned").clear();
    }

    /// Return a sorted list of all stored digests.
    pub fn all_digests(&self) -> Vec<RealDigest> {
        let map = self.blobs.read().expect("lock poisoned");
        let mut digests: Vec<RealDigest> = map.keys().copied().collect();
        digests.sort();
        digests
    }

    /// Number of `read` calls served so far, including failed ones.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of `write` calls that actually stored new content.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn exists(&self, digest: &RealDigest) -> StoreResult<bool> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.contains_key(digest))
    }

    async fn read(&self, digest: &RealDigest, span: Span) -> StoreResult<Bytes> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let map = self.blobs.read().expect("lock poisoned");
        let content = map.get(digest).ok_or(StoreError::NotFound(*digest))?;
        Ok(slice_span(content, span))
    }

    async fn write(&self, digest: &RealDigest, content: Bytes) -> StoreResult<()> {
        let mut map = self.blobs.write().expect("lock poisoned");
        if !map.contains_key(digest) {
            map.insert(*digest, content);
            self.writes.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    async fn delete(&self, digest: &RealDigest) -> StoreResult<()> {
        let mut map = self.blobs.write().expect("lock poisoned");
        map.remove(digest)
            .map(|_| ())
            .ok_or(StoreError::NotFound(*digest))
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("sequence_count", &self.len())
            .finish()
    }
}
