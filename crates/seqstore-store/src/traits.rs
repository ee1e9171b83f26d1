use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use seqstore_types::{RealDigest, Span};

use crate::error::StoreResult;

/// Digest-keyed, write-once content store.
///
/// All implementations must satisfy these invariants:
/// - Content under a digest never changes once written.
/// - `write` of a digest that already exists is a no-op and returns `Ok`,
///   including when two writers race on the same digest.
/// - `read` of a missing digest fails with `StoreError::NotFound`.
/// - `read` with a range returns bytes `[start, end)` clamped to the stored
///   length.
/// - The store never interprets content.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Check whether content exists under `digest`.
    async fn exists(&self, digest: &RealDigest) -> StoreResult<bool>;

    /// Read the whole content, or one range of it.
    async fn read(&self, digest: &RealDigest, span: Span) -> StoreResult<Bytes>;

    /// Store `content` under `digest` unless something is already there.
    ///
    /// The caller vouches that `content` hashes to `digest`.
    async fn write(&self, digest: &RealDigest, content: Bytes) -> StoreResult<()>;

    /// Remove the content under `digest`.
    ///
    /// Fails with `StoreError::NotFound` if nothing is stored. Nothing checks
    /// whether blocks still reference the digest.
    async fn delete(&self, digest: &RealDigest) -> StoreResult<()>;
}

#[async_trait]
impl<T: ContentStore + ?Sized> ContentStore for Arc<T> {
    async fn exists(&self, digest: &RealDigest) -> StoreResult<bool> {
        (**self).exists(digest).await
    }

    async fn read(&self, digest: &RealDigest, span: Span) -> StoreResult<Bytes> {
        (**self).read(digest, span).await
    }

    async fn write(&self, digest: &RealDigest, content: Bytes) -> StoreResult<()> {
        (**self).write(digest, content).await
    }

    async fn delete(&self, digest: &RealDigest) -> StoreResult<()> {
        (**self).delete(digest).await
    }
}

/// Cut `span` out of `content`, clamped to its length.
pub fn slice_span(content: &Bytes, span: Span) -> Bytes {
    match span {
        Span::Whole => content.clone(),
        Span::Range(range) => content.slice(range.clamp_to(content.len())),
    }
}
