use bytes::Bytes;
use futures::future::try_join_all;
use seqstore_store::{ContentStore, StoreResult};
use seqstore_types::RealDigest;

use crate::config::DEFAULT_WRITE_BATCH_SIZE;

/// Idempotent writer that bounds how many writes are outstanding at once.
///
/// Entries are split into batches of `batch_size`. Writes inside a batch run
/// concurrently; batches run one after another. A failed write fails the
/// call and later batches are never started. Nothing already written is
/// rolled back, since content-addressed writes are safe to repeat.
pub struct BatchWriter<'a, S: ?Sized> {
    store: &'a S,
    batch_size: usize,
}

impl<'a, S: ContentStore + ?Sized> BatchWriter<'a, S> {
    /// A zero `batch_size` is treated as one.
    pub fn new(store: &'a S, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
        }
    }

    /// Writer with the default batch size.
    pub fn with_default_batch(store: &'a S) -> Self {
        Self::new(store, DEFAULT_WRITE_BATCH_SIZE)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Write one blob unless its digest is already stored.
    pub async fn write_one(&self, digest: &RealDigest, content: Bytes) -> StoreResult<()> {
        if self.store.exists(digest).await? {
            tracing::trace!(digest = %digest, "already stored");
            return Ok(());
        }
        self.store.write(digest, content).await
    }

    /// Write every entry, batch by batch. Returns the number of entries
    /// handled, whether or not they were already present.
    pub async fn write_all(&self, entries: Vec<(RealDigest, Bytes)>) -> StoreResult<usize> {
        let total = entries.len();
        for (n, batch) in entries.chunks(self.batch_size).enumerate() {
            tracing::debug!(batch = n, size = batch.len(), "writing batch");
            try_join_all(
                batch
                    .iter()
                    .map(|(digest, content)| self.write_one(digest, content.clone())),
            )
            .await?;
        }
        tracing::debug!(entries = total, "batch write complete");
        Ok(total)
    }
}

impl<'a, S: ContentStore + ?Sized> std::fmt::Debug for BatchWriter<'a, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchWriter")
            .field("batch_size", &self.batch_size)
            .finish()
    }
}
