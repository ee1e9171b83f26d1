use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use seqstore_crypto::ContentHasher;
use seqstore_store::{ContentStore, FsContentStore, InMemoryContentStore};
use seqstore_types::{parse_address, PseudoAddress, RealDigest, TypeError};

use crate::coalesce::RequesterMap;
use crate::config::{BackendConfig, SequenceConfig};
use crate::error::{SequenceError, SequenceResult};
use crate::fetch::{resolve, ResolvedMap};
use crate::ingest::{AddressMap, ChunkPlan, RangeMap};
use crate::writer::BatchWriter;

/// Entry point for reading and writing sequences.
///
/// Wraps whichever [`ContentStore`] it was built with; the backend is chosen
/// by the caller at construction, never looked up globally.
#[derive(Clone)]
pub struct SequenceStore {
    backend: Arc<dyn ContentStore>,
    hasher: ContentHasher,
    write_batch_size: usize,
    verify_digests: bool,
}

impl SequenceStore {
    /// Build on an existing backend. `config.backend` is ignored.
    pub fn new(backend: Arc<dyn ContentStore>, config: &SequenceConfig) -> Self {
        Self {
            backend,
            hasher: ContentHasher::new(config.digest),
            write_batch_size: config.write_batch_size.max(1),
            verify_digests: config.verify_digests,
        }
    }

    /// Empty in-memory store with default settings.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryContentStore::new()),
            &SequenceConfig::in_memory(),
        )
    }

    /// Validate `config` and open the backend it names.
    pub async fn open(config: &SequenceConfig) -> SequenceResult<Self> {
        config.validate()?;
        let backend: Arc<dyn ContentStore> = match &config.backend {
            BackendConfig::Memory => Arc::new(InMemoryContentStore::new()),
            BackendConfig::Filesystem { root } => Arc::new(FsContentStore::open(root).await?),
        };
        tracing::info!(backend = ?config.backend, digest = %config.digest, "opened sequence store");
        Ok(Self::new(backend, config))
    }

    pub fn backend(&self) -> &Arc<dyn ContentStore> {
        &self.backend
    }

    pub fn hasher(&self) -> ContentHasher {
        self.hasher
    }

    pub fn write_batch_size(&self) -> usize {
        self.write_batch_size
    }

    fn writer(&self) -> BatchWriter<'_, dyn ContentStore> {
        BatchWriter::new(&*self.backend, self.write_batch_size)
    }

    /// Whether the digest behind `address` is stored. Ranged addresses are
    /// accepted; only the digest is checked.
    pub async fn exists(&self, address: &str) -> SequenceResult<bool> {
        let address = PseudoAddress::parse(address)?;
        Ok(self.backend.exists(&address.digest()).await?)
    }

    /// Read the content an address names.
    ///
    /// No address gives `Ok(None)`. A missing digest is an error.
    pub async fn get(&self, address: Option<&str>) -> SequenceResult<Option<Bytes>> {
        let Some(address) = parse_address(address)? else {
            return Ok(None);
        };
        let content = self.backend.read(&address.digest(), address.span()).await?;
        Ok(Some(content))
    }

    /// Resolve a whole requester map with one backend read per digest.
    ///
    /// Requesters without a usable address map to `None`. A failed read,
    /// including a missing digest, fails the batch.
    pub async fn get_many(&self, requesters: &RequesterMap) -> SequenceResult<ResolvedMap> {
        let backend = &self.backend;
        let resolved = resolve(requesters, |digest, span| async move {
            backend.read(&digest, span).await
        })
        .await?;
        tracing::debug!(requesters = resolved.len(), "resolved sequence batch");
        Ok(resolved)
    }

    /// Store `content` and return its digest.
    pub async fn write(&self, content: Bytes) -> SequenceResult<RealDigest> {
        if content.is_empty() {
            return Err(SequenceError::EmptyContent);
        }
        let digest = self.hasher.hash(&content);
        let len = content.len();
        self.writer().write_one(&digest, content).await?;
        tracing::info!(digest = %digest, bytes = len, "stored sequence");
        Ok(digest)
    }

    /// Store `content` only if it hashes to `expected`.
    pub async fn write_verified(&self, expected: &str, content: Bytes) -> SequenceResult<RealDigest> {
        let expected = bare_digest(expected)?;
        if content.is_empty() {
            return Err(SequenceError::EmptyContent);
        }
        let computed = self.hasher.hash(&content);
        if computed != expected {
            return Err(SequenceError::DigestMismatch { expected, computed });
        }
        self.writer().write_one(&computed, content).await?;
        Ok(computed)
    }

    /// Store one sequence and derive an address for each named range.
    pub async fn write_chunks(&self, content: Bytes, ranges: &RangeMap) -> SequenceResult<AddressMap> {
        let plan = ChunkPlan::new(&self.hasher, content, ranges)?;
        let (digest, content, addresses) = plan.into_parts();
        self.writer().write_one(&digest, content).await?;
        tracing::info!(digest = %digest, names = addresses.len(), "stored chunked sequence");
        Ok(addresses)
    }

    /// Store many `digest -> content` entries in bounded batches.
    ///
    /// Every key must be a bare digest. Empty entries are skipped. When
    /// digest verification is on, all entries are checked before anything is
    /// written. Returns the number of entries written.
    pub async fn write_many(&self, entries: BTreeMap<String, Bytes>) -> SequenceResult<usize> {
        let mut batch = Vec::with_capacity(entries.len());
        for (key, content) in entries {
            let digest = bare_digest(&key)?;
            if content.is_empty() {
                tracing::debug!(digest = %digest, "skipping empty sequence");
                continue;
            }
            if self.verify_digests {
                let computed = self.hasher.hash(&content);
                if computed != digest {
                    return Err(SequenceError::DigestMismatch {
                        expected: digest,
                        computed,
                    });
                }
            }
            batch.push((digest, content));
        }
        let written = self.writer().write_all(batch).await?;
        tracing::info!(entries = written, "stored sequence batch");
        Ok(written)
    }

    /// Remove the content under a bare digest.
    pub async fn delete(&self, digest: &str) -> SequenceResult<()> {
        let digest = bare_digest(digest)?;
        self.backend.delete(&digest).await?;
        tracing::info!(digest = %digest, "deleted sequence");
        Ok(())
    }
}

impl std::fmt::Debug for SequenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceStore")
            .field("digest", &self.hasher.algorithm())
            .field("write_batch_size", &self.write_batch_size)
            .field("verify_digests", &self.verify_digests)
            .finish()
    }
}

fn bare_digest(s: &str) -> SequenceResult<RealDigest> {
    RealDigest::from_hex(s).map_err(|_| TypeError::MalformedAddress(s.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqstore_crypto::DigestAlgorithm;
    use seqstore_types::Span;

    const SCENARIO_1: &str =
        "ACTAGCTAGCTAGCTGACTAGCTAGCTGATCGTAGCGATCTACTGATCAGCTACTGTACGTACGTGACTG";
    const SCENARIO_2: &str =
        "actacgtacgtacgagcactgcgtagctgatcagctgctgactgactgatcgacgtagcagctacgtagctagcga";

    fn counted() -> (Arc<InMemoryContentStore>, SequenceStore) {
        let mem = Arc::new(InMemoryContentStore::new());
        let store = SequenceStore::new(mem.clone(), &SequenceConfig::in_memory());
        (mem, store)
    }

    fn text(b: &Bytes) -> &str {
        std::str::from_utf8(b).unwrap()
    }

    fn requesters(entries: &[(&str, Option<String>)]) -> RequesterMap {
        entries
            .iter()
            .map(|(id, a)| (id.to_string(), a.clone()))
            .collect()
    }

    // -----------------------------------------------------------------------
    // End-to-end scenarios
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn write_whole_then_read_whole_and_range() {
        let store = SequenceStore::in_memory();
        let h = store.write(Bytes::from_static(SCENARIO_1.as_bytes())).await.unwrap();
        assert_eq!(h.to_string(), "367b632300f0b2a884310bbc3f91b11f");

        let whole = store.get(Some(&h.to_string())).await.unwrap().unwrap();
        assert_eq!(text(&whole), SCENARIO_1);

        let part = store.get(Some(&format!("{h}[20:35]"))).await.unwrap().unwrap();
        assert_eq!(text(&part), "GCTAGCTGATCGTAG");
        assert_eq!(part.len(), 15);
    }

    #[tokio::test]
    async fn chunked_ingest_then_fetch_each_name() {
        let (mem, store) = counted();
        let ranges: RangeMap =
            serde_json::from_str(r#"{"id1": [5, 15], "id2": [10, 30], "id3": true}"#).unwrap();
        let addresses = store
            .write_chunks(Bytes::from_static(SCENARIO_2.as_bytes()), &ranges)
            .await
            .unwrap();
        assert_eq!(mem.len(), 1);

        let d = addresses["id3"].digest();
        assert!(!addresses["id3"].has_range());
        assert_eq!(addresses["id1"].digest(), d);
        assert_eq!(addresses["id2"].digest(), d);
        assert_eq!(addresses["id1"].to_string(), format!("{d}[5:15]"));

        let map: RequesterMap = addresses
            .iter()
            .map(|(id, a)| (id.clone(), Some(a.to_string())))
            .collect();
        let out = store.get_many(&map).await.unwrap();
        assert_eq!(text(out["id1"].as_ref().unwrap()), "gtacgtacga");
        assert_eq!(text(out["id2"].as_ref().unwrap()), "tacgagcactgcgtagctga");
        assert_eq!(out["id3"].as_ref().unwrap().len(), 76);
        assert_eq!(mem.read_count(), 1);
    }

    #[tokio::test]
    async fn whole_requester_still_gets_exact_sibling_slices() {
        let (mem, store) = counted();
        let h = store.write(Bytes::from_static(SCENARIO_1.as_bytes())).await.unwrap();
        let map = requesters(&[
            ("b1", Some(format!("{h}[0:10]"))),
            ("b2", Some(format!("{h}[5:20]"))),
            ("b3", Some(h.to_string())),
        ]);

        let out = store.get_many(&map).await.unwrap();
        assert_eq!(text(out["b1"].as_ref().unwrap()), &SCENARIO_1[0..10]);
        assert_eq!(text(out["b2"].as_ref().unwrap()), &SCENARIO_1[5..20]);
        assert_eq!(text(out["b3"].as_ref().unwrap()), SCENARIO_1);
        assert_eq!(mem.read_count(), 1);
    }

    #[tokio::test]
    async fn missing_entries_are_null() {
        let store = SequenceStore::in_memory();
        let h = store.write(Bytes::from_static(b"ACGTACGT")).await.unwrap();
        let map = requesters(&[
            ("present", Some(format!("{h}[2:6]"))),
            ("null", None),
            ("empty", Some(String::new())),
            ("malformed", Some(format!("{h}[9:3]"))),
        ]);

        let out = store.get_many(&map).await.unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(text(out["present"].as_ref().unwrap()), "GTAC");
        assert!(out["null"].is_none());
        assert!(out["empty"].is_none());
        assert!(out["malformed"].is_none());
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn get_without_address() {
        let store = SequenceStore::in_memory();
        assert!(store.get(None).await.unwrap().is_none());
        assert!(store.get(Some("")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_missing_digest_is_not_found() {
        let store = SequenceStore::in_memory();
        let absent = ContentHasher::MD5.hash(b"absent").to_string();
        assert!(store.get(Some(&absent)).await.unwrap_err().is_not_found());

        let map = requesters(&[("a", Some(absent))]);
        assert!(store.get_many(&map).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn get_malformed_address_is_validation_error() {
        let store = SequenceStore::in_memory();
        let err = store.get(Some("nope")).await.unwrap_err();
        assert!(matches!(err, SequenceError::Address(TypeError::MalformedAddress(_))));
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn exists_accepts_ranged_address() {
        let store = SequenceStore::in_memory();
        let h = store.write(Bytes::from_static(b"ACGT")).await.unwrap();
        assert!(store.exists(&h.to_string()).await.unwrap());
        assert!(store.exists(&format!("{h}[0:2]")).await.unwrap());
        let other = ContentHasher::MD5.hash(b"other");
        assert!(!store.exists(&other.to_string()).await.unwrap());
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn write_rejects_empty() {
        let store = SequenceStore::in_memory();
        assert!(matches!(
            store.write(Bytes::new()).await.unwrap_err(),
            SequenceError::EmptyContent
        ));
    }

    #[tokio::test]
    async fn write_is_idempotent() {
        let (mem, store) = counted();
        let a = store.write(Bytes::from_static(b"ACGT")).await.unwrap();
        let b = store.write(Bytes::from_static(b"ACGT")).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(mem.write_count(), 1);
    }

    #[tokio::test]
    async fn write_verified_checks_digest() {
        let store = SequenceStore::in_memory();
        let good = ContentHasher::MD5.hash(b"ACGT").to_string();
        assert_eq!(
            store
                .write_verified(&good, Bytes::from_static(b"ACGT"))
                .await
                .unwrap()
                .to_string(),
            good
        );

        let err = store
            .write_verified(&good, Bytes::from_static(b"TTTT"))
            .await
            .unwrap_err();
        assert!(matches!(err, SequenceError::DigestMismatch { .. }));

        let err = store
            .write_verified(&format!("{good}[0:2]"), Bytes::from_static(b"AC"))
            .await
            .unwrap_err();
        assert!(matches!(err, SequenceError::Address(TypeError::MalformedAddress(_))));
    }

    #[tokio::test]
    async fn write_many_skips_empty_and_checks_keys() {
        let (mem, store) = counted();
        let mut entries = BTreeMap::new();
        for s in ["AAAA", "CCCC", "GGGG"] {
            entries.insert(ContentHasher::MD5.hash(s.as_bytes()).to_string(), Bytes::from(s));
        }
        entries.insert(ContentHasher::MD5.hash(b"").to_string(), Bytes::new());
        assert_eq!(store.write_many(entries).await.unwrap(), 3);
        assert_eq!(mem.len(), 3);

        let mut bad = BTreeMap::new();
        bad.insert("not-a-digest".to_string(), Bytes::from_static(b"ACGT"));
        assert!(store.write_many(bad).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn write_many_verifies_before_writing() {
        let (mem, store) = counted();
        let mut entries = BTreeMap::new();
        let good = ContentHasher::MD5.hash(b"ACGT").to_string();
        let liar = ContentHasher::MD5.hash(b"GGGG").to_string();
        entries.insert(good, Bytes::from_static(b"ACGT"));
        entries.insert(liar, Bytes::from_static(b"TTTT"));

        let err = store.write_many(entries).await.unwrap_err();
        assert!(matches!(err, SequenceError::DigestMismatch { .. }));
        assert!(mem.is_empty());
    }

    #[tokio::test]
    async fn write_many_unverified_trusts_keys() {
        let mem = Arc::new(InMemoryContentStore::new());
        let config = SequenceConfig {
            verify_digests: false,
            ..SequenceConfig::in_memory()
        };
        let store = SequenceStore::new(mem.clone(), &config);
        let key = ContentHasher::MD5.hash(b"GGGG").to_string();
        let mut entries = BTreeMap::new();
        entries.insert(key.clone(), Bytes::from_static(b"TTTT"));
        assert_eq!(store.write_many(entries).await.unwrap(), 1);
        assert_eq!(&store.get(Some(&key)).await.unwrap().unwrap()[..], b"TTTT");
    }

    #[tokio::test]
    async fn write_chunks_rejects_out_of_bounds() {
        let (mem, store) = counted();
        let mut ranges = RangeMap::new();
        ranges.insert("x".into(), Span::range(2, 10).unwrap());
        let err = store
            .write_chunks(Bytes::from_static(b"ACGT"), &ranges)
            .await
            .unwrap_err();
        assert!(matches!(err, SequenceError::RangeOutOfBounds { .. }));
        assert!(mem.is_empty());
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn delete_bare_digest_only() {
        let store = SequenceStore::in_memory();
        let h = store.write(Bytes::from_static(b"ACGT")).await.unwrap();
        assert!(store.delete(&format!("{h}[0:2]")).await.unwrap_err().is_validation());
        store.delete(&h.to_string()).await.unwrap();
        assert!(!store.exists(&h.to_string()).await.unwrap());
        assert!(store.delete(&h.to_string()).await.unwrap_err().is_not_found());
    }

    // -----------------------------------------------------------------------
    // Configured backends
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn open_filesystem_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = SequenceConfig {
            backend: BackendConfig::Filesystem {
                root: dir.path().to_path_buf(),
            },
            ..SequenceConfig::default()
        };
        let store = SequenceStore::open(&config).await.unwrap();
        let h = store.write(Bytes::from_static(SCENARIO_1.as_bytes())).await.unwrap();
        assert!(dir.path().join("sequence").join(h.to_hex()).is_file());

        let map = requesters(&[
            ("a", Some(format!("{h}[0:10]"))),
            ("b", Some(format!("{h}[20:35]"))),
        ]);
        let out = store.get_many(&map).await.unwrap();
        assert_eq!(text(out["a"].as_ref().unwrap()), &SCENARIO_1[0..10]);
        assert_eq!(text(out["b"].as_ref().unwrap()), "GCTAGCTGATCGTAG");

        // A second store over the same root sees the same content.
        let reopened = SequenceStore::open(&config).await.unwrap();
        assert!(reopened.exists(&h.to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn open_rejects_invalid_config() {
        let config = SequenceConfig {
            write_batch_size: 0,
            ..SequenceConfig::in_memory()
        };
        assert!(matches!(
            SequenceStore::open(&config).await.unwrap_err(),
            SequenceError::Config(_)
        ));
    }

    #[tokio::test]
    async fn blake3_digests() {
        let config = SequenceConfig {
            digest: DigestAlgorithm::Blake3,
            ..SequenceConfig::in_memory()
        };
        let store = SequenceStore::open(&config).await.unwrap();
        let h = store.write(Bytes::from_static(b"ACGT")).await.unwrap();
        assert_eq!(h, ContentHasher::BLAKE3.hash(b"ACGT"));
        assert_ne!(h, ContentHasher::MD5.hash(b"ACGT"));
        assert_eq!(
            &store.get(Some(&format!("{h}[1:3]"))).await.unwrap().unwrap()[..],
            b"CG"
        );
    }
}
