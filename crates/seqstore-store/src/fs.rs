use std::io::{ErrorKind, SeekFrom, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use seqstore_types::{RealDigest, Span};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::{StoreError, StoreResult};
use crate::traits::ContentStore;

/// Local-filesystem content store.
///
/// Each digest is one file at `<root>/sequence/<hex-digest>`. New content is
/// written to a temp file in the same directory and then linked into place
/// without clobbering, so a reader never sees a partial file and racing
/// writers of the same digest both succeed.
#[derive(Clone, Debug)]
pub struct FsContentStore {
    root: PathBuf,
    dir: PathBuf,
}

impl FsContentStore {
    /// Subdirectory under the root that holds sequence files.
    pub const SEQUENCE_DIR: &'static str = "sequence";

    /// Open (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        let dir = root.join(Self::SEQUENCE_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!(root = %root.display(), "opened filesystem sequence store");
        Ok(Self { root, dir })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `digest`.
    pub fn path_for(&self, digest: &RealDigest) -> PathBuf {
        self.dir.join(digest.to_hex())
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn exists(&self, digest: &RealDigest) -> StoreResult<bool> {
        match tokio::fs::metadata(self.path_for(digest)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn read(&self, digest: &RealDigest, span: Span) -> StoreResult<Bytes> {
        let path = self.path_for(digest);
        let mut file = match tokio::fs::File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(*digest))
            }
            Err(e) => return Err(e.into()),
        };

        let mut buf = Vec::new();
        match span {
            Span::Whole => {
                file.read_to_end(&mut buf).await?;
            }
            Span::Range(range) => {
                // Seeking past EOF is allowed; the read then yields nothing.
                file.seek(SeekFrom::Start(range.start())).await?;
                file.take(range.len()).read_to_end(&mut buf).await?;
            }
        }
        tracing::trace!(digest = %digest, %span, bytes = buf.len(), "read sequence");
        Ok(Bytes::from(buf))
    }

    async fn write(&self, digest: &RealDigest, content: Bytes) -> StoreResult<()> {
        let path = self.path_for(digest);
        if self.exists(digest).await? {
            tracing::debug!(digest = %digest, "sequence already stored, skipping write");
            return Ok(());
        }

        let dir = self.dir.clone();
        let digest = *digest;
        tokio::task::spawn_blocking(move || -> StoreResult<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(&content)?;
            tmp.flush()?;
            match tmp.persist_noclobber(&path) {
                Ok(_) => {
                    tracing::debug!(digest = %digest, bytes = content.len(), "wrote sequence");
                    Ok(())
                }
                // Another writer got there first with identical content.
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(()),
                Err(e) => Err(e.error.into()),
            }
        })
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?
    }

    async fn delete(&self, digest: &RealDigest) -> StoreResult<()> {
        match tokio::fs::remove_file(self.path_for(digest)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(*digest)),
            Err(e) => Err(e.into()),
        }
    }
}
