use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use seqstore_crypto::DigestAlgorithm;

use crate::error::{SequenceError, SequenceResult};

/// Writes issued concurrently per batch unless configured otherwise.
pub const DEFAULT_WRITE_BATCH_SIZE: usize = 50;

/// Which physical store holds sequence content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    Memory,
    Filesystem { root: PathBuf },
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Filesystem {
            root: PathBuf::from("storage"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub backend: BackendConfig,
    pub digest: DigestAlgorithm,
    pub write_batch_size: usize,
    pub verify_digests: bool,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            digest: DigestAlgorithm::Md5,
            write_batch_size: DEFAULT_WRITE_BATCH_SIZE,
            verify_digests: true,
        }
    }
}

impl SequenceConfig {
    /// In-memory store with otherwise default settings.
    pub fn in_memory() -> Self {
        Self {
            backend: BackendConfig::Memory,
            ..Self::default()
        }
    }

    pub fn from_toml_str(s: &str) -> SequenceResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| SequenceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> SequenceResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SequenceError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> SequenceResult<()> {
        if self.write_batch_size == 0 {
            return Err(SequenceError::Config(
                "write_batch_size must be greater than zero".into(),
            ));
        }
        if let BackendConfig::Filesystem { root } = &self.backend {
            if root.as_os_str().is_empty() {
                return Err(SequenceError::Config(
                    "filesystem backend requires a root directory".into(),
                ));
            }
        }
        Ok(())
    }
}
