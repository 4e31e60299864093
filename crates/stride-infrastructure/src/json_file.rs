//! File-backed key-value store, one file per key.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use stride_core::error::StorageError;
use stride_core::storage::KvStore;

use crate::paths::StridePaths;

/// A [`KvStore`] that keeps each key in its own file under one directory.
///
/// Values are stored as JSON strings so every file on disk is valid JSON
/// regardless of what the caller writes. Writes go to a sibling temp file
/// first and are moved into place with a rename, so readers never observe
/// a half-written value.
pub struct JsonFileKvStore {
    dir: PathBuf,
}

impl JsonFileKvStore {
    /// Opens (and creates if needed) a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Opens the store at the platform default location.
    pub fn default_location() -> Result<Self, StorageError> {
        Self::new(StridePaths::storage_dir()?)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize(key)))
    }
}

/// Restricts file names to a portable character set.
fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl KvStore for JsonFileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.file_for(key);
        match fs::read_to_string(&path).await {
            Ok(raw) => {
                let value: String = serde_json::from_str(&raw)?;
                Ok(Some(value))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.file_for(key);
        let tmp = path.with_extension("json.tmp");
        let encoded = serde_json::to_string(value)?;
        fs::write(&tmp, encoded).await?;
        fs::rename(&tmp, &path).await?;
        debug!(key, path = %path.display(), "persisted value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.file_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
