//! Platform path resolution for locally persisted client state.

use std::path::PathBuf;

use stride_core::error::StorageError;

/// Path management for the Stride client.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/stride/            # Config directory
/// └── storage/                 # Key-value files (JsonFileKvStore)
/// ```
pub struct StridePaths;

impl StridePaths {
    /// Returns the Stride configuration directory.
    pub fn config_dir() -> Result<PathBuf, StorageError> {
        dirs::config_dir()
            .map(|dir| dir.join("stride"))
            .ok_or_else(|| StorageError::Io {
                message: "cannot determine config directory".to_string(),
            })
    }

    /// Returns the directory backing the file key-value store.
    pub fn storage_dir() -> Result<PathBuf, StorageError> {
        Ok(Self::config_dir()?.join("storage"))
    }
}
