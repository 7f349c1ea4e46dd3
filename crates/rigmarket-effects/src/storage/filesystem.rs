//! Filesystem-backed key-value storage

use async_trait::async_trait;
use rigmarket_core::effects::{StorageEffects, StorageError};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Filesystem-based storage handler for production use
///
/// Each key maps to `<base>/<key>.dat`. Writes go to a sibling temp file
/// first and are renamed into place, so a crash mid-write leaves the previous
/// value intact.
#[derive(Debug, Clone)]
pub struct FilesystemStorageHandler {
    base_path: PathBuf,
}

impl FilesystemStorageHandler {
    /// Create a handler rooted at `base_path`. The directory is created lazily.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Base directory of this handler
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn file_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey {
                reason: "Key cannot be empty".to_string(),
            });
        }
        if key.contains(['/', '\\']) || key.contains("..") {
            return Err(StorageError::InvalidKey {
                reason: format!("Key {key:?} must not contain path components"),
            });
        }
        Ok(self.base_path.join(format!("{key}.dat")))
    }
}

#[async_trait]
impl StorageEffects for FilesystemStorageHandler {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let file_path = self.file_path(key)?;
        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create directory: {e}"))
        })?;

        let tmp_path = file_path.with_extension("dat.tmp");
        fs::write(&tmp_path, value)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("Failed to write file: {e}")))?;
        fs::rename(&tmp_path, &file_path)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("Failed to replace file: {e}")))?;

        tracing::trace!(key, path = %file_path.display(), "stored value");
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let file_path = self.file_path(key)?;
        match fs::read(&file_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFailed(format!(
                "Failed to read file: {e}"
            ))),
        }
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let file_path = self.file_path(key)?;
        match fs::remove_file(&file_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to remove file: {e}"
            ))),
        }
    }
}
