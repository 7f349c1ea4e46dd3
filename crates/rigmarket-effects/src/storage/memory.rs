//! In-memory storage handler

use async_trait::async_trait;
use parking_lot::RwLock;
use rigmarket_core::effects::{StorageEffects, StorageError};
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory storage handler for tests and previews
///
/// Clones share the same map. Individual keys can be made to fail writes to
/// exercise persistence error paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageHandler {
    data: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    fail_writes: Arc<RwLock<bool>>,
}

impl MemoryStorageHandler {
    /// Create an empty handler
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `store` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.write() = fail;
    }

    /// Raw value under `key`, bypassing the async interface
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.data.read().get(key).cloned()
    }

    /// Put a raw value under `key`, bypassing the async interface
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.data.write().insert(key.into(), value.into());
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

#[async_trait]
impl StorageEffects for MemoryStorageHandler {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        if *self.fail_writes.read() {
            return Err(StorageError::WriteFailed(format!(
                "memory storage configured to reject writes (key {key})"
            )));
        }
        self.data.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.data.read().get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.data.write().remove(key).is_some())
    }
}
