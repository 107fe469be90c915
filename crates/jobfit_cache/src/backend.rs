//! Durable key-value backends.

use jobfit_error::JobfitResult;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// String key-value store behind the durable cache layer.
///
/// Backends only move strings; expiry and eviction are layered on top by
/// [`DurableCache`](crate::DurableCache).
#[async_trait::async_trait]
pub trait KvBackend: Send + Sync + std::fmt::Debug {
    /// Read a value.
    async fn get(&self, key: &str) -> JobfitResult<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> JobfitResult<()>;

    /// Remove a value. Returns whether it existed.
    async fn delete(&self, key: &str) -> JobfitResult<bool>;

    /// Every stored key.
    async fn keys(&self) -> JobfitResult<Vec<String>>;
}

/// In-memory backend.
///
/// Clones share storage, which makes it a stand-in for a store that outlives one
/// cache instance.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKv {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KvBackend for MemoryKv {
    async fn get(&self, key: &str) -> JobfitResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> JobfitResult<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> JobfitResult<bool> {
        Ok(self.entries.lock().await.remove(key).is_some())
    }

    async fn keys(&self) -> JobfitResult<Vec<String>> {
        Ok(self.entries.lock().await.keys().cloned().collect())
    }
}
