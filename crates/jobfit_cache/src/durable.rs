//! Durable cache layer.
//!
//! Stores each entry as a JSON document in a [`KvBackend`] under a namespace
//! prefix, so entries survive the process and several caches can share a store.
//! Expiry and capacity follow the same rules as the memory layer. A backend
//! failure is logged and treated as a miss.
//!
//! Capacity is enforced from an in-memory index of document ages. The index is
//! built from the backend on first write and rebuilt by every sweep, so writes
//! never scan the store.

use crate::entry::sweep_eviction_count;
use crate::{CacheEntry, CacheLayer, KvBackend, SweepReport};
use chrono::{DateTime, Utc};
use jobfit_core::{AnalysisResult, CacheConfig, CacheKey, SharedClock, to_chrono};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Default namespace for cache documents.
pub const DEFAULT_NAMESPACE: &str = "jobfit:cache:";

/// Storage key to `(created_at, seq)` for every document in the namespace.
type AgeIndex = HashMap<String, (DateTime<Utc>, u64)>;

/// TTL cache persisted through a [`KvBackend`].
#[derive(Debug)]
pub struct DurableCache {
    backend: Arc<dyn KvBackend>,
    namespace: String,
    ttl: Duration,
    max_entries: usize,
    clock: SharedClock,
    // Serializes read-modify-write sequences; `None` until the index is loaded.
    index: Mutex<Option<AgeIndex>>,
    next_seq: AtomicU64,
}

impl DurableCache {
    /// Create a durable layer over `backend`.
    pub fn new(
        backend: Arc<dyn KvBackend>,
        ttl: Duration,
        max_entries: usize,
        clock: SharedClock,
    ) -> Self {
        debug!(
            ttl_ms = ttl.as_millis() as u64,
            max_entries, "Creating new DurableCache"
        );
        Self {
            backend,
            namespace: DEFAULT_NAMESPACE.to_string(),
            ttl,
            max_entries: max_entries.max(1),
            clock,
            index: Mutex::new(None),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Create a durable layer from the cache section of the configuration.
    pub fn from_config(config: &CacheConfig, backend: Arc<dyn KvBackend>, clock: SharedClock) -> Self {
        Self::new(backend, config.ttl(), *config.durable_max_entries(), clock)
    }

    /// Use a different key prefix in the backend.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Configured capacity.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    fn storage_key(&self, key: &CacheKey) -> String {
        format!("{}{}", self.namespace, key)
    }

    /// Number of stored documents in this namespace, including expired ones.
    pub async fn len(&self) -> usize {
        self.namespaced_keys().await.len()
    }

    /// Whether the namespace holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn namespaced_keys(&self) -> Vec<String> {
        match self.backend.keys().await {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| k.starts_with(&self.namespace))
                .collect(),
            Err(e) => {
                warn!(error = %e, "Durable cache backend failed to list keys");
                Vec::new()
            }
        }
    }

    async fn read(&self, storage_key: &str) -> Option<CacheEntry> {
        let raw = match self.backend.get(storage_key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = storage_key, error = %e, "Durable cache read failed");
                return None;
            }
        };
        match CacheEntry::from_document(storage_key, &raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key = storage_key, error = %e, "Removing corrupt durable cache entry");
                self.remove(storage_key).await;
                None
            }
        }
    }

    async fn remove(&self, storage_key: &str) -> bool {
        match self.backend.delete(storage_key).await {
            Ok(existed) => existed,
            Err(e) => {
                warn!(key = storage_key, error = %e, "Durable cache delete failed");
                false
            }
        }
    }

    async fn load_all(&self) -> Vec<(String, CacheEntry)> {
        let mut entries = Vec::new();
        for storage_key in self.namespaced_keys().await {
            if let Some(entry) = self.read(&storage_key).await {
                entries.push((storage_key, entry));
            }
        }
        entries
    }

    fn build_index<'a>(&self, entries: impl Iterator<Item = &'a (String, CacheEntry)>) -> AgeIndex {
        let index: AgeIndex = entries
            .map(|(storage_key, entry)| (storage_key.clone(), entry.age_order()))
            .collect();
        if let Some((_, seq)) = index.values().max_by_key(|(_, seq)| *seq) {
            self.next_seq.fetch_max(seq + 1, Ordering::SeqCst);
        }
        index
    }

    async fn loaded_index<'a>(&self, slot: &'a mut Option<AgeIndex>) -> &'a mut AgeIndex {
        if slot.is_none() {
            let entries = self.load_all().await;
            let index = self.build_index(entries.iter());
            debug!(documents = index.len(), "Loaded durable cache index");
            *slot = Some(index);
        }
        slot.get_or_insert_with(AgeIndex::new)
    }

    async fn evict(&self, index: &mut AgeIndex, count: usize) -> usize {
        let mut ordered: Vec<(&String, &(DateTime<Utc>, u64))> = index.iter().collect();
        ordered.sort_by_key(|(_, age)| **age);
        let victims: Vec<String> = ordered
            .into_iter()
            .take(count)
            .map(|(storage_key, _)| storage_key.clone())
            .collect();

        let mut evicted = 0;
        for storage_key in victims {
            debug!(key = %storage_key, "Evicting oldest durable entry");
            if self.remove(&storage_key).await {
                evicted += 1;
            }
            index.remove(&storage_key);
        }
        evicted
    }

    /// Fetch a live entry with its timestamps, removing it if expired.
    pub(crate) async fn get_entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        let storage_key = self.storage_key(key);
        let mut slot = self.index.lock().await;

        let Some(entry) = self.read(&storage_key).await else {
            forget(&mut slot, &storage_key);
            return None;
        };
        if entry.is_expired_at(self.clock.now()) {
            debug!(key = %key, "Durable entry expired, removing");
            self.remove(&storage_key).await;
            forget(&mut slot, &storage_key);
            return None;
        }
        Some(entry)
    }
}

fn forget(slot: &mut Option<AgeIndex>, storage_key: &str) {
    if let Some(index) = slot.as_mut() {
        index.remove(storage_key);
    }
}

#[async_trait::async_trait]
impl CacheLayer for DurableCache {
    #[tracing::instrument(skip(self), fields(key = %key))]
    async fn get(&self, key: &CacheKey) -> Option<AnalysisResult> {
        let entry = self.get_entry(key).await?;
        debug!("Durable cache hit");
        Some(entry.into_value())
    }

    #[tracing::instrument(skip(self, value), fields(key = %key))]
    async fn set(&self, key: &CacheKey, value: AnalysisResult) {
        let storage_key = self.storage_key(key);
        let mut slot = self.index.lock().await;
        let index = self.loaded_index(&mut slot).await;

        if !index.contains_key(&storage_key) && index.len() >= self.max_entries {
            let excess = index.len() + 1 - self.max_entries;
            self.evict(index, excess).await;
        }

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let entry = CacheEntry::new(key.clone(), value, self.clock.now(), to_chrono(self.ttl), seq);
        let document = match entry.to_document(&storage_key) {
            Ok(document) => document,
            Err(e) => {
                warn!(error = %e, "Failed to encode durable cache entry");
                return;
            }
        };
        match self.backend.set(&storage_key, &document).await {
            Ok(()) => {
                index.insert(storage_key, entry.age_order());
            }
            Err(e) => warn!(error = %e, "Durable cache write failed"),
        }
    }

    async fn has(&self, key: &CacheKey) -> bool {
        self.get_entry(key).await.is_some()
    }

    async fn delete(&self, key: &CacheKey) -> bool {
        let storage_key = self.storage_key(key);
        let mut slot = self.index.lock().await;
        forget(&mut slot, &storage_key);
        self.remove(&storage_key).await
    }

    async fn clear(&self) {
        let mut slot = self.index.lock().await;
        let keys = self.namespaced_keys().await;
        let mut cleared = 0;
        for storage_key in &keys {
            if self.remove(storage_key).await {
                cleared += 1;
            }
        }
        *slot = Some(AgeIndex::new());
        info!(cleared, "Cleared durable cache");
    }

    async fn sweep(&self) -> SweepReport {
        let mut slot = self.index.lock().await;
        let now = self.clock.now();

        let mut live = Vec::new();
        let mut expired = 0;
        for (storage_key, entry) in self.load_all().await {
            if entry.is_expired_at(now) {
                if self.remove(&storage_key).await {
                    expired += 1;
                }
            } else {
                live.push((storage_key, entry));
            }
        }

        let mut index = self.build_index(live.iter());
        let excess = sweep_eviction_count(index.len(), self.max_entries);
        let evicted = self.evict(&mut index, excess).await;
        let remaining = index.len();
        *slot = Some(index);

        if expired > 0 || evicted > 0 {
            info!(expired, evicted, remaining, "Swept durable cache");
        }
        SweepReport::new(expired, evicted, remaining)
    }
}
