//! In-process cache layer.

use crate::entry::{oldest_keys, sweep_eviction_count};
use crate::{CacheEntry, CacheLayer, SweepReport};
use jobfit_core::{AnalysisResult, CacheConfig, CacheKey, SharedClock, to_chrono};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<CacheKey, CacheEntry>,
    next_seq: u64,
}

impl MemoryState {
    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn evict_oldest(&mut self) {
        if let Some(key) = oldest_keys(self.entries.values(), 1).into_iter().next() {
            tracing::debug!(key = %key, "Evicting oldest entry");
            self.entries.remove(&key);
        }
    }
}

/// Bounded in-process TTL cache.
///
/// A single mutex guards the map, so expiry checks and evictions are atomic with
/// respect to concurrent operations on the same key. Eviction is by age of
/// insertion, not by recency of use.
///
/// # Example
///
/// ```
/// use jobfit_cache::{CacheLayer, MemoryCache};
/// use jobfit_core::{AnalysisResult, CacheKey, OperationKind, SystemClock};
/// use serde_json::json;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache = MemoryCache::new(Duration::from_secs(60), 100, Arc::new(SystemClock));
/// let key = CacheKey::new("userA", "job123", OperationKind::JobFit);
///
/// cache.set(&key, AnalysisResult::from(json!({"score": 82}))).await;
/// assert_eq!(cache.get(&key).await.unwrap()["score"], 82);
/// # }
/// ```
#[derive(Debug)]
pub struct MemoryCache {
    state: Mutex<MemoryState>,
    ttl: Duration,
    max_entries: usize,
    clock: SharedClock,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new(ttl: Duration, max_entries: usize, clock: SharedClock) -> Self {
        tracing::debug!(
            ttl_ms = ttl.as_millis() as u64,
            max_entries,
            "Creating new MemoryCache"
        );
        Self {
            state: Mutex::new(MemoryState::default()),
            ttl,
            max_entries: max_entries.max(1),
            clock,
        }
    }

    /// Create a cache from the cache section of the configuration.
    pub fn from_config(config: &CacheConfig, clock: SharedClock) -> Self {
        Self::new(config.ttl(), *config.max_entries(), clock)
    }

    /// Physical entry count, including expired entries not yet swept.
    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.entries.is_empty()
    }

    /// Configured capacity.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Insert an existing entry, keeping its timestamps.
    ///
    /// Used when promoting a durable hit so the in-memory copy expires no later
    /// than the durable original.
    pub(crate) async fn insert_entry(&self, entry: CacheEntry) {
        let now = self.clock.now();
        if entry.is_expired_at(now) {
            return;
        }
        let mut state = self.state.lock().await;
        if state.entries.len() >= self.max_entries && !state.entries.contains_key(entry.key()) {
            state.evict_oldest();
        }
        let seq = state.next_seq();
        let entry = entry.with_seq(seq);
        state.entries.insert(entry.key().clone(), entry);
    }
}

#[async_trait::async_trait]
impl CacheLayer for MemoryCache {
    #[tracing::instrument(skip(self), fields(key = %key))]
    async fn get(&self, key: &CacheKey) -> Option<AnalysisResult> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        let entry = state.entries.get(key)?;
        if entry.is_expired_at(now) {
            tracing::debug!("Cache entry expired, removing");
            state.entries.remove(key);
            return None;
        }

        tracing::debug!(time_remaining = ?entry.time_remaining(now), "Cache hit");
        Some(entry.value().clone())
    }

    #[tracing::instrument(skip(self, value), fields(key = %key))]
    async fn set(&self, key: &CacheKey, value: AnalysisResult) {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        if state.entries.len() >= self.max_entries && !state.entries.contains_key(key) {
            state.evict_oldest();
        }

        let seq = state.next_seq();
        let entry = CacheEntry::new(key.clone(), value, now, to_chrono(self.ttl), seq);
        state.entries.insert(key.clone(), entry);
        tracing::debug!(cache_size = state.entries.len(), "Inserted entry into cache");
    }

    async fn has(&self, key: &CacheKey) -> bool {
        self.get(key).await.is_some()
    }

    async fn delete(&self, key: &CacheKey) -> bool {
        self.state.lock().await.entries.remove(key).is_some()
    }

    async fn clear(&self) {
        let mut state = self.state.lock().await;
        let count = state.entries.len();
        state.entries.clear();
        tracing::info!(cleared = count, "Cleared memory cache");
    }

    async fn sweep(&self) -> SweepReport {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired_at(now));
        let expired = before - state.entries.len();

        let excess = sweep_eviction_count(state.entries.len(), self.max_entries);
        let victims = oldest_keys(state.entries.values(), excess);
        for key in &victims {
            state.entries.remove(key);
        }

        if expired > 0 || !victims.is_empty() {
            tracing::info!(
                expired,
                evicted = victims.len(),
                remaining = state.entries.len(),
                "Swept memory cache"
            );
        }
        SweepReport::new(expired, victims.len(), state.entries.len())
    }
}
