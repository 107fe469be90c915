//! Memory-over-durable cache composition.

use crate::layer::sweep_weak;
use crate::{CacheLayer, DurableCache, KvBackend, MemoryCache, SweepReport};
use jobfit_core::{AnalysisResult, CacheConfig, CacheKey, SharedClock, SweepHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Two-layer cache: fast in-process memory in front of a durable store.
///
/// - `set` writes through to both layers.
/// - `get` reads memory first; on a memory miss it reads the durable layer and
///   promotes a hit into memory, keeping the original expiry.
/// - `has` is true if either layer holds a live value.
/// - `delete` and `clear` always act on both layers.
///
/// # Example
///
/// ```
/// use jobfit_cache::{CacheLayer, HybridCache, MemoryKv};
/// use jobfit_core::{AnalysisResult, CacheConfig, CacheKey, OperationKind, SystemClock};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache = HybridCache::from_config(
///     &CacheConfig::default(),
///     Arc::new(MemoryKv::new()),
///     Arc::new(SystemClock),
/// );
/// let key = CacheKey::new("userA", "job123", OperationKind::JobFit);
/// cache.set(&key, AnalysisResult::from(json!({"score": 82}))).await;
/// assert!(cache.has(&key).await);
/// # }
/// ```
#[derive(Debug)]
pub struct HybridCache {
    memory: MemoryCache,
    durable: DurableCache,
    sweeper: Mutex<Option<SweepHandle>>,
}

impl HybridCache {
    /// Compose two layers. No background sweep is started.
    pub fn new(memory: MemoryCache, durable: DurableCache) -> Self {
        Self {
            memory,
            durable,
            sweeper: Mutex::new(None),
        }
    }

    /// Build both layers from configuration. No background sweep is started.
    pub fn from_config(
        config: &CacheConfig,
        backend: Arc<dyn KvBackend>,
        clock: SharedClock,
    ) -> Self {
        Self::new(
            MemoryCache::from_config(config, clock.clone()),
            DurableCache::from_config(config, backend, clock),
        )
    }

    /// Build both layers and start a background sweep every `sweep_interval`.
    ///
    /// The sweep task holds a weak reference; stop it with [`shutdown`](Self::shutdown)
    /// or let it end when the cache is dropped. Must be called within a tokio runtime.
    pub fn spawn(
        config: &CacheConfig,
        backend: Arc<dyn KvBackend>,
        clock: SharedClock,
    ) -> Arc<Self> {
        let interval = config.sweep_interval();
        let memory = MemoryCache::from_config(config, clock.clone());
        let durable = DurableCache::from_config(config, backend, clock);
        Arc::new_cyclic(|weak| {
            let handle = sweep_weak("hybrid_cache", weak.clone(), interval);
            Self {
                memory,
                durable,
                sweeper: Mutex::new(Some(handle)),
            }
        })
    }

    /// Start a background sweep on an existing cache, replacing any running one.
    pub async fn start_sweeper(self: &Arc<Self>, interval: Duration) {
        let handle = sweep_weak("hybrid_cache", Arc::downgrade(self), interval);
        let previous = self.sweeper.lock().await.replace(handle);
        if let Some(previous) = previous {
            previous.stop().await;
        }
    }

    /// Stop the background sweep, if any, and wait for it to exit.
    pub async fn shutdown(&self) {
        let handle = self.sweeper.lock().await.take();
        if let Some(handle) = handle {
            handle.stop().await;
            debug!("Hybrid cache sweeper stopped");
        }
    }

    /// The in-process layer.
    pub fn memory(&self) -> &MemoryCache {
        &self.memory
    }

    /// The durable layer.
    pub fn durable(&self) -> &DurableCache {
        &self.durable
    }
}

#[async_trait::async_trait]
impl CacheLayer for HybridCache {
    #[tracing::instrument(skip(self), fields(key = %key))]
    async fn get(&self, key: &CacheKey) -> Option<AnalysisResult> {
        if let Some(value) = self.memory.get(key).await {
            debug!(layer = "memory", "Hybrid cache hit");
            return Some(value);
        }

        let entry = self.durable.get_entry(key).await?;
        debug!(layer = "durable", "Hybrid cache hit, promoting to memory");
        let value = entry.value().clone();
        self.memory.insert_entry(entry).await;
        Some(value)
    }

    async fn set(&self, key: &CacheKey, value: AnalysisResult) {
        self.memory.set(key, value.clone()).await;
        self.durable.set(key, value).await;
    }

    async fn has(&self, key: &CacheKey) -> bool {
        self.memory.has(key).await || self.durable.has(key).await
    }

    async fn delete(&self, key: &CacheKey) -> bool {
        let from_memory = self.memory.delete(key).await;
        let from_durable = self.durable.delete(key).await;
        from_memory || from_durable
    }

    async fn clear(&self) {
        self.memory.clear().await;
        self.durable.clear().await;
    }

    async fn sweep(&self) -> SweepReport {
        let memory = self.memory.sweep().await;
        let durable = self.durable.sweep().await;
        memory.merge(durable)
    }
}
