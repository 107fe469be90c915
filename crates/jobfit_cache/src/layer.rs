//! The interface shared by every cache layer.

use crate::SweepReport;
use jobfit_core::{AnalysisResult, CacheKey, SweepHandle, spawn_sweeper};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::debug;

/// TTL cache of analysis results.
///
/// Implementations never return an expired value: `get` and `has` check expiry and
/// drop stale entries on the spot, whether or not a sweep has run.
#[async_trait::async_trait]
pub trait CacheLayer: Send + Sync {
    /// Fetch a live value.
    async fn get(&self, key: &CacheKey) -> Option<AnalysisResult>;

    /// Store a value with the layer's TTL, evicting the oldest entry when full.
    async fn set(&self, key: &CacheKey, value: AnalysisResult);

    /// Whether a live value exists.
    async fn has(&self, key: &CacheKey) -> bool;

    /// Remove a value. Returns whether anything was removed.
    async fn delete(&self, key: &CacheKey) -> bool;

    /// Remove every value.
    async fn clear(&self);

    /// Drop expired entries and trim by age when above the high-water mark.
    async fn sweep(&self) -> SweepReport;
}

/// Run `layer.sweep()` every `interval` on a background task.
///
/// The task holds only a weak reference and ends once the layer is dropped.
pub fn spawn_cache_sweeper<L>(name: &'static str, layer: &Arc<L>, interval: Duration) -> SweepHandle
where
    L: CacheLayer + 'static,
{
    let weak = Arc::downgrade(layer);
    sweep_weak(name, weak, interval)
}

pub(crate) fn sweep_weak<L>(name: &'static str, weak: Weak<L>, interval: Duration) -> SweepHandle
where
    L: CacheLayer + 'static,
{
    spawn_sweeper(name, interval, move || {
        let weak = weak.clone();
        async move {
            let Some(layer) = weak.upgrade() else {
                return false;
            };
            let report = layer.sweep().await;
            debug!(
                name,
                expired = report.expired(),
                evicted = report.evicted(),
                remaining = report.remaining(),
                "Cache sweep complete"
            );
            true
        }
    })
}
