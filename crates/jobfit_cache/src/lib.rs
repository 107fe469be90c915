//! Dual-layer TTL cache for analysis results.
//!
//! Identical analysis requests are answered from cache instead of the upstream
//! model. The [`HybridCache`] keeps a bounded in-process [`MemoryCache`] in front
//! of a [`DurableCache`] that persists through any [`KvBackend`], so results
//! survive restarts and are shared between processes using the same store.
//!
//! All layers implement [`CacheLayer`]. Expired entries are never returned, and
//! every layer is bounded: writes evict the oldest entry at capacity, and a
//! periodic sweep drops expired entries and trims by age.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod durable;
mod entry;
mod file;
mod hybrid;
mod layer;
mod memory;

pub use backend::{KvBackend, MemoryKv};
pub use durable::{DEFAULT_NAMESPACE, DurableCache};
pub use entry::{CacheEntry, SWEEP_EVICT_FRACTION, SWEEP_HIGH_WATER, SweepReport};
pub use file::FileKv;
pub use hybrid::HybridCache;
pub use layer::{CacheLayer, spawn_cache_sweeper};
pub use memory::MemoryCache;
