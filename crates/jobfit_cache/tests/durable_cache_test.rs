//! Tests for the durable cache layer.

use jobfit_cache::{CacheLayer, DurableCache, KvBackend, MemoryKv};
use jobfit_core::{AnalysisResult, CacheKey, ManualClock, OperationKind};
use jobfit_error::JobfitResult;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Backend that counts document reads.
#[derive(Debug, Default)]
struct ReadCountingKv {
    inner: MemoryKv,
    reads: AtomicUsize,
}

impl ReadCountingKv {
    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl KvBackend for ReadCountingKv {
    async fn get(&self, key: &str) -> JobfitResult<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> JobfitResult<()> {
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> JobfitResult<bool> {
        self.inner.delete(key).await
    }

    async fn keys(&self) -> JobfitResult<Vec<String>> {
        self.inner.keys().await
    }
}

fn key(resource: &str) -> CacheKey {
    CacheKey::new("userA", resource, OperationKind::CoverLetter)
}

fn durable(store: &MemoryKv, clock: &ManualClock, max_entries: usize) -> DurableCache {
    DurableCache::new(
        Arc::new(store.clone()),
        Duration::from_secs(60),
        max_entries,
        Arc::new(clock.clone()),
    )
}

#[tokio::test]
async fn test_survives_a_new_cache_instance() {
    let store = MemoryKv::new();
    let clock = ManualClock::default();
    let value = AnalysisResult::from(json!({"letter": "Dear hiring manager"}));

    durable(&store, &clock, 10).set(&key("job1"), value.clone()).await;

    // A later session over the same store sees the entry
    let next_session = durable(&store, &clock, 10);
    assert_eq!(next_session.get(&key("job1")).await, Some(value));
}

#[tokio::test]
async fn test_expired_document_is_removed_on_read() {
    let store = MemoryKv::new();
    let clock = ManualClock::default();
    let cache = durable(&store, &clock, 10);

    cache.set(&key("job1"), json!(1).into()).await;
    clock.advance(Duration::from_secs(61));

    assert!(cache.get(&key("job1")).await.is_none());
    assert!(store.keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_capacity_evicts_oldest_document() {
    let store = MemoryKv::new();
    let clock = ManualClock::default();
    let cache = durable(&store, &clock, 3);

    for i in 0..5 {
        cache.set(&key(&format!("job{}", i)), json!(i).into()).await;
    }

    assert_eq!(cache.len().await, 3);
    assert!(cache.get(&key("job0")).await.is_none());
    assert!(cache.get(&key("job1")).await.is_none());
    assert!(cache.get(&key("job4")).await.is_some());
}

#[tokio::test]
async fn test_writes_do_not_read_stored_documents() {
    let backend = Arc::new(ReadCountingKv::default());
    let clock = ManualClock::default();
    let cache = DurableCache::new(backend.clone(), Duration::from_secs(60), 3, Arc::new(clock.clone()));

    for i in 0..10 {
        cache.set(&key(&format!("job{}", i)), json!(i).into()).await;
        clock.advance(Duration::from_millis(1));
    }

    assert_eq!(backend.reads(), 0);
    assert_eq!(cache.len().await, 3);
    assert!(cache.get(&key("job6")).await.is_none());
    assert!(cache.get(&key("job9")).await.is_some());
}

#[tokio::test]
async fn test_capacity_counts_documents_from_a_previous_session() {
    let backend = Arc::new(ReadCountingKv::default());
    let clock = ManualClock::default();
    let previous = DurableCache::new(backend.clone(), Duration::from_secs(60), 3, Arc::new(clock.clone()));
    for i in 0..3 {
        previous.set(&key(&format!("job{}", i)), json!(i).into()).await;
        clock.advance(Duration::from_millis(1));
    }

    let cache = DurableCache::new(backend.clone(), Duration::from_secs(60), 3, Arc::new(clock.clone()));
    cache.set(&key("job3"), json!(3).into()).await;
    // The first write loads the index once
    assert_eq!(backend.reads(), 3);
    cache.set(&key("job4"), json!(4).into()).await;
    assert_eq!(backend.reads(), 3);

    assert_eq!(cache.len().await, 3);
    assert!(cache.get(&key("job0")).await.is_none());
    assert!(cache.get(&key("job1")).await.is_none());
    assert!(cache.get(&key("job2")).await.is_some());
}

#[tokio::test]
async fn test_corrupt_document_is_a_miss_and_removed() {
    let store = MemoryKv::new();
    let clock = ManualClock::default();
    let cache = durable(&store, &clock, 10);

    let storage_key = format!("jobfit:cache:{}", key("job1"));
    store.set(&storage_key, "{not json").await.unwrap();

    assert!(cache.get(&key("job1")).await.is_none());
    assert!(store.get(&storage_key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_namespaces_are_isolated() {
    let store = MemoryKv::new();
    let clock = ManualClock::default();
    let a = durable(&store, &clock, 10).with_namespace("a:");
    let b = durable(&store, &clock, 10).with_namespace("b:");

    a.set(&key("job1"), json!(1).into()).await;

    assert!(b.get(&key("job1")).await.is_none());
    b.clear().await;
    assert!(a.get(&key("job1")).await.is_some());
}

#[tokio::test]
async fn test_sweep_drops_expired_and_trims() {
    let store = MemoryKv::new();
    let clock = ManualClock::default();
    let cache = durable(&store, &clock, 5);

    cache.set(&key("stale"), json!(0).into()).await;
    clock.advance(Duration::from_secs(45));
    for i in 0..4 {
        cache.set(&key(&format!("job{}", i)), json!(i).into()).await;
        clock.advance(Duration::from_millis(5));
    }
    clock.advance(Duration::from_secs(20));

    let report = cache.sweep().await;

    assert_eq!(*report.expired(), 1);
    // 4 live entries are not above 80% of 5
    assert_eq!(*report.evicted(), 0);
    assert_eq!(*report.remaining(), 4);
}
