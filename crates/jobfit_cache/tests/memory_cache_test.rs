//! Tests for the in-process cache layer.

use jobfit_cache::{CacheLayer, MemoryCache, spawn_cache_sweeper};
use jobfit_core::{AnalysisResult, CacheKey, ManualClock, OperationKind};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn key(resource: &str) -> CacheKey {
    CacheKey::new("userA", resource, OperationKind::JobFit)
}

fn cache(ttl_secs: u64, max_entries: usize) -> (MemoryCache, ManualClock) {
    let clock = ManualClock::default();
    let cache = MemoryCache::new(
        Duration::from_secs(ttl_secs),
        max_entries,
        Arc::new(clock.clone()),
    );
    (cache, clock)
}

#[tokio::test]
async fn test_set_then_get_returns_value() {
    let (cache, _clock) = cache(60, 10);
    let value = AnalysisResult::from(json!({"score": 82}));

    cache.set(&key("job123"), value.clone()).await;

    assert_eq!(cache.get(&key("job123")).await, Some(value));
    assert!(cache.has(&key("job123")).await);
}

#[tokio::test]
async fn test_miss() {
    let (cache, _clock) = cache(60, 10);
    assert!(cache.get(&key("job123")).await.is_none());
    assert!(!cache.has(&key("job123")).await);
}

#[tokio::test]
async fn test_expired_entry_is_absent_without_sweep() {
    let (cache, clock) = cache(60, 10);
    cache.set(&key("job123"), json!({"score": 1}).into()).await;

    // Exactly at expiry the entry is still live
    clock.advance(Duration::from_secs(60));
    assert!(cache.get(&key("job123")).await.is_some());

    clock.advance(Duration::from_millis(1));
    assert!(cache.get(&key("job123")).await.is_none());
    // Lazily removed on read
    assert_eq!(cache.len().await, 0);
}

#[tokio::test]
async fn test_capacity_keeps_most_recent_inserts() {
    let (cache, _clock) = cache(60, 3);

    for i in 0..10 {
        cache.set(&key(&format!("job{}", i)), json!({"i": i}).into()).await;
    }

    assert!(cache.len().await <= 3);
    for i in 0..7 {
        assert!(cache.get(&key(&format!("job{}", i))).await.is_none(), "job{} should be evicted", i);
    }
    for i in 7..10 {
        assert!(cache.get(&key(&format!("job{}", i))).await.is_some(), "job{} should be kept", i);
    }
}

#[tokio::test]
async fn test_eviction_is_by_insertion_age_not_use() {
    let (cache, clock) = cache(600, 2);

    cache.set(&key("old"), json!(1).into()).await;
    clock.advance(Duration::from_secs(1));
    cache.set(&key("new"), json!(2).into()).await;

    // Reading "old" does not protect it
    assert!(cache.get(&key("old")).await.is_some());

    clock.advance(Duration::from_secs(1));
    cache.set(&key("newest"), json!(3).into()).await;

    assert!(cache.get(&key("old")).await.is_none());
    assert!(cache.get(&key("new")).await.is_some());
    assert!(cache.get(&key("newest")).await.is_some());
}

#[tokio::test]
async fn test_overwrite_at_capacity_does_not_evict() {
    let (cache, _clock) = cache(60, 2);
    cache.set(&key("a"), json!(1).into()).await;
    cache.set(&key("b"), json!(2).into()).await;
    cache.set(&key("a"), json!(3).into()).await;

    assert_eq!(cache.len().await, 2);
    assert_eq!(cache.get(&key("a")).await, Some(json!(3).into()));
    assert!(cache.get(&key("b")).await.is_some());
}

#[tokio::test]
async fn test_delete_and_clear() {
    let (cache, _clock) = cache(60, 10);
    cache.set(&key("a"), json!(1).into()).await;
    cache.set(&key("b"), json!(2).into()).await;

    assert!(cache.delete(&key("a")).await);
    assert!(!cache.delete(&key("a")).await);
    assert!(cache.get(&key("a")).await.is_none());

    cache.clear().await;
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_sweep_removes_expired_entries() {
    let (cache, clock) = cache(60, 100);
    cache.set(&key("stale"), json!(1).into()).await;
    clock.advance(Duration::from_secs(30));
    cache.set(&key("fresh"), json!(2).into()).await;
    clock.advance(Duration::from_secs(31));

    let report = cache.sweep().await;

    assert_eq!(*report.expired(), 1);
    assert_eq!(*report.evicted(), 0);
    assert_eq!(*report.remaining(), 1);
    assert!(cache.get(&key("fresh")).await.is_some());
}

#[tokio::test]
async fn test_sweep_trims_oldest_fifth_above_high_water() {
    let (cache, clock) = cache(600, 10);
    for i in 0..10 {
        cache.set(&key(&format!("job{}", i)), json!(i).into()).await;
        clock.advance(Duration::from_millis(10));
    }

    let report = cache.sweep().await;

    assert_eq!(*report.expired(), 0);
    assert_eq!(*report.evicted(), 2);
    assert_eq!(cache.len().await, 8);
    assert!(cache.get(&key("job0")).await.is_none());
    assert!(cache.get(&key("job1")).await.is_none());
    assert!(cache.get(&key("job2")).await.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_background_sweeper_runs_without_traffic() {
    let clock = ManualClock::default();
    let cache = Arc::new(MemoryCache::new(
        Duration::from_secs(60),
        10,
        Arc::new(clock.clone()),
    ));
    cache.set(&key("a"), json!(1).into()).await;
    clock.advance(Duration::from_secs(120));

    let handle = spawn_cache_sweeper("test", &cache, Duration::from_secs(300));
    tokio::time::sleep(Duration::from_secs(301)).await;

    assert_eq!(cache.len().await, 0);
    handle.stop().await;
}

#[tokio::test]
async fn test_concurrent_writers_respect_capacity() {
    let clock = ManualClock::default();
    let cache = Arc::new(MemoryCache::new(Duration::from_secs(60), 16, Arc::new(clock)));

    let mut tasks = Vec::new();
    for t in 0..8 {
        let cache = cache.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..50 {
                cache.set(&key(&format!("t{}-{}", t, i)), json!(i).into()).await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert!(cache.len().await <= 16);
}
