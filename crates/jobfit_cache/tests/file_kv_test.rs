//! Tests for the filesystem backend.

use jobfit_cache::{CacheLayer, DurableCache, FileKv, KvBackend};
use jobfit_core::{CacheKey, ManualClock, OperationKind};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn test_set_get_delete() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileKv::new(temp_dir.path()).unwrap();

    store.set("jobfit:cache:a:b:jobFit", "payload").await.unwrap();
    assert_eq!(
        store.get("jobfit:cache:a:b:jobFit").await.unwrap().as_deref(),
        Some("payload")
    );

    assert!(store.delete("jobfit:cache:a:b:jobFit").await.unwrap());
    assert!(!store.delete("jobfit:cache:a:b:jobFit").await.unwrap());
    assert!(store.get("jobfit:cache:a:b:jobFit").await.unwrap().is_none());
}

#[tokio::test]
async fn test_keys_returns_original_keys() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileKv::new(temp_dir.path()).unwrap();

    store.set("one", "1").await.unwrap();
    store.set("two/with/slashes", "2").await.unwrap();
    store.set("one", "1 again").await.unwrap();

    let mut keys = store.keys().await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["one", "two/with/slashes"]);
}

#[tokio::test]
async fn test_creates_missing_directory() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("cache").join("v1");
    let store = FileKv::new(&nested).unwrap();

    assert!(nested.is_dir());
    assert_eq!(store.base_path(), nested.as_path());
}

#[tokio::test]
async fn test_durable_cache_over_files_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let clock = ManualClock::default();
    let key = CacheKey::new("userA", "job123", OperationKind::SkillGap);

    {
        let store = Arc::new(FileKv::new(temp_dir.path()).unwrap());
        let cache = DurableCache::new(store, Duration::from_secs(60), 10, Arc::new(clock.clone()));
        cache.set(&key, json!({"missing": ["kubernetes"]}).into()).await;
    }

    let store = Arc::new(FileKv::new(temp_dir.path()).unwrap());
    let cache = DurableCache::new(store, Duration::from_secs(60), 10, Arc::new(clock.clone()));
    let value = cache.get(&key).await.unwrap();
    assert_eq!(value["missing"][0], "kubernetes");
}
