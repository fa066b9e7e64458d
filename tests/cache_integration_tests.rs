//! Integration Tests for the Cache Engine
//!
//! Tests the public API end to end: eviction, expiry, read-through loading,
//! the reaper lifecycle and snapshot persistence.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lru_ttl_cache::{Cache, CacheError, NEVER_TTL};
use serde::{Deserialize, Serialize};
use tempfile::tempdir;
use tokio::time::sleep;

// == Helper Functions ==

fn create_test_cache<V: Clone + Send + 'static>(capacity: usize, ttl: Duration) -> Cache<V> {
    Cache::new(capacity, ttl, Duration::from_secs(60)).unwrap()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Record {
    id: u32,
    name: String,
}

// == Eviction and Expiry ==

#[tokio::test]
async fn test_capacity_three_scenario() {
    let cache = create_test_cache(3, Duration::from_secs(10));

    cache.set("A", 1).await;
    cache.set("B", 2).await;
    cache.set("C", 3).await;

    // No reads yet: A is the oldest
    cache.set("D", 4).await;

    assert_eq!(cache.get("A").await, None);
    assert_eq!(cache.get("B").await, Some(2));
    assert_eq!(cache.get("C").await, Some(3));
    assert_eq!(cache.get("D").await, Some(4));
    assert_eq!(cache.len().await, 3);
}

#[tokio::test]
async fn test_read_protects_from_eviction() {
    let cache = create_test_cache(3, Duration::from_secs(10));

    cache.set("A", 1).await;
    cache.set("B", 2).await;
    cache.set("C", 3).await;
    assert_eq!(cache.get("A").await, Some(1));

    cache.set("D", 4).await;

    assert_eq!(cache.get("B").await, None);
    assert_eq!(cache.get("A").await, Some(1));
    assert_eq!(cache.get("C").await, Some(3));
    assert_eq!(cache.get("D").await, Some(4));
}

#[tokio::test]
async fn test_ttl_expiry_removes_entry() {
    let cache = create_test_cache(10, Duration::from_millis(100));
    cache.set("A", 1).await;

    sleep(Duration::from_millis(150)).await;

    assert_eq!(cache.get("A").await, None);
    assert_eq!(cache.len().await, 0, "Expired entry should be removed on read");
}

#[tokio::test]
async fn test_overwrite_refreshes_value_and_ttl() {
    let cache = create_test_cache(10, Duration::from_millis(400));
    cache.set("A", 1).await;

    sleep(Duration::from_millis(250)).await;
    cache.set("A", 2).await;

    // Past the first write's expiry, well within the second's
    sleep(Duration::from_millis(250)).await;
    assert_eq!(cache.get("A").await, Some(2));
}

#[tokio::test]
async fn test_delete_is_immediate_and_exact() {
    let cache = create_test_cache(10, NEVER_TTL);
    cache.set("A", "value".to_string()).await;

    assert_eq!(cache.delete("A").await, Some("value".to_string()));
    assert_eq!(cache.delete("A").await, None);
    assert_eq!(cache.get("A").await, None);
}

#[tokio::test]
async fn test_capacity_invariant_under_many_writes() {
    let cache = create_test_cache(5, Duration::from_secs(10));

    for i in 0..50 {
        cache.set(format!("key{}", i % 13), i).await;
        assert!(cache.len().await <= 5);
    }
    // Cycling 13 keys through 5 slots never hits, so every write past the
    // first 5 evicts
    assert_eq!(cache.stats().await.evictions, 45);
}

// == Read-through ==

#[tokio::test]
async fn test_get_or_load_does_not_cache_failures() {
    let cache: Cache<String> = create_test_cache(10, Duration::from_secs(10));
    cache.set("present", "old".to_string()).await;
    let calls = AtomicUsize::new(0);

    let result = cache
        .get_or_load("absent", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<String, _>(std::io::Error::new(std::io::ErrorKind::Other, "backend down"))
        })
        .await;
    assert_eq!(result.unwrap_err().to_string(), "backend down");
    assert_eq!(cache.get("absent").await, None);

    // Loader runs again on the next miss and its success is cached
    let result = cache
        .get_or_load("absent", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::io::Error>("loaded".to_string())
        })
        .await;
    assert_eq!(result.unwrap(), "loaded");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.get("absent").await, Some("loaded".to_string()));
    assert_eq!(cache.get("present").await, Some("old".to_string()));
}

#[tokio::test]
async fn test_concurrent_misses_are_not_coalesced() {
    let cache: Arc<Cache<u32>> = Arc::new(create_test_cache(10, Duration::from_secs(10)));
    let calls = Arc::new(AtomicUsize::new(0));

    let load = |cache: Arc<Cache<u32>>, calls: Arc<AtomicUsize>| async move {
        cache
            .get_or_load("slow", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                sleep(Duration::from_millis(50)).await;
                Ok::<_, String>(7)
            })
            .await
    };

    let (first, second) = tokio::join!(
        load(cache.clone(), calls.clone()),
        load(cache.clone(), calls.clone())
    );

    assert_eq!(first, Ok(7));
    assert_eq!(second, Ok(7));
    assert_eq!(calls.load(Ordering::SeqCst), 2, "Each miss runs its own loader");
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn test_slow_loader_does_not_block_other_operations() {
    let cache: Arc<Cache<u32>> = Arc::new(create_test_cache(10, Duration::from_secs(10)));
    cache.set("other", 1).await;

    let loading = {
        let cache = cache.clone();
        tokio::spawn(async move {
            cache
                .get_or_load("slow", || async {
                    sleep(Duration::from_millis(200)).await;
                    Ok::<_, String>(2)
                })
                .await
        })
    };

    sleep(Duration::from_millis(20)).await;
    let read = tokio::time::timeout(Duration::from_millis(100), cache.get("other")).await;
    assert_eq!(read.expect("read blocked by loader"), Some(1));

    assert_eq!(loading.await.unwrap(), Ok(2));
}

#[tokio::test]
async fn test_fallback_on_failure() {
    let cache: Cache<String> = create_test_cache(10, Duration::from_secs(10));

    let value = cache
        .get_or_load_with_fallback(
            "user:2",
            || async { Err::<String, _>("DB down") },
            "FallbackUser".to_string(),
        )
        .await
        .unwrap_or_else(|fallback| fallback.into_value());

    assert_eq!(value, "FallbackUser");
    assert_eq!(cache.get("user:2").await, None);
}

// == Reaper ==

#[tokio::test]
async fn test_reaper_removes_without_reads() {
    let cache = Cache::new(10, Duration::from_millis(50), Duration::from_millis(20)).unwrap();
    cache.set("A", 1).await;
    cache.set("B", 2).await;

    sleep(Duration::from_millis(250)).await;

    assert_eq!(cache.len().await, 0);
    assert_eq!(cache.stats().await.expirations, 2);
}

#[tokio::test]
async fn test_stop_cleanup_twice_is_harmless() {
    let cache = Cache::new(10, Duration::from_millis(50), Duration::from_millis(20)).unwrap();
    assert!(cache.is_cleanup_running());

    assert!(cache.stop_cleanup());
    assert!(!cache.stop_cleanup());
    assert!(!cache.is_cleanup_running());

    // Without the reaper, expired entries linger until read
    cache.set("A", 1).await;
    sleep(Duration::from_millis(150)).await;
    assert_eq!(cache.len().await, 1);
    assert_eq!(cache.get("A").await, None);
    assert_eq!(cache.len().await, 0);
}

#[test]
fn test_construction_outside_runtime_is_an_error() {
    let result = Cache::<u32>::new(10, Duration::from_secs(1), Duration::from_secs(1));
    assert!(matches!(result, Err(CacheError::Runtime(_))));
}

#[tokio::test]
async fn test_construction_rejects_zero_parameters() {
    let zero_capacity = Cache::<u32>::new(0, Duration::from_secs(1), Duration::from_secs(1));
    let zero_ttl = Cache::<u32>::new(1, Duration::ZERO, Duration::from_secs(1));
    let zero_interval = Cache::<u32>::new(1, Duration::from_secs(1), Duration::ZERO);

    assert!(matches!(zero_capacity, Err(CacheError::InvalidConfig(_))));
    assert!(matches!(zero_ttl, Err(CacheError::InvalidConfig(_))));
    assert!(matches!(zero_interval, Err(CacheError::InvalidConfig(_))));
}

// == Persistence ==

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let cache = create_test_cache(3, Duration::from_secs(10));
    cache
        .set("A", Record { id: 1, name: "AAA".to_string() })
        .await;
    cache
        .set("B", Record { id: 2, name: "BBB".to_string() })
        .await;
    cache
        .set("C", Record { id: 3, name: "CCC".to_string() })
        .await;
    cache.save_to_file(&path).await.unwrap();

    let restored: Cache<Record> = create_test_cache(3, Duration::from_secs(10));
    assert_eq!(restored.load_from_file(&path).await.unwrap(), 3);

    assert_eq!(restored.keys().await, cache.keys().await);
    for (key, id) in [("A", 1), ("B", 2), ("C", 3)] {
        assert_eq!(restored.get(key).await.map(|r| r.id), Some(id));
    }

    assert_eq!(
        restored.delete("B").await.map(|r| r.name),
        Some("BBB".to_string())
    );
    assert_eq!(restored.get("B").await, None);
}

#[tokio::test]
async fn test_entries_expired_between_save_and_load_are_dropped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let short = create_test_cache(10, Duration::from_millis(100));
    short.set("short", 1).await;
    let short_path = dir.path().join("short.json");
    short.save_to_file(&short_path).await.unwrap();

    let long = create_test_cache(10, Duration::from_secs(60));
    long.set("long", 2).await;
    long.save_to_file(&path).await.unwrap();

    sleep(Duration::from_millis(150)).await;

    let restored: Cache<u32> = create_test_cache(10, Duration::from_secs(60));
    assert_eq!(restored.load_from_file(&short_path).await.unwrap(), 0);
    assert!(restored.is_empty().await);

    assert_eq!(restored.load_from_file(&path).await.unwrap(), 1);
    assert_eq!(restored.get("long").await, Some(2));
}

#[tokio::test]
async fn test_load_replaces_existing_content() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let source = create_test_cache(10, Duration::from_secs(60));
    source.set("from_file", 1).await;
    source.save_to_file(&path).await.unwrap();

    let target = create_test_cache(10, Duration::from_secs(60));
    target.set("in_memory", 2).await;
    target.load_from_file(&path).await.unwrap();

    assert_eq!(target.get("in_memory").await, None);
    assert_eq!(target.get("from_file").await, Some(1));
}

#[tokio::test]
async fn test_load_trims_to_capacity() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let big = create_test_cache(5, Duration::from_secs(60));
    for key in ["a", "b", "c", "d", "e"] {
        big.set(key, key.to_string()).await;
    }
    big.save_to_file(&path).await.unwrap();

    let small: Cache<String> = create_test_cache(2, Duration::from_secs(60));
    assert_eq!(small.load_from_file(&path).await.unwrap(), 2);

    // The two most recent survive
    assert_eq!(small.keys().await, vec!["e", "d"]);
}

#[tokio::test]
async fn test_failed_load_leaves_content_untouched() {
    let dir = tempdir().unwrap();
    let broken = dir.path().join("broken.json");
    tokio::fs::write(&broken, b"[{\"key\": \"x\"").await.unwrap();

    let cache = create_test_cache(10, Duration::from_secs(60));
    cache.set("A", 1).await;

    let malformed = cache.load_from_file(&broken).await;
    assert!(matches!(malformed, Err(CacheError::Decode { .. })));

    let missing = cache.load_from_file(dir.path().join("missing.json")).await;
    assert!(matches!(missing, Err(CacheError::Io { .. })));

    assert_eq!(cache.get("A").await, Some(1));
}

#[tokio::test]
async fn test_snapshot_file_format() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let cache = create_test_cache(10, Duration::from_secs(60));
    cache.set("A", 1).await;
    cache.set("B", 2).await;
    cache.save_to_file(&path).await.unwrap();

    let json: serde_json::Value =
        serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
    let records = json.as_array().unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["key"], "B");
    assert_eq!(records[0]["value"], 2);
    assert!(records[0]["expiresAt"].is_string());
    assert_eq!(records[1]["key"], "A");
}
