//! Cache Engine
//!
//! Thread-safe cache combining the store, one exclusive lock and the reaper.
//!
//! # Example
//! ```no_run
//! # async fn demo() -> lru_ttl_cache::Result<()> {
//! use std::time::Duration;
//! use lru_ttl_cache::Cache;
//!
//! let cache = Cache::new(1000, Duration::from_secs(900), Duration::from_secs(60))?;
//! cache.set("foo", "bar".to_string()).await;
//! assert_eq!(cache.get("foo").await, Some("bar".to_string()));
//! cache.stop_cleanup();
//! # Ok(())
//! # }
//! ```

mod loader;

pub use loader::Fallback;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cache::{self, CacheStats, CacheStore};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::tasks::{spawn_cleanup_task, ReaperHandle};

// == Cache ==
/// In-process LRU cache with TTL expiry and snapshot persistence.
///
/// All state sits behind a single mutex that every operation, and the
/// background reaper, takes for its whole critical section. Share the cache
/// between tasks with `Arc<Cache<V>>`.
///
/// Values are cloned out on reads; store `Arc<T>` to share large payloads.
#[derive(Debug)]
pub struct Cache<V> {
    store: Arc<Mutex<CacheStore<V>>>,
    reaper: ReaperHandle,
}

impl<V> Cache<V>
where
    V: Clone + Send + 'static,
{
    // == Constructor ==
    /// Creates a cache and starts its reaper.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries, must be positive
    /// * `ttl` - Lifetime given to an entry on each write, must be non-zero
    /// * `cleanup_interval` - Time between reaper passes, must be non-zero
    ///
    /// # Errors
    /// `InvalidConfig` for rejected parameters, `Runtime` when called
    /// outside a tokio runtime.
    pub fn new(capacity: usize, ttl: Duration, cleanup_interval: Duration) -> Result<Self> {
        Self::from_config(&CacheConfig {
            max_entries: capacity,
            default_ttl: ttl,
            cleanup_interval,
            snapshot_path: None,
        })
    }

    /// Creates a cache from configuration.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(Mutex::new(CacheStore::new(
            config.max_entries,
            config.default_ttl,
        )));
        let reaper = spawn_cleanup_task(store.clone(), config.cleanup_interval)?;

        debug!(
            "Cache created: capacity={}, ttl={:?}",
            config.max_entries, config.default_ttl
        );
        Ok(Self { store, reaper })
    }

    // == Basic Operations ==
    /// Returns the value for `key` if present and unexpired, marking it most
    /// recently used. An expired entry is removed.
    pub async fn get(&self, key: &str) -> Option<V> {
        self.store.lock().await.get(key)
    }

    /// Stores `value` under `key` with a fresh TTL, evicting the least
    /// recently used entry if a new key arrives at capacity.
    pub async fn set(&self, key: impl Into<String>, value: V) {
        self.store.lock().await.set(key.into(), value);
    }

    /// Removes `key`, returning the value it held.
    pub async fn delete(&self, key: &str) -> Option<V> {
        self.store.lock().await.delete(key)
    }

    // == Introspection ==
    /// Number of entries held, including expired ones not yet reaped.
    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.lock().await.is_empty()
    }

    /// Keys from most to least recently used.
    pub async fn keys(&self) -> Vec<String> {
        self.store.lock().await.keys()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.lock().await.stats()
    }

    pub async fn capacity(&self) -> usize {
        self.store.lock().await.capacity()
    }

    pub async fn ttl(&self) -> Duration {
        self.store.lock().await.ttl()
    }

    // == Reaper Lifecycle ==
    /// Stops the background reaper.
    ///
    /// Safe to call more than once: returns true only for the call that
    /// actually stopped it. Lazy expiry on reads keeps working afterwards.
    pub fn stop_cleanup(&self) -> bool {
        self.reaper.stop()
    }

    pub fn is_cleanup_running(&self) -> bool {
        self.reaper.is_running()
    }

    // == Persistence ==
    /// Writes every entry to `path`, most recently used first.
    ///
    /// The lock is held for the whole save, so the file reflects one
    /// consistent state. An existing file is overwritten.
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()>
    where
        V: Serialize,
    {
        let path = path.as_ref();
        let store = self.store.lock().await;

        let (count, bytes) = {
            let records = store.snapshot();
            (records.len(), cache::encode(&records)?)
        };
        cache::write_snapshot(path, &bytes).await?;
        drop(store);

        info!("Saved {} entries to {}", count, path.display());
        Ok(())
    }

    /// Replaces the whole cache content with the snapshot at `path`.
    ///
    /// The file is decoded before the lock is taken; on any error the current
    /// content is left untouched. Expired records are dropped, recency order
    /// is kept and records beyond capacity are evicted.
    ///
    /// Returns the number of entries loaded.
    pub async fn load_from_file(&self, path: impl AsRef<Path>) -> Result<usize>
    where
        V: DeserializeOwned,
    {
        let path = path.as_ref();
        let records = cache::read_snapshot::<V>(path).await?;
        let total = records.len();

        let loaded = self.store.lock().await.restore(records);

        info!(
            "Loaded {} of {} entries from {}",
            loaded,
            total,
            path.display()
        );
        Ok(loaded)
    }
}
