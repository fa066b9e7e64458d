//! Read-through loading
//!
//! Helpers that fill the cache from a loader on a miss. The loader always runs
//! outside the cache lock, and concurrent misses on one key each run their own
//! loader.

use std::error::Error;
use std::fmt;
use std::future::Future;

use tracing::{debug, warn};

use super::Cache;

// == Fallback ==
/// A failed load together with the fallback value served instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fallback<V, E> {
    /// The caller-supplied fallback, never stored in the cache
    pub value: V,
    /// What the loader failed with
    pub error: E,
}

impl<V, E> Fallback<V, E> {
    /// Drops the error, keeping the fallback value.
    pub fn into_value(self) -> V {
        self.value
    }

    pub fn into_parts(self) -> (V, E) {
        (self.value, self.error)
    }
}

impl<V, E: fmt::Display> fmt::Display for Fallback<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loader failed, fallback served: {}", self.error)
    }
}

impl<V, E> Error for Fallback<V, E>
where
    V: fmt::Debug,
    E: Error + 'static,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

impl<V> Cache<V>
where
    V: Clone + Send + 'static,
{
    // == Get Or Load ==
    /// Returns the cached value for `key`, or loads, stores and returns it.
    ///
    /// On a miss (absent or expired) the lock is released before `loader` is
    /// awaited, so a slow loader only holds up its own caller. A loader error
    /// is returned unchanged and nothing is stored, so the next miss calls the
    /// loader again.
    pub async fn get_or_load<F, Fut, E>(&self, key: &str, loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        debug!("Cache miss for {}, invoking loader", key);
        match loader().await {
            Ok(value) => {
                let mut store = self.store.lock().await;
                store.set(key.to_string(), value.clone());
                store.stats_mut().record_load();
                Ok(value)
            }
            Err(error) => {
                warn!("Loader failed for {}", key);
                self.store.lock().await.stats_mut().record_load_failure();
                Err(error)
            }
        }
    }

    // == Get Or Load With Fallback ==
    /// Like [`get_or_load`](Self::get_or_load), but a loader error comes back
    /// together with `fallback`. The fallback is not stored.
    ///
    /// ```no_run
    /// # async fn demo(cache: &lru_ttl_cache::Cache<String>) {
    /// let name = cache
    ///     .get_or_load_with_fallback("user:2", || async { Err::<String, _>("db down") }, "guest".to_string())
    ///     .await
    ///     .unwrap_or_else(|fallback| fallback.into_value());
    /// # }
    /// ```
    pub async fn get_or_load_with_fallback<F, Fut, E>(
        &self,
        key: &str,
        loader: F,
        fallback: V,
    ) -> Result<V, Fallback<V, E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        self.get_or_load(key, loader)
            .await
            .map_err(|error| Fallback {
                value: fallback,
                error,
            })
    }
}
