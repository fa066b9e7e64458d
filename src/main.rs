//! LRU TTL Cache - demo walkthrough
//!
//! Exercises the cache end to end: plain reads and writes, read-through
//! loading, fallback values and snapshot persistence.

use anyhow::{anyhow, Context};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lru_ttl_cache::{Cache, CacheConfig};

/// Runs the walkthrough against a cache configured from the environment.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache (starts the reaper)
/// 4. Set/get, read-through loading and fallback
/// 5. Save a snapshot and load it into a second cache
/// 6. Stop both reapers
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lru_ttl_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: max_entries={}, default_ttl={:?}, cleanup_interval={:?}",
        config.max_entries, config.default_ttl, config.cleanup_interval
    );

    let cache: Cache<String> = Cache::from_config(&config)?;

    // -------- Set / Get --------
    cache.set("foo", "bar".to_string()).await;
    info!("foo = {:?}", cache.get("foo").await);

    // -------- Read-through --------
    let user = cache
        .get_or_load("user:1", || async {
            info!("Loader invoked for user:1");
            Ok::<_, anyhow::Error>("Alice".to_string())
        })
        .await?;
    info!("user:1 = {}", user);

    // Served from the cache, this loader never runs
    let user = cache
        .get_or_load("user:1", || async { Ok::<_, anyhow::Error>("Bob".to_string()) })
        .await?;
    info!("user:1 = {}", user);

    // -------- Fallback --------
    let user = cache
        .get_or_load_with_fallback(
            "user:2",
            || async { Err::<String, _>(anyhow!("database unreachable")) },
            "guest".to_string(),
        )
        .await
        .unwrap_or_else(|fallback| {
            warn!("{}", fallback);
            fallback.into_value()
        });
    info!("user:2 = {}", user);

    // -------- Persistence --------
    let path = config
        .snapshot_path
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("lru_ttl_cache.json"));
    cache.save_to_file(&path).await?;

    let restored: Cache<String> = Cache::from_config(&config)?;
    let loaded = restored
        .load_from_file(&path)
        .await
        .with_context(|| format!("reloading {}", path.display()))?;
    info!(
        "Restored {} entries, most recent first: {:?}",
        loaded,
        restored.keys().await
    );

    let stats = cache.stats().await;
    info!(
        "Stats: {} (hit rate {:.2})",
        serde_json::to_string(&stats)?,
        stats.hit_rate()
    );

    cache.stop_cleanup();
    restored.stop_cleanup();
    info!("Demo complete");
    Ok(())
}
