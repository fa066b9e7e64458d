//! TTL Cleanup Task
//!
//! Background reaper that periodically removes expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::error::{CacheError, Result};

// == Reaper Handle ==
/// Controls a running cleanup task.
///
/// The task moves from running to stopped exactly once, either through
/// [`stop`](Self::stop) or when the handle is dropped.
#[derive(Debug)]
pub struct ReaperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    // == Stop ==
    /// Signals the task to stop.
    ///
    /// Returns true for the call that stopped it; any later call is a no-op
    /// returning false.
    pub fn stop(&self) -> bool {
        let already_stopped = self.shutdown.send_replace(true);
        if !already_stopped {
            info!("Stopping TTL cleanup task");
        }
        !already_stopped
    }

    /// Whether the task has neither been told to stop nor exited.
    pub fn is_running(&self) -> bool {
        !*self.shutdown.borrow() && !self.task.is_finished()
    }
}

impl Drop for ReaperHandle {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// Every `cleanup_interval` the task takes the store's lock and removes every
/// expired entry. It must be called from within a tokio runtime.
///
/// # Arguments
/// * `store` - Shared cache store, the same lock foreground operations use
/// * `cleanup_interval` - Time between cleanup runs, must be non-zero
///
/// # Example
/// ```ignore
/// let store = Arc::new(Mutex::new(CacheStore::<String>::new(1000, ttl)));
/// let reaper = spawn_cleanup_task(store.clone(), Duration::from_secs(1))?;
/// // Later, during shutdown:
/// reaper.stop();
/// ```
pub fn spawn_cleanup_task<V>(
    store: Arc<Mutex<CacheStore<V>>>,
    cleanup_interval: Duration,
) -> Result<ReaperHandle>
where
    V: Send + 'static,
{
    let runtime = Handle::try_current().map_err(|e| CacheError::Runtime(e.to_string()))?;
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = runtime.spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {:?}",
            cleanup_interval
        );

        let mut ticker = interval_at(Instant::now() + cleanup_interval, cleanup_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = store.lock().await.cleanup_expired();

                    if removed > 0 {
                        info!("TTL cleanup: removed {} expired entries", removed);
                    } else {
                        debug!("TTL cleanup: no expired entries found");
                    }
                }
                changed = shutdown_rx.changed() => {
                    // A closed channel means the handle is gone
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("TTL cleanup task stopped");
    });

    Ok(ReaperHandle { shutdown, task })
}
