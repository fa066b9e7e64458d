//! Cache Module
//!
//! Provides the unsynchronized cache core: TTL entries, the LRU list and the
//! store combining them, plus the snapshot codec.

mod entry;
mod lru;
mod snapshot;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruList;
pub use snapshot::{encode, read_snapshot, write_snapshot, SnapshotRecord};
pub use stats::CacheStats;
pub use store::CacheStore;

use std::time::Duration;

// == Public Constants ==
/// TTL long enough (about 91 years) that entries only leave by eviction or delete
pub const NEVER_TTL: Duration = Duration::from_secs(800_000 * 60 * 60);
