//! LRU TTL Cache - An in-process fixed-capacity cache
//!
//! Evicts entries by recency of use and by time-based expiry, with a background
//! reaper and optional snapshot persistence to a file.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod tasks;

pub use cache::{CacheStats, NEVER_TTL};
pub use config::CacheConfig;
pub use engine::{Cache, Fallback};
pub use error::{CacheError, Result};
