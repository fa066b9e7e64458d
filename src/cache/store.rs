//! Cache Store Module
//!
//! Main cache engine combining a key index with the LRU list and TTL expiration.
//! The store itself is not synchronized; [`crate::Cache`] puts it behind a lock.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cache::entry::expiry_from;
use crate::cache::{CacheEntry, CacheStats, LruList, SnapshotRecord};

// == Cache Store ==
/// Cache storage with LRU eviction and TTL support.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key to list handle
    index: HashMap<String, usize>,
    /// Entries by recency of use
    order: LruList<V>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
    /// Freshness window applied to every write
    ttl: Duration,
}

impl<V> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and TTL.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries the cache can hold
    /// * `ttl` - Lifetime given to an entry on each write
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            index: HashMap::with_capacity(capacity),
            order: LruList::with_capacity(capacity),
            stats: CacheStats::new(),
            capacity,
            ttl,
        }
    }

    // == Set ==
    /// Stores a key-value pair, resetting its TTL.
    ///
    /// An existing key is updated in place even if it has already expired.
    /// A new key arriving at capacity first evicts the least recently used
    /// entry, whether or not that entry is still live.
    pub fn set(&mut self, key: String, value: V) {
        let expires_at = expiry_from(Utc::now(), self.ttl);
        self.set_with_expiry(key, value, expires_at);
    }

    pub(crate) fn set_with_expiry(&mut self, key: String, value: V, expires_at: DateTime<Utc>) {
        if let Some(&idx) = self.index.get(&key) {
            if let Some(entry) = self.order.get_mut(idx) {
                entry.value = value;
                entry.expires_at = expires_at;
            }
            self.order.move_to_front(idx);
            return;
        }

        if self.order.len() >= self.capacity && self.evict_oldest().is_some() {
            self.stats.record_eviction();
        }

        let idx = self
            .order
            .push_front(CacheEntry::new(key.clone(), value, expires_at));
        self.index.insert(key, idx);
    }

    // == Delete ==
    /// Removes an entry by key, returning its value.
    ///
    /// Expired entries that have not been reaped yet are removed and returned too.
    pub fn delete(&mut self, key: &str) -> Option<V> {
        let idx = *self.index.get(key)?;
        self.remove_slot(idx).map(|entry| entry.value)
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Walks the whole list from the back. Recency order is not expiry order,
    /// so the walk cannot stop at the first live entry.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let mut removed = 0;
        let mut cursor = self.order.back();

        while let Some(idx) = cursor {
            // Read the link before the node goes away
            cursor = self.order.prev(idx);

            let expired = self
                .order
                .get(idx)
                .map(CacheEntry::is_expired)
                .unwrap_or(false);
            if expired && self.remove_slot(idx).is_some() {
                removed += 1;
            }
        }

        self.stats.record_expirations(removed);
        removed
    }

    // == Snapshot ==
    /// Borrows every entry as a snapshot record, most recently used first.
    pub fn snapshot(&self) -> Vec<SnapshotRecord<&V>> {
        self.order
            .iter()
            .map(|entry| SnapshotRecord {
                key: entry.key.clone(),
                value: &entry.value,
                expires_at: entry.expires_at,
            })
            .collect()
    }

    // == Restore ==
    /// Replaces the whole content with snapshot records.
    ///
    /// Records are expected most recently used first and keep that order.
    /// Already expired records are skipped. Live records beyond capacity are
    /// evicted from the least recent end, and for a duplicated key the
    /// earliest record wins.
    ///
    /// Returns the number of entries held afterwards.
    pub fn restore(&mut self, records: Vec<SnapshotRecord<V>>) -> usize {
        self.index.clear();
        self.order.clear();

        let now = Utc::now();
        for record in records.into_iter().rev() {
            if record.expires_at > now {
                self.set_with_expiry(record.key, record.value, record.expires_at);
            }
        }
        self.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.len());
        stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut CacheStats {
        &mut self.stats
    }

    // == Introspection ==
    /// Keys from most to least recently used, expired ones included.
    pub fn keys(&self) -> Vec<String> {
        self.order.iter().map(|entry| entry.key.clone()).collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // == Helpers ==
    /// Unlinks a node and drops its index entry.
    fn remove_slot(&mut self, idx: usize) -> Option<CacheEntry<V>> {
        let entry = self.order.remove(idx)?;
        self.index.remove(&entry.key);
        Some(entry)
    }

    /// Removes the least recently used entry, returning its key.
    fn evict_oldest(&mut self) -> Option<String> {
        let idx = self.order.back()?;
        self.remove_slot(idx).map(|entry| entry.key)
    }

    /// Asserts that index and list describe the same set of entries.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        assert_eq!(self.index.len(), self.order.len(), "index/list size mismatch");
        assert!(self.order.len() <= self.capacity, "capacity exceeded");
        for (key, &idx) in &self.index {
            let entry = self.order.get(idx).expect("index points at a freed slot");
            assert_eq!(&entry.key, key, "index points at the wrong entry");
        }
        assert_eq!(self.order.iter().count(), self.order.len());
    }
}

impl<V: Clone> CacheStore<V> {
    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value if found and not expired, marking it most recently
    /// used. Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let Some(&idx) = self.index.get(key) else {
            self.stats.record_miss();
            return None;
        };

        let expired = self
            .order
            .get(idx)
            .map(CacheEntry::is_expired)
            .unwrap_or(true);
        if expired {
            self.remove_slot(idx);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            return None;
        }

        self.order.move_to_front(idx);
        self.stats.record_hit();
        self.order.get(idx).map(|entry| entry.value.clone())
    }
}
