// Package lfu provides the bounded TinyLFU driver.

use moka::sync::Cache;
use std::hash::Hash;

use crate::storage::{Driver, DriverError, Slot};

/// Bounded driver with frequency-aware admission and LRU eviction.
///
/// Admission is adaptive: under pressure a newly added key may be rejected in
/// favour of a hotter resident, which the loader treats like an eviction.
pub struct TinyLfuDriver<K: Hash + Eq + Send + Sync + 'static> {
    cache: Cache<K, Slot>,
}

impl<K: Hash + Eq + Send + Sync + 'static> TinyLfuDriver<K> {
    /// Creates a new TinyLFU driver.
    pub fn new(capacity: usize) -> Result<Self, DriverError> {
        if capacity == 0 {
            return Err(DriverError::ZeroCapacity);
        }
        Ok(Self {
            cache: Cache::builder().max_capacity(capacity as u64).build(),
        })
    }

    /// Approximate number of items, after flushing pending maintenance.
    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K> Driver<K> for TinyLfuDriver<K>
where
    K: Hash + Eq + Send + Sync + 'static,
{
    fn add(&self, key: K, value: Slot) {
        self.cache.insert(key, value);
    }

    fn get(&self, key: &K) -> Option<Slot> {
        self.cache.get(key)
    }

    fn remove(&self, key: &K) {
        self.cache.invalidate(key);
    }
}
