// Unbounded map driver.

use dashmap::DashMap;
use std::hash::Hash;

use crate::storage::{Driver, Slot};

/// Unbounded in-memory driver. Entries live until removed explicitly.
pub struct MapDriver<K: Hash + Eq> {
    items: DashMap<K, Slot>,
}

impl<K: Hash + Eq> MapDriver<K> {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
        }
    }

    /// Gets the number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<K: Hash + Eq> Default for MapDriver<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Driver<K> for MapDriver<K>
where
    K: Hash + Eq + Send + Sync,
{
    fn add(&self, key: K, value: Slot) {
        self.items.insert(key, value);
    }

    fn get(&self, key: &K) -> Option<Slot> {
        self.items.get(key).map(|v| v.value().clone())
    }

    fn remove(&self, key: &K) {
        self.items.remove(key);
    }
}
