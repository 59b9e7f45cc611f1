// Bounded least-recently-used driver.

use lru::LruCache;
use parking_lot::Mutex;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::trace;

use crate::storage::{Driver, DriverError, Slot};

/// Called with every key pushed out by capacity pressure.
pub type EvictCallback<K> = Arc<dyn Fn(&K, &Slot) + Send + Sync>;

/// In-memory LRU driver holding at most `capacity` keys.
pub struct LruDriver<K: Hash + Eq> {
    cache: Mutex<LruCache<K, Slot>>,
    on_evict: Option<EvictCallback<K>>,
}

impl<K: Hash + Eq> LruDriver<K> {
    /// Creates a new LRU driver.
    pub fn new(capacity: usize) -> Result<Self, DriverError> {
        let capacity = NonZeroUsize::new(capacity).ok_or(DriverError::ZeroCapacity)?;
        Ok(Self {
            cache: Mutex::new(LruCache::new(capacity)),
            on_evict: None,
        })
    }

    /// Registers a callback observing evictions. Purely informational.
    pub fn with_evict_callback(mut self, f: EvictCallback<K>) -> Self {
        self.on_evict = Some(f);
        self
    }

    /// Gets the number of items.
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Gets the configured capacity.
    pub fn capacity(&self) -> usize {
        self.cache.lock().cap().get()
    }
}

impl<K> Driver<K> for LruDriver<K>
where
    K: Hash + Eq + Clone + Send + Sync,
{
    fn add(&self, key: K, value: Slot) {
        // `push` hands back either the replaced value for the same key or the evicted tail.
        let pushed_out = self.cache.lock().push(key.clone(), value);
        if let Some((old_key, old_value)) = pushed_out {
            if old_key != key {
                trace!(component = "storage", event = "lru_evicted", "lru evicted tail entry");
                if let Some(ref f) = self.on_evict {
                    f(&old_key, &old_value);
                }
            }
        }
    }

    fn get(&self, key: &K) -> Option<Slot> {
        self.cache.lock().get(key).cloned()
    }

    fn remove(&self, key: &K) {
        self.cache.lock().pop(key);
    }
}
