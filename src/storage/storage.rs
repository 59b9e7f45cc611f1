// Driver contract shared by every storage backend.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::hash::Hash;
use std::sync::Arc;

use super::{LruDriver, MapDriver, TinyLfuDriver};

/// Opaque value held by a driver. The loader stores its entries here and
/// downcasts them back on lookup.
pub type Slot = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    #[error("driver capacity must be greater than zero")]
    ZeroCapacity,
}

/// Trait for key/value backends the loader keeps its entries in.
///
/// Implementations may drop entries at any time (eviction) but `get` must
/// reflect the latest `add` for a key until that happens. All methods are
/// called concurrently from many tasks.
pub trait Driver<K>: Send + Sync {
    /// Stores or replaces the value for `key`.
    fn add(&self, key: K, value: Slot);

    /// Returns the value for `key` if it is still held.
    fn get(&self, key: &K) -> Option<Slot>;

    /// Drops `key` from the backend.
    fn remove(&self, key: &K);
}

/// Selects one of the built-in drivers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Unbounded map, never evicts.
    #[default]
    Map,
    /// Bounded least-recently-used.
    Lru,
    /// Bounded, frequency-aware admission (TinyLFU).
    Lfu,
}

/// Builds a driver of the given kind. `capacity` is ignored for `Map`.
pub fn new_driver<K>(kind: DriverKind, capacity: usize) -> Result<Arc<dyn Driver<K>>, DriverError>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
{
    let driver: Arc<dyn Driver<K>> = match kind {
        DriverKind::Map => Arc::new(MapDriver::<K>::new()),
        DriverKind::Lru => Arc::new(LruDriver::<K>::new(capacity)?),
        DriverKind::Lfu => Arc::new(TinyLfuDriver::<K>::new(capacity)?),
    };
    Ok(driver)
}
