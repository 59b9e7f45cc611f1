//! Reference-counted table of per-key locks.
//!
//! A record exists only while some task holds or waits for its key, so the
//! table grows with current contention rather than with the key space.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

use crate::metrics;

struct Record {
    /// Holders plus waiters. Only touched under the table guard.
    refs: usize,
    mutex: Arc<AsyncMutex<()>>,
}

/// Grants one critical section per distinct key.
pub struct KeyLockTable<K> {
    locks: Mutex<HashMap<K, Record>>,
}

impl<K: Hash + Eq + Clone> KeyLockTable<K> {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Waits until no other task holds `key`, then returns the release handle.
    ///
    /// The table guard covers only the lookup and refcount bump; waiting on the
    /// key's own lock happens outside it so unrelated keys never queue here.
    /// Dropping the returned future while it waits gives the reference back.
    pub async fn lock(&self, key: K) -> KeyLockGuard<'_, K> {
        let mutex = {
            let mut locks = self.locks.lock();
            let record = locks.entry(key.clone()).or_insert_with(|| Record {
                refs: 0,
                mutex: Arc::new(AsyncMutex::new(())),
            });
            record.refs += 1;
            let mutex = record.mutex.clone();
            metrics::set_key_locks(locks.len());
            mutex
        };

        let mut guard = KeyLockGuard {
            permit: None,
            key: Some(key),
            table: self,
        };
        guard.permit = Some(mutex.lock_owned().await);
        guard
    }

    /// Number of keys currently held or awaited.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }

    fn unref(&self, key: &K) {
        let mut locks = self.locks.lock();
        if let Some(record) = locks.get_mut(key) {
            record.refs -= 1;
            if record.refs == 0 {
                locks.remove(key);
                metrics::set_key_locks(locks.len());
                trace!(component = "key-lock", event = "reclaimed", live = locks.len(), "key lock record reclaimed");
            }
        }
    }
}

impl<K: Hash + Eq + Clone> Default for KeyLockTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for KeyLockTable<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyLockTable")
            .field("keys", &self.locks.lock().len())
            .finish()
    }
}

/// Exclusive hold on one key of a [`KeyLockTable`].
///
/// Released by [`release`](Self::release) or on drop, whichever comes first.
#[derive(Debug)]
pub struct KeyLockGuard<'a, K: Hash + Eq + Clone> {
    // Declared first: the key's lock must be given up before the record is unreferenced.
    permit: Option<OwnedMutexGuard<()>>,
    key: Option<K>,
    table: &'a KeyLockTable<K>,
}

impl<K: Hash + Eq + Clone> KeyLockGuard<'_, K> {
    /// Unlocks the key and drops the record once nobody else references it.
    /// Calling it again is a no-op.
    pub fn release(&mut self) {
        let Some(key) = self.key.take() else {
            return;
        };
        drop(self.permit.take());
        self.table.unref(&key);
    }

    pub fn is_released(&self) -> bool {
        self.key.is_none()
    }
}

impl<K: Hash + Eq + Clone> Drop for KeyLockGuard<'_, K> {
    fn drop(&mut self) {
        self.release();
    }
}
