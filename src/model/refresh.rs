use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::{CacheEntry, EntryState};
use crate::loader::LoadError;

/// Expiry for a value stored now. A zero TTL never expires.
pub fn deadline(ttl: Duration) -> Option<Instant> {
    if ttl.is_zero() {
        return None;
    }
    Instant::now().checked_add(ttl)
}

impl<V> EntryState<V> {
    /// Checks whether the entry went stale before `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expire, Some(at) if at < now)
    }

    /// Stores the outcome of a fetch.
    ///
    /// Success replaces the value and clears the error. Failure records the
    /// error and keeps the previous value, expiring after `error_ttl`.
    pub fn apply(&mut self, outcome: Result<V, LoadError>, ttl: Duration, error_ttl: Duration) {
        match outcome {
            Ok(value) => {
                self.value = Some(value);
                self.error = None;
                self.expire = deadline(ttl);
            }
            Err(err) => {
                self.error = Some(err);
                self.expire = deadline(error_ttl);
            }
        }
    }
}

impl<V> CacheEntry<V> {
    /// Claims the right to refresh. Only one caller wins until the flag is cleared.
    pub fn try_mark_fetching(&self) -> bool {
        self.fetching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Clears the in-flight flag.
    pub fn clear_fetching(&self) {
        self.fetching.store(false, Ordering::Release);
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching.load(Ordering::Acquire)
    }
}

/// Clears the entry's in-flight flag when dropped, on every exit path
/// including unwinding and task cancellation.
pub struct FetchingGuard<V>(Arc<CacheEntry<V>>);

impl<V> FetchingGuard<V> {
    /// Wraps an entry whose flag is already set.
    pub fn new(entry: Arc<CacheEntry<V>>) -> Self {
        Self(entry)
    }
}

impl<V> Drop for FetchingGuard<V> {
    fn drop(&mut self) {
        self.0.clear_fetching();
    }
}
