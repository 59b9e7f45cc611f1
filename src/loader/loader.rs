//! Fast-path / slow-path load protocol.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OwnedRwLockWriteGuard;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::builder::LoaderBuilder;
use super::fetcher::{fetch_guarded, ContextFactory, Fetcher};
use super::LoadError;
use crate::config::{Config, ConfigTrait};
use crate::lock::{KeyLockGuard, KeyLockTable};
use crate::metrics;
use crate::model::{CacheEntry, EntryState, FetchingGuard, Loaded};
use crate::storage::{new_driver, Driver, DriverError, LruDriver, Slot};

/// Memoizing loader with request coalescing and stale-while-revalidate.
///
/// Concurrent loads of one missing key run the fetch function once. An
/// expired value is returned as is while a single background task refreshes
/// it. Cloning is cheap and clones share the cache.
pub struct Loader<K, V> {
    pub(super) inner: Arc<Inner<K, V>>,
}

pub(super) struct Inner<K, V> {
    pub(super) fetcher: Arc<dyn Fetcher<K, V>>,
    pub(super) ttl: Duration,
    pub(super) error_ttl: Duration,
    pub(super) driver: Arc<dyn Driver<K>>,
    pub(super) context_factory: ContextFactory,
    pub(super) locks: KeyLockTable<K>,
}

impl<K, V> Clone for Loader<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> Inner<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Invokes the fetch function with a context from the factory.
    pub(super) async fn fetch(&self, key: K) -> Result<V, LoadError> {
        metrics::add_fetches(1);
        let ctx = (self.context_factory)();
        let outcome = fetch_guarded(&*self.fetcher, ctx, key).await;
        if outcome.is_err() {
            metrics::add_fetch_errors(1);
        }
        outcome
    }
}

impl<K, V> Loader<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a loader with default options.
    pub fn new<F: Fetcher<K, V>>(fetcher: F, ttl: Duration) -> Self {
        Self::builder(fetcher, ttl).build()
    }

    pub fn builder<F: Fetcher<K, V>>(fetcher: F, ttl: Duration) -> LoaderBuilder<K, V> {
        LoaderBuilder::new(fetcher, ttl)
    }

    /// Creates a loader backed by an LRU driver of `size` keys.
    pub fn new_lru<F: Fetcher<K, V>>(fetcher: F, ttl: Duration, size: usize) -> Result<Self, DriverError> {
        let driver = Arc::new(LruDriver::<K>::new(size)?);
        Ok(Self::builder(fetcher, ttl).driver(driver).build())
    }

    /// Creates a loader from the `loader:` configuration section.
    pub fn from_config<F: Fetcher<K, V>>(fetcher: F, cfg: &Config) -> Result<Self, DriverError> {
        let driver = new_driver(cfg.driver_kind(), cfg.driver_capacity())?;
        Ok(Self::builder(fetcher, cfg.ttl())
            .error_ttl(cfg.error_ttl())
            .driver(driver)
            .build())
    }

    pub(super) fn from_inner(inner: Inner<K, V>) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    pub fn error_ttl(&self) -> Duration {
        self.inner.error_ttl
    }

    /// Number of keys whose lock is currently held or awaited.
    pub fn contended_keys(&self) -> usize {
        self.inner.locks.len()
    }

    /// Loads the value for `key`.
    ///
    /// Returns the cached value, or fetches it once however many callers ask
    /// at the same time. A stale value is returned immediately and refreshed
    /// in the background. A cached failure is returned as an error until the
    /// error TTL runs out.
    pub async fn load(&self, key: K) -> Result<V, LoadError> {
        self.load_entry(key).await.into_result()
    }

    /// Like [`load`](Self::load) but exposes both the retained value and the
    /// last error, so a caller can fall back to data that survived a failed
    /// refresh.
    pub async fn load_entry(&self, key: K) -> Loaded<V> {
        if let Some(loaded) = self.fast_load(&key).await {
            return loaded;
        }

        let mut lock = self.inner.locks.lock(key.clone()).await;

        // Another caller may have populated the key while this one waited.
        if let Some(loaded) = self.fast_load(&key).await {
            lock.release();
            metrics::add_coalesced(1);
            return loaded;
        }

        metrics::add_misses(1);
        self.populate(key, lock).await
    }

    /// Drops `key` from the driver; the next load fetches it again.
    pub fn invalidate(&self, key: &K) {
        self.inner.driver.remove(key);
    }

    /// Looks the key up without locking it. `None` means the driver has no entry.
    async fn fast_load(&self, key: &K) -> Option<Loaded<V>> {
        let slot = self.inner.driver.get(key)?;
        let entry = match slot.downcast::<CacheEntry<V>>() {
            Ok(entry) => entry,
            Err(_) => {
                warn!(
                    component = "loader",
                    event = "corrupted_entry",
                    expected = std::any::type_name::<CacheEntry<V>>(),
                    "driver returned a foreign value"
                );
                return Some(Loaded::failed(LoadError::CorruptedEntry(format!(
                    "driver returned a value that is not a {}",
                    std::any::type_name::<CacheEntry<V>>()
                ))));
            }
        };

        let state = entry.state().read().await;
        if state.is_expired(Instant::now()) && entry.try_mark_fetching() {
            metrics::add_stale_hits(1);
            self.spawn_refresh(key.clone(), entry.clone());
        } else {
            metrics::add_hits(1);
        }
        Some(state.snapshot())
    }

    /// Stores a placeholder, lets go of the key lock and runs the first fetch.
    ///
    /// The fetch holds the entry's write lock, so callers that find the
    /// placeholder wait for the first result instead of seeing it empty. It
    /// runs on its own task: if this caller is dropped mid-way the entry is
    /// still filled in.
    async fn populate(&self, key: K, mut lock: KeyLockGuard<'_, K>) -> Loaded<V> {
        let entry = Arc::new(CacheEntry::populating());
        let state: OwnedRwLockWriteGuard<EntryState<V>> = entry.state_handle().write_owned().await;

        let slot: Slot = entry.clone();
        self.inner.driver.add(key.clone(), slot);
        lock.release();

        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            let _flag = FetchingGuard::new(entry);
            let mut state = state;
            let outcome = inner.fetch(key).await;
            state.apply(outcome, inner.ttl, inner.error_ttl);
            state.snapshot()
        });

        match task.await {
            Ok(loaded) => loaded,
            Err(err) => {
                debug!(
                    component = "loader",
                    event = "populate_aborted",
                    error = %err,
                    "populating task did not complete"
                );
                if err.is_panic() {
                    Loaded::failed(LoadError::Panicked(err.to_string()))
                } else {
                    Loaded::failed(LoadError::Abandoned)
                }
            }
        }
    }
}
