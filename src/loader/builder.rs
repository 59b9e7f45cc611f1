// Loader construction options.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::fetcher::{background_context, ContextFactory, Fetcher};
use super::loader::{Inner, Loader};
use crate::lock::KeyLockTable;
use crate::storage::{Driver, MapDriver};

/// Collects options for a [`Loader`].
///
/// Defaults: error TTL equal to the TTL, an unbounded [`MapDriver`] and a
/// fresh background context per fetch.
pub struct LoaderBuilder<K, V> {
    fetcher: Arc<dyn Fetcher<K, V>>,
    ttl: Duration,
    error_ttl: Option<Duration>,
    driver: Option<Arc<dyn Driver<K>>>,
    context_factory: ContextFactory,
}

impl<K, V> LoaderBuilder<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new<F: Fetcher<K, V>>(fetcher: F, ttl: Duration) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            ttl,
            error_ttl: None,
            driver: None,
            context_factory: Arc::new(background_context),
        }
    }

    /// How long a failed fetch is served before the key is tried again.
    pub fn error_ttl(mut self, ttl: Duration) -> Self {
        self.error_ttl = Some(ttl);
        self
    }

    /// Storage backend for the entries.
    pub fn driver(mut self, driver: Arc<dyn Driver<K>>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Source of the context passed to every fetch.
    pub fn context_factory<F>(mut self, f: F) -> Self
    where
        F: Fn() -> CancellationToken + Send + Sync + 'static,
    {
        self.context_factory = Arc::new(f);
        self
    }

    pub fn build(self) -> Loader<K, V> {
        let error_ttl = self.error_ttl.unwrap_or(self.ttl);
        debug!(
            component = "loader",
            event = "built",
            ttl = ?self.ttl,
            error_ttl = ?error_ttl,
            "loader constructed"
        );
        let driver: Arc<dyn Driver<K>> = match self.driver {
            Some(driver) => driver,
            None => Arc::new(MapDriver::<K>::new()),
        };
        Loader::from_inner(Inner {
            fetcher: self.fetcher,
            ttl: self.ttl,
            error_ttl,
            driver,
            context_factory: self.context_factory,
            locks: KeyLockTable::new(),
        })
    }
}
