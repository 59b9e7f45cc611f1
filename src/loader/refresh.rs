// Background refresh of stale entries.

use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

use super::Loader;
use crate::metrics;
use crate::model::{CacheEntry, FetchingGuard};

impl<K, V> Loader<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Refreshes `entry` on a detached task. The caller must have won
    /// `try_mark_fetching`; the flag is cleared however the task ends.
    pub(super) fn spawn_refresh(&self, key: K, entry: Arc<CacheEntry<V>>) {
        metrics::add_refreshes(1);
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let _flag = FetchingGuard::new(entry.clone());

            let outcome = inner.fetch(key).await;
            let failed = outcome.is_err();

            let mut state = entry.state().write().await;
            state.apply(outcome, inner.ttl, inner.error_ttl);
            drop(state);

            debug!(
                component = "loader",
                event = "refreshed",
                failed,
                "background refresh finished"
            );
        });
    }
}
