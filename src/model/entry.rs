//! Cache entry models.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::loader::LoadError;

/// Mutable part of an entry, guarded by the entry's read/write lock.
#[derive(Debug, Clone)]
pub struct EntryState<V> {
    /// Last successfully fetched value. Kept when a later refresh fails.
    pub value: Option<V>,
    /// Error of the most recent attempt, if it failed.
    pub error: Option<LoadError>,
    /// Instant after which the entry is stale. `None` never expires.
    pub expire: Option<Instant>,
}

impl<V> EntryState<V> {
    /// State of an entry whose first fetch has not stored anything yet.
    ///
    /// Already expired and carrying [`LoadError::Abandoned`], so that if the
    /// populating fetch never completes the next reader sees an error and
    /// schedules a refresh instead of waiting forever.
    pub fn placeholder() -> Self {
        Self {
            value: None,
            error: Some(LoadError::Abandoned),
            expire: Some(Instant::now()),
        }
    }
}

impl<V: Clone> EntryState<V> {
    /// Copies the value and error out for a caller.
    pub fn snapshot(&self) -> Loaded<V> {
        Loaded {
            value: self.value.clone(),
            error: self.error.clone(),
        }
    }
}

/// Per-key record stored in the driver.
///
/// Shared between the driver and any task reading or refreshing it; it is only
/// ever dropped when the driver lets go of it.
pub struct CacheEntry<V> {
    pub(crate) state: Arc<RwLock<EntryState<V>>>,
    pub(crate) fetching: AtomicBool,
}

impl<V> CacheEntry<V> {
    /// Creates an entry in the populating state: placeholder data, fetch in flight.
    pub fn populating() -> Self {
        Self {
            state: Arc::new(RwLock::new(EntryState::placeholder())),
            fetching: AtomicBool::new(true),
        }
    }

    /// Creates an idle entry holding the given state.
    pub fn with_state(state: EntryState<V>) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            fetching: AtomicBool::new(false),
        }
    }

    /// The entry's lock.
    pub fn state(&self) -> &RwLock<EntryState<V>> {
        &self.state
    }

    /// Shared handle to the entry's lock, for guards that outlive a borrow.
    pub fn state_handle(&self) -> Arc<RwLock<EntryState<V>>> {
        self.state.clone()
    }
}

/// What a load observed: the retained value and the last error, if any.
#[derive(Debug, Clone)]
pub struct Loaded<V> {
    pub value: Option<V>,
    pub error: Option<LoadError>,
}

impl<V> Loaded<V> {
    /// A result carrying only an error.
    pub fn failed(error: LoadError) -> Self {
        Self {
            value: None,
            error: Some(error),
        }
    }

    /// Collapses into a `Result`. An error wins over a retained value.
    pub fn into_result(self) -> Result<V, LoadError> {
        match (self.value, self.error) {
            (_, Some(err)) => Err(err),
            (Some(value), None) => Ok(value),
            (None, None) => Err(LoadError::Abandoned),
        }
    }
}
