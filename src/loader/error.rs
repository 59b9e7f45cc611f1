use std::sync::Arc;

/// Failure reported by [`Loader::load`](super::Loader::load).
///
/// Cloneable because one cached failure is handed to every caller that reads
/// the entry until the error TTL runs out.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    /// The fetch function returned an error.
    #[error("fetch failed: {0:#}")]
    Fetch(Arc<anyhow::Error>),
    /// The driver returned something that is not a cache entry of this loader.
    #[error("corrupted cache entry: {0}")]
    CorruptedEntry(String),
    /// The fetch function panicked; the panic was caught at the call boundary.
    #[error("fetch panicked: {0}")]
    Panicked(String),
    /// The task populating the entry was torn down before storing a result.
    #[error("fetch was abandoned before completion")]
    Abandoned,
}

impl LoadError {
    pub fn is_fetch(&self) -> bool {
        matches!(self, LoadError::Fetch(_))
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, LoadError::Panicked(_))
    }

    pub fn is_corrupted(&self) -> bool {
        matches!(self, LoadError::CorruptedEntry(_))
    }
}

impl From<anyhow::Error> for LoadError {
    fn from(err: anyhow::Error) -> Self {
        LoadError::Fetch(Arc::new(err))
    }
}
