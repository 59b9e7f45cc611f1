//! AdvLoader - concurrent memoizing loader.
//!
//! Wraps an expensive per-key fetch behind a cache that coalesces concurrent
//! misses into one fetch and serves stale values while refreshing them in the
//! background. Storage is pluggable through [`storage::Driver`].

#[cfg(test)]
mod tests;

#[cfg(test)]
pub use tests::support;

pub mod config;
pub mod lock;
pub mod loader;
pub mod metrics;
pub mod model;
pub mod storage;

// Re-export main types
pub use loader::{LoadError, Loader, LoaderBuilder, Fetcher};
pub use model::Loaded;
pub use storage::{Driver, DriverKind};
