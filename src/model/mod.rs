// Package model provides the per-key cache entry and its state machine.

pub mod entry;
pub mod refresh;


// Re-export main types
pub use entry::{CacheEntry, EntryState, Loaded};
pub use refresh::{deadline, FetchingGuard};
