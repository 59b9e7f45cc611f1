// Package lru provides the bounded LRU driver.

pub mod in_memory;

// Re-export main types
pub use in_memory::{EvictCallback, LruDriver};
