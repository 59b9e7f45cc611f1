// Per-key mutual exclusion.

pub mod key_lock;


// Re-export main types
pub use key_lock::{KeyLockGuard, KeyLockTable};
