//! Loader metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding application installs a recorder.

pub mod meter;

// Re-export commonly used items
pub use meter::*;
