// Storage drivers backing the loader.

pub mod storage;
pub mod lfu;
pub mod lru;
pub mod map;


// Re-export main types
pub use lfu::TinyLfuDriver;
pub use lru::{EvictCallback, LruDriver};
pub use map::MapDriver;
pub use storage::{new_driver, Driver, DriverError, DriverKind, Slot};
