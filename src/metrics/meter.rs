// Metric name constants
pub const HITS: &str = "loader_hits";
pub const STALE_HITS: &str = "loader_stale_hits";
pub const MISSES: &str = "loader_misses";
pub const COALESCED: &str = "loader_coalesced";
pub const FETCHES: &str = "loader_fetches";
pub const FETCH_ERRORS: &str = "loader_fetch_errors";
pub const REFRESHES: &str = "loader_refreshes";
pub const PANICKED: &str = "loader_panics";
pub const KEY_LOCKS: &str = "loader_key_locks";

/// Adds fresh cache hits.
pub fn add_hits(value: u64) {
    metrics::counter!(HITS).increment(value);
}

/// Adds hits on expired entries that scheduled a refresh.
pub fn add_stale_hits(value: u64) {
    metrics::counter!(STALE_HITS).increment(value);
}

/// Adds misses that had to populate an entry.
pub fn add_misses(value: u64) {
    metrics::counter!(MISSES).increment(value);
}

/// Adds misses resolved by the double check after waiting on the key lock.
pub fn add_coalesced(value: u64) {
    metrics::counter!(COALESCED).increment(value);
}

/// Adds fetch function invocations.
pub fn add_fetches(value: u64) {
    metrics::counter!(FETCHES).increment(value);
}

/// Adds failed fetches.
pub fn add_fetch_errors(value: u64) {
    metrics::counter!(FETCH_ERRORS).increment(value);
}

/// Adds background refreshes started.
pub fn add_refreshes(value: u64) {
    metrics::counter!(REFRESHES).increment(value);
}

/// Adds panics caught inside the fetch function.
pub fn add_panics(value: u64) {
    metrics::counter!(PANICKED).increment(value);
}

/// Sets the number of live key-lock records.
pub fn set_key_locks(count: usize) {
    metrics::gauge!(KEY_LOCKS).set(count as f64);
}
