// Common test utilities.

use std::future::Future;
use std::time::{Duration, Instant};

/// Runs `f` and returns its output along with the wall-clock time it took.
pub async fn timed<F, T>(f: F) -> (T, Duration)
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let out = f.await;
    (out, start.elapsed())
}

/// Asserts that `actual` is within `delta` of `expected`.
pub fn assert_in_delta(expected: Duration, actual: Duration, delta: Duration, msg: &str) {
    let diff = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    assert!(
        diff <= delta,
        "{}: expected {:?} +/- {:?}, got {:?}",
        msg,
        expected,
        delta,
        actual
    );
}
