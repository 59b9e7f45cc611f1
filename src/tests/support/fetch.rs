// Instrumented fetch functions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::loader::Fetcher;

/// Fetcher answering `"<call number> <key>"` after `latency`, plus its call counter.
pub fn counting_fetcher(latency: Duration) -> (impl Fetcher<String, String>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let fetch = move |_ctx: CancellationToken, key: String| {
        let counter = counter.clone();
        async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if !latency.is_zero() {
                sleep(latency).await;
            }
            anyhow::Ok(format!("{} {}", n, key))
        }
    };
    (fetch, calls)
}

/// Fetcher that always fails, plus its call counter.
pub fn failing_fetcher() -> (impl Fetcher<String, String>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let fetch = move |_ctx: CancellationToken, _key: String| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<String, _>(anyhow::anyhow!("upstream unavailable"))
        }
    };
    (fetch, calls)
}

/// Fetcher that panics on its first `panics` calls and then succeeds.
pub fn panicking_fetcher(panics: usize) -> (impl Fetcher<String, String>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let fetch = move |_ctx: CancellationToken, key: String| {
        let counter = counter.clone();
        async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= panics {
                panic!("fetch exploded on call {}", n);
            }
            anyhow::Ok(format!("{} {}", n, key))
        }
    };
    (fetch, calls)
}
