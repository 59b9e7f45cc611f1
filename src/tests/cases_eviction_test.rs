// Lock reclamation when the driver evicts entries.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

use crate::loader::Loader;
use crate::storage::{Driver, MapDriver, Slot, TinyLfuDriver};
use crate::support::counting_fetcher;

/// Map driver that answers `None` to its first `hidden` lookups.
struct HidingDriver {
    inner: MapDriver<String>,
    hidden: AtomicUsize,
    gets: AtomicUsize,
}

impl HidingDriver {
    fn new(hidden: usize) -> Self {
        Self {
            inner: MapDriver::new(),
            hidden: AtomicUsize::new(hidden),
            gets: AtomicUsize::new(0),
        }
    }
}

impl Driver<String> for HidingDriver {
    fn add(&self, key: String, value: Slot) {
        self.inner.add(key, value);
    }

    fn get(&self, key: &String) -> Option<Slot> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let hide = self
            .hidden
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if hide {
            None
        } else {
            self.inner.get(key)
        }
    }

    fn remove(&self, key: &String) {
        self.inner.remove(key);
    }
}

/// A second caller that misses on the lock-free lookup, takes the key lock
/// and then finds the entry on the re-check shares the first fetch and gives
/// the lock back.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_double_check_hit_shares_fetch_and_releases_lock() {
    // First caller: two hidden lookups (fast path + re-check), then populates.
    // Second caller: hidden fast path, visible re-check.
    let driver = Arc::new(HidingDriver::new(3));
    let (fetch, calls) = counting_fetcher(Duration::from_millis(100));
    let l: Loader<String, String> = Loader::builder(fetch, Duration::from_secs(60))
        .driver(driver.clone())
        .build();

    let first = {
        let l = l.clone();
        tokio::spawn(async move { l.load("k".to_string()).await })
    };
    let second = {
        let l = l.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            l.load("k".to_string()).await
        })
    };

    assert_eq!(first.await.unwrap().unwrap(), "1 k");
    assert_eq!(second.await.unwrap().unwrap(), "1 k");
    assert_eq!(driver.gets.load(Ordering::SeqCst), 4);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(l.contended_keys(), 0);

    let res = timeout(Duration::from_millis(100), l.load("k".to_string())).await;
    assert_eq!(res.expect("key lock must be free").unwrap(), "1 k");
}

/// A caller arriving during the first fetch waits on the placeholder entry.
/// Once the key is evicted, the next load must still get the key lock.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_placeholder_waiter_then_eviction_does_not_deadlock() {
    // Stays open once cancelled, so later fetches of the key do not wait.
    let latch = CancellationToken::new();
    let gate = latch.clone();
    let fetch = move |_ctx: CancellationToken, key: String| {
        let gate = gate.clone();
        async move {
            if key == "race_key" {
                let _ = timeout(Duration::from_secs(1), gate.cancelled()).await;
            }
            anyhow::Ok("value".to_string())
        }
    };
    // Size one so loading another key evicts the first.
    let l: Loader<String, String> = Loader::new_lru(fetch, Duration::from_secs(3600), 1).unwrap();

    let filler = {
        let l = l.clone();
        tokio::spawn(async move { l.load("race_key".to_string()).await })
    };
    let victim = {
        let l = l.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(10)).await;
            l.load("race_key".to_string()).await
        })
    };

    sleep(Duration::from_millis(50)).await;
    latch.cancel();

    assert_eq!(filler.await.unwrap().unwrap(), "value");
    assert_eq!(victim.await.unwrap().unwrap(), "value");
    assert_eq!(l.contended_keys(), 0);

    l.load("other_key".to_string()).await.unwrap();

    let res = timeout(Duration::from_millis(100), l.load("race_key".to_string())).await;
    assert!(res.is_ok(), "deadlock: failed to acquire lock after eviction");
}

/// Lock records are reclaimed whichever path ends the load, so churning a
/// tiny driver never accumulates locks or deadlocks.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_no_lock_leak_under_eviction_churn() {
    let (fetch, _) = counting_fetcher(Duration::from_millis(2));
    let l: Loader<String, String> = Loader::new_lru(fetch, Duration::from_secs(60), 2).unwrap();

    let mut handles = Vec::new();
    for t in 0..16 {
        let l = l.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..50 {
                let key = format!("k{}", (t + i) % 5);
                l.load(key).await.unwrap();
            }
        }));
    }
    let all = async {
        for h in handles {
            h.await.unwrap();
        }
    };
    timeout(Duration::from_secs(10), all)
        .await
        .expect("loads under eviction churn must not deadlock");

    assert_eq!(l.contended_keys(), 0);
    timeout(Duration::from_millis(200), l.load("k0".to_string()))
        .await
        .expect("fresh lock after churn")
        .unwrap();
}

/// The adaptive driver works behind the loader like any other.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_loader_over_tiny_lfu_driver() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let f = fetches.clone();
    let fetch = move |_ctx: CancellationToken, key: u64| {
        let f = f.clone();
        async move {
            f.fetch_add(1, Ordering::SeqCst);
            sleep(Duration::from_millis(20)).await;
            anyhow::Ok(key * 2)
        }
    };
    let l: Loader<u64, u64> = Loader::builder(fetch, Duration::from_secs(60))
        .driver(Arc::new(TinyLfuDriver::<u64>::new(1024).unwrap()))
        .build();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let l = l.clone();
        handles.push(tokio::spawn(async move { l.load(21).await }));
    }
    for h in handles {
        assert_eq!(h.await.unwrap().unwrap(), 42);
    }
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(l.contended_keys(), 0);
}
