//! The caller-supplied fetch contract and how it is invoked.

use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use super::LoadError;

/// Loads the value for a key. Called concurrently for distinct keys and never
/// concurrently for the same key.
#[async_trait]
pub trait Fetcher<K, V>: Send + Sync + 'static {
    async fn fetch(&self, ctx: CancellationToken, key: K) -> anyhow::Result<V>;
}

#[async_trait]
impl<K, V, F, Fut> Fetcher<K, V> for F
where
    K: Send + 'static,
    V: Send + 'static,
    F: Fn(CancellationToken, K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
{
    async fn fetch(&self, ctx: CancellationToken, key: K) -> anyhow::Result<V> {
        (self)(ctx, key).await
    }
}

/// Produces the context handed to each fetch.
///
/// The default ignores the caller entirely: a refresh started by one caller
/// must keep running after that caller goes away. Supply a factory returning
/// child tokens of a shutdown token to tie fetches to a service lifetime.
pub type ContextFactory = Arc<dyn Fn() -> CancellationToken + Send + Sync>;

/// Default factory: a fresh token nobody cancels.
pub fn background_context() -> CancellationToken {
    CancellationToken::new()
}

/// Runs one fetch, turning a panic into [`LoadError::Panicked`].
pub(crate) async fn fetch_guarded<K: 'static, V: 'static>(
    fetcher: &dyn Fetcher<K, V>,
    ctx: CancellationToken,
    key: K,
) -> Result<V, LoadError> {
    match AssertUnwindSafe(fetcher.fetch(ctx, key)).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(LoadError::from(err)),
        Err(panic) => {
            let msg = panic_message(panic.as_ref());
            error!(
                component = "loader",
                event = "fetch_panicked",
                panic = %msg,
                "fetch function panicked"
            );
            crate::metrics::add_panics(1);
            Err(LoadError::Panicked(msg))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
