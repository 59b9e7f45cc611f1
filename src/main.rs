// Demo entrypoint for AdvLoader: hammers a loader with concurrent callers and
// reports how many fetches actually ran.

use advloader::config::{Config, ConfigTrait};
use advloader::Loader;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const CONFIG_PATH: &str = "cfg/advloader.cfg.yaml";
const CONFIG_PATH_LOCAL: &str = "cfg/advloader.cfg.local.yaml";

/// AdvLoader - concurrent memoizing loader demo
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, value_name = "FILE")]
    cfg: Option<PathBuf>,

    /// Number of distinct keys
    #[arg(long, default_value_t = 8)]
    keys: usize,

    /// Concurrent callers per round
    #[arg(long, default_value_t = 64)]
    callers: usize,

    /// Simulated fetch latency
    #[arg(long, default_value = "100ms", value_parser = humantime::parse_duration)]
    latency: Duration,

    /// Number of rounds
    #[arg(long, default_value_t = 3)]
    rounds: usize,

    /// Pause between rounds
    #[arg(long, default_value = "300ms", value_parser = humantime::parse_duration)]
    pause: Duration,
}

/// Loads the configuration struct from YAML file.
/// Tries local config first, then falls back to default config.
fn load_cfg(path: Option<PathBuf>) -> Result<Config> {
    if let Some(custom_path) = path {
        return Config::load(&custom_path)
            .with_context(|| format!("failed to load custom config from {:?}", custom_path));
    }

    match Config::load(PathBuf::from(CONFIG_PATH_LOCAL)) {
        Ok(cfg) => Ok(cfg),
        Err(_) => Config::load(PathBuf::from(CONFIG_PATH))
            .with_context(|| format!("failed to load config from {}", CONFIG_PATH)),
    }
}

/// Configures structured logging based on configuration.
fn configure_logger(cfg: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let log_level = cfg
        .logs()
        .and_then(|logs| logs.level.as_ref())
        .map(|s| s.as_str())
        .unwrap_or("info");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if cfg.is_prod() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tokio::runtime::Runtime::new()
        .context("Failed to create tokio runtime")?
        .block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<()> {
    let cfg = load_cfg(args.cfg.clone())?;
    configure_logger(&cfg);

    info!(
        component = "main",
        event = "config_loaded",
        ttl = ?cfg.ttl(),
        error_ttl = ?cfg.error_ttl(),
        driver = ?cfg.driver_kind(),
        capacity = cfg.driver_capacity(),
        "config loaded"
    );

    let fetches = Arc::new(AtomicUsize::new(0));
    let counter = fetches.clone();
    let latency = args.latency;
    let fetch = move |ctx: CancellationToken, key: usize| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::Relaxed);
            tokio::select! {
                _ = tokio::time::sleep(latency) => {}
                _ = ctx.cancelled() => anyhow::bail!("fetch of key {} cancelled", key),
            }
            anyhow::Ok(format!("value-{}", key))
        }
    };

    let loader: Loader<usize, String> = Loader::from_config(fetch, &cfg)?;
    let keys = args.keys.max(1);

    for round in 0..args.rounds {
        let before = fetches.load(Ordering::Relaxed);
        let start = Instant::now();

        let mut handles = Vec::with_capacity(args.callers);
        for i in 0..args.callers {
            let loader = loader.clone();
            handles.push(tokio::spawn(async move { loader.load(i % keys).await }));
        }

        let mut failed = 0usize;
        for handle in handles {
            match handle.await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    failed += 1;
                    error!(component = "main", event = "load_failed", error = %e, "load failed");
                }
                Err(e) => {
                    failed += 1;
                    error!(component = "main", event = "join_failed", error = %e, "caller task failed");
                }
            }
        }

        info!(
            component = "main",
            event = "round_done",
            round,
            callers = args.callers,
            keys,
            fetches = fetches.load(Ordering::Relaxed) - before,
            failed,
            elapsed = ?start.elapsed(),
            "round finished"
        );

        tokio::time::sleep(args.pause).await;
    }

    info!(
        component = "main",
        event = "done",
        total_fetches = fetches.load(Ordering::Relaxed),
        "demo finished"
    );
    Ok(())
}
