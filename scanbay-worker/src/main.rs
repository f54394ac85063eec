//! # Scanbay Worker
//!
//! Long-running worker process for the Scanbay domain-scan service.
//!
//! Workers claim task envelopes from the Redis queue, run the external
//! scanner against the target domain, render the structured report to
//! HTML, and publish both artifacts into the shared result store. Task
//! state records are written back through the same queue client the API
//! server polls.

use anyhow::Context;
use clap::Parser;
use scanbay_core::{Config, RedisTaskQueue, ResultStore, ScanExecutor};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod pool;

use pool::WorkerPool;

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "scanbay-worker")]
#[command(about = "Scan worker claiming queued domain scans and publishing reports")]
struct Cli {
    /// Number of concurrent scan workers (overrides config)
    #[arg(short, long, env = "WORKER_COUNT")]
    workers: Option<usize>,

    /// Redis connection URL (overrides config)
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Directory holding published scan artifacts (overrides config)
    #[arg(long, env = "RESULTS_DIR")]
    results_dir: Option<PathBuf>,

    /// Path to the scanner executable (overrides config)
    #[arg(long, env = "SCANNER_PATH")]
    scanner: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env();
    if let Some(workers) = cli.workers {
        config.worker_count = workers;
    }
    if let Some(redis_url) = cli.redis_url {
        config.redis_url = redis_url;
    }
    if let Some(results_dir) = cli.results_dir {
        config.results_dir = results_dir;
    }
    if let Some(scanner) = cli.scanner {
        config.scanner_path = scanner;
    }

    let store = ResultStore::new(&config.results_dir);
    store
        .ensure_layout()
        .context("failed to create result directories")?;
    info!("Result store ready at {}", store.root().display());

    let queue = RedisTaskQueue::connect(&config.redis_url, config.task_ttl())
        .await
        .context("failed to connect to Redis task queue")?;

    let executor = ScanExecutor::new(&config, store);
    info!(
        scanner = %config.scanner_path,
        timeout_secs = config.scan_timeout_secs,
        workers = config.worker_count,
        "Scan worker configuration in effect"
    );

    let pool = WorkerPool::start(config.worker_count, queue, executor);

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    } else {
        info!("Shutdown signal received");
    }

    pool.shutdown().await;

    Ok(())
}
