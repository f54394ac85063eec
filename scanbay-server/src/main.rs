//! # Scanbay Server
//!
//! HTTP API for the Scanbay domain-scan service.
//!
//! ## Overview
//!
//! The server exposes the caller-facing surfaces:
//!
//! - **Submission**: validate a domain and enqueue a scan task
//! - **Status**: poll a task's lifecycle state
//! - **Retrieval**: resolve a domain's published report pair to links
//! - **Download**: stream a published artifact as an attachment
//!
//! Scans themselves run elsewhere: workers claim tasks from the Redis
//! queue and publish artifacts into the shared result store.

use anyhow::Context;
use clap::Parser;
use scanbay_core::{Config, RedisTaskQueue, ResultStore};
use scanbay_server::routes;
use scanbay_server::state::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "scanbay-server")]
#[command(about = "HTTP API server for asynchronous domain scans")]
struct Cli {
    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// Redis connection URL (overrides config)
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Directory holding published scan artifacts (overrides config)
    #[arg(long, env = "RESULTS_DIR")]
    results_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env();
    if let Some(port) = cli.port {
        config.server_port = port;
    }
    if let Some(host) = cli.host {
        config.server_host = host;
    }
    if let Some(redis_url) = cli.redis_url {
        config.redis_url = redis_url;
    }
    if let Some(results_dir) = cli.results_dir {
        config.results_dir = results_dir;
    }

    let store = ResultStore::new(&config.results_dir);
    store
        .ensure_layout()
        .context("failed to create result directories")?;
    info!("Result store ready at {}", store.root().display());

    let queue = RedisTaskQueue::connect(&config.redis_url, config.task_ttl())
        .await
        .context("failed to connect to Redis task queue")?;

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let state = AppState::new(Arc::new(config), Arc::new(queue), Arc::new(store));
    let app = routes::create_router(state);

    info!("Starting Scanbay API server on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    info!("Shutdown signal received");
}
