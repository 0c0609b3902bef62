//! catcache server entry point.
//!
//! Loads configuration, creates the cache directory and serves the
//! read-through cache over HTTP until Ctrl-C or SIGTERM.
//! Logging goes to stderr as JSON.

use std::sync::Arc;

use anyhow::{Context, Result};
use catcache_client::HttpUpstream;
use catcache_core::{AppConfig, ReadThroughCache};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod cli;
mod error;
mod handler;
mod handlers;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = cli::Cli::parse();
    let config = AppConfig::load_with(cli.into_overrides())?;

    let cache_dir = config.require_cache_dir()?;
    tokio::fs::create_dir_all(cache_dir)
        .await
        .with_context(|| format!("failed to create cache directory {}", cache_dir.display()))?;

    let upstream = Arc::new(HttpUpstream::from_config(&config)?);
    let cache = ReadThroughCache::from_config(&config, upstream)?;
    let app = handler::router(handler::AppState::new(cache, config.max_bytes));

    let address = config.bind_address()?;
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!(
        %address,
        cache_dir = %cache_dir.display(),
        upstream = %config.upstream_url,
        single_flight = config.single_flight,
        "Starting catcache server"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
