//! pathcache daemon - static file server with an LRU cache in front of the disk

mod config;
mod handler;
mod http;
mod server;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use pathcache::CachedStore;
use tokio::net::{TcpListener, TcpStream};
use tracing::info;

use crate::config::{Args, ServerConfig};
use crate::handler::RequestHandler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let config = ServerConfig::resolve(&args)?;

    // Health check
    if args.health {
        match TcpStream::connect(&config.bind).await {
            Ok(_) => {
                println!("OK");
                std::process::exit(0);
            }
            Err(_) => {
                eprintln!("FAILED");
                std::process::exit(1);
            }
        }
    }

    info!("Starting pathcached v{}", env!("CARGO_PKG_VERSION"));
    info!("Serving {}", config.root.display());
    info!(
        "Cache capacity: {} ({:?} on duplicate keys)",
        config.cache.capacity, config.cache.duplicate_policy
    );

    let cache = CachedStore::with_config(&config.root, config.cache)
        .with_context(|| format!("Failed to open {}", config.root.display()))?;
    let handler = Arc::new(RequestHandler::new(Arc::new(cache)));

    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("Server listening on http://{}", config.bind);

    tokio::select! {
        result = server::serve(listener, handler) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}
