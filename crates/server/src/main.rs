//! stowaway server entry point.
//!
//! Boots one offline cache worker and exposes its lifecycle as MCP tools on
//! stdio. Logging goes to stderr to avoid interfering with the JSON-RPC
//! protocol on stdout.

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use std::sync::Arc;
use stowaway_core::{AppConfig, CacheDb};
use stowaway_worker::{FetchConfig, HttpNetwork, ServiceWorker};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(version = %config.version_id(), db = %config.db_path.display(), "Starting stowaway on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let network = Arc::new(HttpNetwork::new(FetchConfig::from(&config))?);
    let worker = Arc::new(ServiceWorker::new(config, db, network)?);

    let handler = handler::StowawayServer::new(worker.clone());
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    worker.settle().await;

    Ok(())
}
