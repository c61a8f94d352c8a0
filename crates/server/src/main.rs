//! folio-sw server entry point.
//!
//! This is the main binary that boots the offline worker and serves it as an
//! MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use folio_client::{FetchClient, FetchConfig, Worker};
use folio_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
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
    tracing::info!(origin = %config.origin, db = %config.db_path.display(), "Starting folio-sw server on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let network = FetchClient::new(FetchConfig::from_app(&config, config.origin_url()?))?;
    let worker = Worker::new(&config, db, Arc::new(network))?;

    match worker.resume().await {
        Ok(true) => {}
        Ok(false) => {
            if let Err(e) = worker.start().await {
                tracing::error!("worker did not activate, requests go straight to the network: {e}");
            }
        }
        Err(e) => tracing::error!("failed to check for an installed worker: {e}"),
    }

    let worker = Arc::new(worker);
    let handler = handler::FolioServer::new(Arc::clone(&worker));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    worker.settle().await;

    Ok(())
}
