//! CLI command implementations.
//!
//! Each command works against a [`Worker`] built by `main` and returns a
//! JSON value that `main` prints to stdout.
//!
//! - [`lifecycle`] - install and status
//! - [`fetch`] - route one request through the worker
//! - [`caches`] - list caches and their keys
//! - [`events`] - control messages, push, background sync and the sync queue

pub mod caches;
pub mod events;
pub mod fetch;
pub mod lifecycle;

use anyhow::Result;
use clap::Subcommand;
use folio_client::{Worker, worker::CONTACT_SYNC_TAG};
use serde_json::Value;

use fetch::FetchArgs;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Precache the manifest and activate the worker
    Install,
    /// Show the lifecycle state, caches and sync queue
    Status,
    /// Fetch a URL the way a controlled page would
    Fetch(FetchArgs),
    /// Post a control message: skipWaiting or clearCache
    Message {
        /// A JSON value, or a bare word taken as a string
        value: String,
    },
    /// List caches, or the keys of one cache
    Caches {
        #[arg(long)]
        cache: Option<String>,
    },
    /// Deliver a push message and print the notification
    Push {
        /// JSON payload with optional title and body
        #[arg(long)]
        data: Option<String>,
    },
    /// Fire a background sync event
    Sync {
        #[arg(long, default_value = CONTACT_SYNC_TAG)]
        tag: String,
    },
    /// Queue a contact form submission for the next sync
    Queue {
        /// Submission as a JSON object
        payload: String,
    },
}

/// Run one command.
pub async fn run(worker: &Worker, command: Command) -> Result<Value> {
    if !matches!(command, Command::Install) {
        boot(worker, command.installs_worker()).await;
    }

    match command {
        Command::Install => lifecycle::install(worker).await,
        Command::Status => lifecycle::status(worker).await,
        Command::Fetch(args) => fetch::run(worker, args).await,
        Command::Message { value } => events::message(worker, &value).await,
        Command::Caches { cache } => caches::run(worker, cache.as_deref()).await,
        Command::Push { data } => events::push(worker, data.as_deref()),
        Command::Sync { tag } => events::sync(worker, &tag).await,
        Command::Queue { payload } => events::queue(worker, &payload).await,
    }
}

impl Command {
    /// Whether the command should install a worker that is not yet installed.
    fn installs_worker(&self) -> bool {
        matches!(self, Command::Fetch(_))
    }
}

/// Pick up the installed worker from storage, installing it first when
/// `install` is set. Failures are logged; commands still run against
/// whatever state the worker reached.
async fn boot(worker: &Worker, install: bool) {
    match worker.resume().await {
        Ok(true) => {}
        Ok(false) if install => {
            if let Err(e) = worker.start().await {
                tracing::warn!("worker did not activate, requests go straight to the network: {e}");
            }
        }
        Ok(false) => tracing::debug!("no installed worker"),
        Err(e) => tracing::warn!("failed to check for an installed worker: {e}"),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use folio_client::{MockNetwork, Worker};
    use folio_core::{AppConfig, CacheDb, Response};

    pub const ORIGIN: &str = "http://localhost:8080";

    pub fn url(path: &str) -> String {
        format!("{ORIGIN}{path}")
    }

    /// A worker over an in-memory database and a network serving the manifest.
    pub async fn worker() -> (Worker, Arc<MockNetwork>) {
        let config = AppConfig::default();
        let network = Arc::new(MockNetwork::new());
        for path in &config.precache_urls {
            network.route(&url(path), Response::ok("text/html", format!("precached {path}")));
        }
        let db = CacheDb::open_in_memory().await.unwrap();
        let worker = Worker::new(&config, db, network.clone()).unwrap();
        (worker, network)
    }
}
