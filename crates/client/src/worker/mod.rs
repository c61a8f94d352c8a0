//! The offline worker: lifecycle, request routing and event handlers.
//!
//! A [`Worker`] owns the cache manager and the network. Once activated it
//! intercepts same-origin and cross-origin GET requests and answers them
//! through the strategy picked by [`classify`]; before that, and for every
//! non-GET request, the network is used directly.

mod lifecycle;
mod messages;
mod push;
mod sync;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use folio_core::{AppConfig, CacheDb, CacheManager, Error, Request, ResourceKind, Response, Strategy, classify};
use serde::Serialize;
use tokio::sync::RwLock;
use url::Url;

use crate::fetch::{Network, resolve};
use crate::strategy::{Background, cache_first, network_first, network_only, stale_while_revalidate};

pub use messages::ControlMessage;
pub use push::{Notification, Notifier, TracingNotifier};
pub use sync::{CONTACT_SYNC_TAG, MESSAGES_SYNC_TAG, SyncOutcome};

/// Lifecycle state of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    /// Installed and waiting for activation.
    Installed,
    Activating,
    Activated,
    /// Install failed; the worker never activates.
    Redundant,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        }
    }

    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Activated)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Worker {
    origin: Url,
    manifest: Vec<Url>,
    offline_page: Url,
    sync_endpoint: Url,
    skip_waiting_on_install: bool,
    manager: CacheManager,
    network: Arc<dyn Network>,
    notifier: Arc<dyn Notifier>,
    background: Background,
    state: RwLock<WorkerState>,
    clients_claimed: AtomicBool,
}

impl Worker {
    /// Build a worker in the `parsed` state. Manifest, offline page and sync
    /// endpoint are resolved against the configured origin.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the origin or any configured path does
    /// not resolve.
    pub fn new(config: &AppConfig, db: CacheDb, network: Arc<dyn Network>) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let resolve_path = |path: &str| resolve(path, &origin).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")));

        let manifest = config
            .precache_urls
            .iter()
            .map(|path| resolve_path(path))
            .collect::<Result<Vec<_>, _>>()?;
        let offline_page = resolve_path(&config.offline_page)?;
        let sync_endpoint = resolve_path(&config.sync_endpoint)?;

        Ok(Self {
            origin,
            manifest,
            offline_page,
            sync_endpoint,
            skip_waiting_on_install: config.skip_waiting_on_install,
            manager: CacheManager::new(db, config.cache_settings()),
            network,
            notifier: Arc::new(TracingNotifier),
            background: Background::new(),
            state: RwLock::new(WorkerState::Parsed),
            clients_claimed: AtomicBool::new(false),
        })
    }

    /// Replace the notifier push events are shown through.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub fn manager(&self) -> &CacheManager {
        &self.manager
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn manifest(&self) -> &[Url] {
        &self.manifest
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Whether activation has claimed the open clients.
    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed.load(Ordering::SeqCst)
    }

    /// Answer an intercepted request.
    ///
    /// Returns `None` when the worker does not handle the request (not
    /// activated yet, or a non-GET method); the caller then goes to the
    /// network itself. Intercepted requests always get a response.
    pub async fn handle_fetch(&self, request: &Request) -> Option<Response> {
        self.intercept(request).await.map(|(_, response)| response)
    }

    /// Fetch through the worker: intercepted requests are answered by
    /// [`Worker::handle_fetch`], everything else goes to the network as is.
    ///
    /// # Errors
    ///
    /// Only non-intercepted requests can fail, with the network's error.
    pub async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.fetch_routed(request).await.map(|(_, response)| response)
    }

    /// Like [`Worker::fetch`], also returning the resource kind the request
    /// was routed as, or `None` if it went straight to the network.
    ///
    /// # Errors
    ///
    /// Only non-intercepted requests can fail, with the network's error.
    pub async fn fetch_routed(&self, request: &Request) -> Result<(Option<ResourceKind>, Response), Error> {
        match self.intercept(request).await {
            Some((kind, response)) => Ok((Some(kind), response)),
            None => Ok((None, self.network.fetch(request).await?)),
        }
    }

    async fn intercept(&self, request: &Request) -> Option<(ResourceKind, Response)> {
        if !self.state().await.can_intercept_fetch() {
            return None;
        }

        let kind = classify(request, &self.origin)?;
        let strategy = kind.strategy();
        tracing::debug!(url = %request.url, ?kind, ?strategy, "routing request");

        let response = match strategy {
            Strategy::NetworkOnly => network_only(self.network.as_ref(), request).await,
            Strategy::CacheFirst(role) => match self.manager.open(role).await {
                Ok(cache) => cache_first(self.network.as_ref(), &cache, request, self.manager.max_entries(role)).await,
                Err(e) => self.without_cache(request, &e).await,
            },
            Strategy::StaleWhileRevalidate(role) => match self.manager.open(role).await {
                Ok(cache) => stale_while_revalidate(Arc::clone(&self.network), &cache, request, &self.background).await,
                Err(e) => self.without_cache(request, &e).await,
            },
            Strategy::NetworkFirst(role) => match self.manager.open(role).await {
                Ok(cache) => {
                    let offline = (kind == ResourceKind::Navigation).then(|| Request::get(self.offline_page.clone()));
                    network_first(self.network.as_ref(), &cache, request, self.manager.max_entries(role), offline.as_ref())
                        .await
                }
                Err(e) => self.without_cache(request, &e).await,
            },
        };

        Some((kind, response))
    }

    /// Wait for background revalidations to finish.
    pub async fn settle(&self) {
        self.background.settle().await;
    }

    async fn without_cache(&self, request: &Request, error: &Error) -> Response {
        tracing::warn!(url = %request.url, "cache unavailable, using network: {error}");
        network_only(self.network.as_ref(), request).await
    }
}
