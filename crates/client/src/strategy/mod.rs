//! Caching strategies.
//!
//! Each strategy is a small protocol over a network call, a cache read and
//! a cache write. All of them resolve to *some* [`Response`]: network
//! failures fall back to the cache and then to a synthetic response, and
//! cache failures are logged and treated as misses.
//!
//! Lookups check the strategy's own cache first and then every other cache
//! in creation order, so precached assets are served offline whichever
//! strategy handles them.

pub mod cache_first;
pub mod network_first;
pub mod network_only;
pub mod stale_while_revalidate;

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use folio_core::{NamedCache, Request, Response};
use tokio::task::JoinSet;

pub use cache_first::cache_first;
pub use network_first::network_first;
pub use network_only::network_only;
pub use stale_while_revalidate::stale_while_revalidate;

/// Detached tasks that outlive the request that started them.
///
/// Callers never await these; [`Background::settle`] exists for shutdown and
/// for tests that need the background writes to have landed.
#[derive(Clone, Default)]
pub struct Background {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl Background {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        while let Some(finished) = tasks.try_join_next() {
            if let Err(e) = finished {
                tracing::warn!("background task failed: {e}");
            }
        }
        tasks.spawn(task);
    }

    /// Number of tasks spawned and not yet reaped.
    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Wait until every background task has finished.
    pub async fn settle(&self) {
        loop {
            let mut tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
            if tasks.is_empty() {
                return;
            }
            while let Some(finished) = tasks.join_next().await {
                if let Err(e) = finished {
                    tracing::warn!("background task failed: {e}");
                }
            }
        }
    }
}

/// Look `request` up in `cache`, then in every cache of the same storage.
pub(crate) async fn lookup(cache: &NamedCache, request: &Request) -> Option<Response> {
    match cache.match_request(request).await {
        Ok(Some(hit)) => return Some(hit),
        Ok(None) => {}
        Err(e) => tracing::warn!(cache = cache.name(), url = %request.url, "cache read failed: {e}"),
    }

    match cache.storage().match_any(request).await {
        Ok(hit) => hit,
        Err(e) => {
            tracing::warn!(url = %request.url, "cache storage read failed: {e}");
            None
        }
    }
}

/// Write a cacheable response and trim the cache to `max_entries`.
///
/// Best-effort: failures are logged and never reach the caller.
pub(crate) async fn store(cache: &NamedCache, request: &Request, response: &Response, max_entries: Option<usize>) {
    if !response.is_cacheable() {
        tracing::debug!(url = %request.url, status = response.status, "response not cacheable");
        return;
    }

    if let Err(e) = cache.put(request, response).await {
        tracing::warn!(cache = cache.name(), url = %request.url, "cache write failed: {e}");
        return;
    }

    if let Some(max) = max_entries {
        match cache.trim(max).await {
            Ok(0) => {}
            Ok(evicted) => tracing::debug!(cache = cache.name(), evicted, "trimmed cache"),
            Err(e) => tracing::warn!(cache = cache.name(), "cache trim failed: {e}"),
        }
    }
}
