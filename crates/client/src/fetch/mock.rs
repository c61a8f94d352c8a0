//! In-memory [`Network`] for tests.
//!
//! Routes map a full URL to a canned response; unknown URLs get a 404.
//! Every call is counted, including calls made while offline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use folio_core::{Error, Request, Response};

use super::Network;

#[derive(Default)]
pub struct MockNetwork {
    routes: Mutex<HashMap<String, Response>>,
    hits: Mutex<HashMap<String, usize>>,
    requests: Mutex<Vec<Request>>,
    latency: Mutex<Option<Duration>>,
    offline: AtomicBool,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` for `url`, replacing any previous route.
    pub fn route(&self, url: &str, response: Response) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string(), response);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay every response by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = Some(latency);
    }

    /// Number of calls made for `url`.
    pub fn hits(&self, url: &str) -> usize {
        self.hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap_or_else(PoisonError::into_inner).values().sum()
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait::async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url.to_string();
        *self
            .hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(url.clone())
            .or_default() += 1;
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {url}")));
        }

        let routed = self
            .routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&url)
            .cloned();

        Ok(routed
            .unwrap_or_else(|| Response::with_status(404, "Not Found", Vec::new()))
            .with_url(url))
    }
}
