//! Stale-while-revalidate: answer from cache now, refresh it in the background.

use std::sync::Arc;

use folio_core::{NamedCache, Request, Response};
use tokio::sync::oneshot;

use super::{Background, lookup};
use crate::fetch::Network;

/// Serve the cached response immediately and refresh the entry on a
/// background task. With nothing cached the caller waits for the same
/// refresh instead of issuing a second fetch.
///
/// The refresh always runs to completion, whether or not anyone is still
/// waiting for it. Background writes are not trimmed.
pub async fn stale_while_revalidate(
    network: Arc<dyn Network>, cache: &NamedCache, request: &Request, background: &Background,
) -> Response {
    let (tx, rx) = oneshot::channel();

    let owned = request.clone();
    let target = cache.clone();
    background.spawn(async move {
        let result = network.fetch(&owned).await;
        match &result {
            Ok(response) if response.is_cacheable() => {
                if let Err(e) = target.put(&owned, response).await {
                    tracing::warn!(cache = target.name(), url = %owned.url, "revalidation write failed: {e}");
                }
            }
            Ok(response) => {
                tracing::debug!(url = %owned.url, status = response.status, "revalidation response not cacheable");
            }
            Err(e) => tracing::debug!(url = %owned.url, "revalidation failed: {e}"),
        }
        let _ = tx.send(result);
    });

    if let Some(cached) = lookup(cache, request).await {
        return cached;
    }

    match rx.await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            tracing::warn!(url = %request.url, "fetch failed with nothing cached: {e}");
            Response::service_unavailable()
        }
        Err(_) => {
            tracing::warn!(url = %request.url, "revalidation task dropped");
            Response::service_unavailable()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::MockNetwork;
    use folio_core::{CacheDb, ResponseSource};
    use std::time::{Duration, Instant};
    use url::Url;

    const ORIGIN: &str = "http://localhost:8080";

    fn get(path: &str) -> Request {
        Request::get(Url::parse(ORIGIN).unwrap().join(path).unwrap())
    }

    fn url(path: &str) -> String {
        format!("{ORIGIN}{path}")
    }

    async fn runtime_cache() -> NamedCache {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_cache("runtime-cache-v1").await.unwrap()
    }

    #[tokio::test]
    async fn test_cached_copy_served_then_refreshed() {
        let network = Arc::new(MockNetwork::new());
        network.route(&url("/css/style.css"), Response::ok("text/css", "new"));
        let cache = runtime_cache().await;
        cache.put(&get("/css/style.css"), &Response::ok("text/css", "old")).await.unwrap();
        let background = Background::new();

        let response =
            stale_while_revalidate(network.clone(), &cache, &get("/css/style.css"), &background).await;
        assert_eq!(response.text(), "old");
        assert_eq!(response.source, ResponseSource::Cache);

        background.settle().await;
        assert_eq!(network.hits(&url("/css/style.css")), 1);
        assert_eq!(cache.match_request(&get("/css/style.css")).await.unwrap().unwrap().text(), "new");
    }

    #[tokio::test]
    async fn test_cached_copy_not_delayed_by_slow_network() {
        let network = Arc::new(MockNetwork::new());
        network.route(&url("/js/main.js"), Response::ok("application/javascript", "new"));
        network.set_latency(Duration::from_secs(2));
        let cache = runtime_cache().await;
        cache.put(&get("/js/main.js"), &Response::ok("application/javascript", "old")).await.unwrap();
        let background = Background::new();

        let started = Instant::now();
        let response = stale_while_revalidate(network.clone(), &cache, &get("/js/main.js"), &background).await;
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(response.text(), "old");
        assert_eq!(background.pending(), 1);
    }

    #[tokio::test]
    async fn test_miss_waits_for_single_fetch() {
        let network = Arc::new(MockNetwork::new());
        network.route(&url("/css/new.css"), Response::ok("text/css", "body{}"));
        let cache = runtime_cache().await;
        let background = Background::new();

        let response =
            stale_while_revalidate(network.clone(), &cache, &get("/css/new.css"), &background).await;
        assert_eq!(response.text(), "body{}");

        background.settle().await;
        assert_eq!(network.hits(&url("/css/new.css")), 1);
        assert!(cache.match_request(&get("/css/new.css")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_miss_offline_is_503() {
        let network = Arc::new(MockNetwork::new());
        network.set_offline(true);
        let cache = runtime_cache().await;
        let background = Background::new();

        let response = stale_while_revalidate(network, &cache, &get("/css/none.css"), &background).await;
        assert_eq!(response.status, 503);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_cached_copy() {
        let network = Arc::new(MockNetwork::new());
        network.set_offline(true);
        let cache = runtime_cache().await;
        cache.put(&get("/css/style.css"), &Response::ok("text/css", "old")).await.unwrap();
        let background = Background::new();

        let response =
            stale_while_revalidate(network.clone(), &cache, &get("/css/style.css"), &background).await;
        assert_eq!(response.text(), "old");

        background.settle().await;
        assert_eq!(cache.match_request(&get("/css/style.css")).await.unwrap().unwrap().text(), "old");
    }

    #[tokio::test]
    async fn test_error_status_does_not_overwrite() {
        let network = Arc::new(MockNetwork::new());
        network.route(&url("/css/style.css"), Response::with_status(500, "Internal Server Error", "oops"));
        let cache = runtime_cache().await;
        cache.put(&get("/css/style.css"), &Response::ok("text/css", "old")).await.unwrap();
        let background = Background::new();

        stale_while_revalidate(network, &cache, &get("/css/style.css"), &background).await;
        background.settle().await;
        assert_eq!(cache.match_request(&get("/css/style.css")).await.unwrap().unwrap().text(), "old");
    }
}
