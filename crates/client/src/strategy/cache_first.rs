//! Cache-first: serve what we have, fetch only on a miss.

use folio_core::{NamedCache, Request, Response};

use super::{lookup, store};
use crate::fetch::Network;

/// Return the cached response without touching the network; on a miss
/// fetch, store and trim to `max_entries`. If the network fails too, a
/// placeholder SVG is returned.
pub async fn cache_first(
    network: &dyn Network, cache: &NamedCache, request: &Request, max_entries: Option<usize>,
) -> Response {
    if let Some(cached) = lookup(cache, request).await {
        return cached;
    }

    match network.fetch(request).await {
        Ok(response) => {
            store(cache, request, &response, max_entries).await;
            response
        }
        Err(e) => {
            tracing::warn!(url = %request.url, "image fetch failed: {e}");
            Response::placeholder_image()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::MockNetwork;
    use folio_core::{CacheDb, Destination, ResponseSource};
    use url::Url;

    const ORIGIN: &str = "http://localhost:8080";

    fn image(path: &str) -> Request {
        Request::get(Url::parse(ORIGIN).unwrap().join(path).unwrap()).with_destination(Destination::Image)
    }

    fn url(path: &str) -> String {
        format!("{ORIGIN}{path}")
    }

    async fn image_cache() -> NamedCache {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_cache("image-cache-v1").await.unwrap()
    }

    #[tokio::test]
    async fn test_hit_skips_network() {
        let network = MockNetwork::new();
        network.route(&url("/img/a.png"), Response::ok("image/png", vec![1, 2, 3]));
        let cache = image_cache().await;

        let first = cache_first(&network, &cache, &image("/img/a.png"), Some(50)).await;
        let second = cache_first(&network, &cache, &image("/img/a.png"), Some(50)).await;

        assert_eq!(network.hits(&url("/img/a.png")), 1);
        assert_eq!(first.body, second.body);
        assert_eq!(second.source, ResponseSource::Cache);
    }

    #[tokio::test]
    async fn test_miss_offline_returns_placeholder() {
        let network = MockNetwork::new();
        network.set_offline(true);
        let cache = image_cache().await;

        let response = cache_first(&network, &cache, &image("/img/gone.png"), Some(50)).await;
        assert_eq!(response.content_type(), Some("image/svg+xml"));
        assert!(response.text().contains("Image Unavailable"));
        assert_eq!(cache.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_error_status_not_cached() {
        let network = MockNetwork::new();
        let cache = image_cache().await;

        let response = cache_first(&network, &cache, &image("/img/404.png"), Some(50)).await;
        assert_eq!(response.status, 404);
        assert_eq!(cache.len().await.unwrap(), 0);

        cache_first(&network, &cache, &image("/img/404.png"), Some(50)).await;
        assert_eq!(network.hits(&url("/img/404.png")), 2);
    }

    #[tokio::test]
    async fn test_cap_evicts_oldest() {
        let network = MockNetwork::new();
        let cache = image_cache().await;
        for path in ["/img/a.png", "/img/b.png", "/img/c.png"] {
            network.route(&url(path), Response::ok("image/png", path));
            cache_first(&network, &cache, &image(path), Some(2)).await;
        }

        let keys: Vec<String> = cache.keys().await.unwrap().into_iter().map(|k| k.url).collect();
        assert_eq!(keys, vec![url("/img/b.png"), url("/img/c.png")]);

        cache_first(&network, &cache, &image("/img/a.png"), Some(2)).await;
        assert_eq!(network.hits(&url("/img/a.png")), 2);
    }
}
