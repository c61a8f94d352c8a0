//! Network-first: fresh when reachable, cached when not.

use folio_core::{NamedCache, Request, Response};

use super::{lookup, store};
use crate::fetch::Network;

/// Try the network, fall back to the cache, then to `offline_page` (for
/// navigations), then to a synthetic 503.
///
/// Successful responses are written to `cache`, which is then trimmed to
/// `max_entries`. Non-ok network responses are returned as they are.
pub async fn network_first(
    network: &dyn Network, cache: &NamedCache, request: &Request, max_entries: Option<usize>,
    offline_page: Option<&Request>,
) -> Response {
    let error = match network.fetch(request).await {
        Ok(response) => {
            store(cache, request, &response, max_entries).await;
            return response;
        }
        Err(e) => e,
    };

    tracing::debug!(url = %request.url, "network failed, trying cache: {error}");

    if let Some(cached) = lookup(cache, request).await {
        return cached;
    }

    if let Some(offline) = offline_page {
        match cache.storage().match_any(offline).await {
            Ok(Some(page)) => return page,
            Ok(None) => tracing::warn!(offline_page = %offline.url, "offline page is not cached"),
            Err(e) => tracing::warn!(offline_page = %offline.url, "offline page lookup failed: {e}"),
        }
    }

    Response::service_unavailable()
}
