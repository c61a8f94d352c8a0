//! Network-only passthrough for requests the worker must never cache.

use folio_core::{Request, Response};

use crate::fetch::Network;

pub async fn network_only(network: &dyn Network, request: &Request) -> Response {
    match network.fetch(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(url = %request.url, "passthrough fetch failed: {e}");
            Response::service_unavailable()
        }
    }
}
