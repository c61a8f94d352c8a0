//! sw_status tool implementation.
//!
//! Reports the worker's lifecycle state, its caches and the sync queue.

use folio_client::Worker;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatus {
    pub name: String,
    pub entries: usize,
    /// Whether activation keeps this cache.
    pub current: bool,
}

/// Output structure for the sw_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwStatusOutput {
    pub state: String,
    pub clients_claimed: bool,
    pub origin: String,
    /// Number of URLs in the install manifest.
    pub manifest_entries: usize,
    /// Caches in creation order.
    pub caches: Vec<CacheStatus>,
    pub pending_submissions: usize,
    /// Background revalidations not yet reaped.
    pub background_tasks: usize,
}

/// Implementation of the sw_status tool.
pub async fn status_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let manager = worker.manager();
    let db = manager.db();

    let mut caches = Vec::new();
    for name in db.cache_names().await? {
        let entries = db.open_cache(&name).await?.len().await?;
        let current = manager.is_current(&name);
        caches.push(CacheStatus { name, entries, current });
    }

    let output = SwStatusOutput {
        state: worker.state().await.to_string(),
        clients_claimed: worker.clients_claimed(),
        origin: worker.origin().to_string(),
        manifest_entries: worker.manifest().len(),
        caches,
        pending_submissions: db.pending_submissions().await?.len(),
        background_tasks: worker.background().pending(),
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{output, worker};

    #[tokio::test]
    async fn test_status_after_start() {
        let (worker, _) = worker().await;
        worker.handle_fetch(&folio_core::Request::get(worker.origin().join("/blog.html").unwrap())).await;
        worker.manager().db().open_cache("old-cache").await.unwrap();

        let out: SwStatusOutput = output(&status_impl(&worker).await.unwrap());
        assert_eq!(out.state, "activated");
        assert!(out.clients_claimed);
        assert_eq!(out.origin, "http://localhost:8080/");
        assert_eq!(out.manifest_entries, 9);

        let names: Vec<&str> = out.caches.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["portfolio-v1.0.0", "runtime-cache-v1", "old-cache"]);
        assert_eq!(out.caches[0].entries, 9);
        assert!(out.caches[0].current);
        assert!(!out.caches[2].current);
    }
}
