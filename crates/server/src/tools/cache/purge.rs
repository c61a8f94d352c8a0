//! cache_purge tool implementation.
//!
//! Deletes one entry, trims a cache, deletes a cache, or clears everything.

use folio_client::{Worker, resolve};
use folio_core::{Error, Request};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::get::existing_cache;
use crate::error::ToolError;
use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Cache to purge. Alone, the whole cache is deleted.
    #[serde(default)]
    pub cache: Option<String>,

    /// Delete only the entry for this URL.
    #[serde(default)]
    pub url: Option<String>,

    /// Trim the cache to its newest N entries (FIFO).
    #[serde(default)]
    pub max_entries: Option<usize>,

    /// Delete every cache, as the clearCache message does.
    #[serde(default)]
    pub all: bool,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of entries (or, for whole caches, caches) deleted.
    pub deleted: u64,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(worker: &Worker, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    if params.all {
        if params.cache.is_some() || params.url.is_some() || params.max_entries.is_some() {
            return Err(ToolError::InvalidParams("all cannot be combined with other options".into()).into());
        }
        let deleted = worker.clear_all_caches().await? as u64;
        return json_result(&CachePurgeOutput { deleted });
    }

    let Some(name) = params.cache else {
        return Err(ToolError::InvalidParams("cache is required unless all is set".into()).into());
    };
    if params.url.is_some() && params.max_entries.is_some() {
        return Err(ToolError::InvalidParams("url and max_entries are exclusive".into()).into());
    }

    let db = worker.manager().db();
    let cache = existing_cache(db, &name).await?;

    let deleted = if let Some(url) = params.url {
        let url = resolve(&url, worker.origin()).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        u64::from(cache.delete(&Request::get(url)).await?)
    } else if let Some(max_entries) = params.max_entries {
        cache.trim(max_entries).await?
    } else {
        u64::from(db.delete_cache(&name).await?)
    };

    tracing::info!(cache = %name, deleted, "cache purged");
    json_result(&CachePurgeOutput { deleted })
}
