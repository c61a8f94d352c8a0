//! cache_get tool implementation.
//!
//! Reads a stored response by URL, or lists the keys of one cache.

use folio_client::{Worker, resolve};
use folio_core::{CacheDb, CachedRequest, Error, NamedCache, Request, ResponseType};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::tools::{body_text, json_result};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// URL to look up. Relative paths resolve against the worker origin.
    #[serde(default)]
    pub url: Option<String>,

    /// Restrict the lookup to this cache. With no `url`, list its keys.
    #[serde(default)]
    pub cache: Option<String>,
}

/// A stored response.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheEntryOutput {
    /// The cache searched, if restricted to one.
    pub cache: Option<String>,
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub response_type: ResponseType,
    pub headers: Vec<(String, String)>,
    pub body_bytes: usize,
    pub body: Option<String>,
}

/// Keys of one cache in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub cache: String,
    pub entries: Vec<CachedRequest>,
}

/// Open `name` without creating it.
pub(crate) async fn existing_cache(db: &CacheDb, name: &str) -> Result<NamedCache, Error> {
    db.find_cache(name)
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("no cache named {name}")))
}

/// Implementation of the cache_get tool.
pub async fn get_impl(worker: &Worker, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let db = worker.manager().db();

    let Some(url) = params.url.filter(|u| !u.trim().is_empty()) else {
        let Some(name) = params.cache else {
            return Err(ToolError::InvalidParams("one of url or cache must be given".into()).into());
        };
        let entries = existing_cache(db, &name).await?.keys().await?;
        return json_result(&CacheKeysOutput { cache: name, entries });
    };

    let request = Request::get(resolve(&url, worker.origin()).map_err(|e| Error::InvalidUrl(e.to_string()))?);
    let found = match params.cache.as_deref() {
        Some(name) => existing_cache(db, name).await?.match_request(&request).await?,
        None => db.match_any(&request).await?,
    };
    let response = found.ok_or_else(|| Error::CacheMiss(request.url.to_string()))?;

    let output = CacheEntryOutput {
        cache: params.cache,
        url: request.url.to_string(),
        status: response.status,
        status_text: response.status_text.clone(),
        content_type: response.content_type().map(str::to_string),
        response_type: response.response_type,
        headers: response.headers.clone(),
        body_bytes: response.body.len(),
        body: body_text(&response),
    };
    json_result(&output)
}
