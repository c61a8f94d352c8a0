//! sw_fetch tool implementation.
//!
//! Sends a request through the worker, the way a page's fetch would be
//! intercepted, and reports which strategy answered it.

use folio_client::{Worker, resolve};
use folio_core::{Error, Request, ResourceKind, ResponseSource, ResponseType, Strategy};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{body_text, json_result};
use crate::error::ToolError;

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// URL to fetch. Relative paths resolve against the worker origin.
    pub url: String,

    /// HTTP method (default: GET). Only GET requests are intercepted.
    #[serde(default = "default_method")]
    pub method: String,

    /// Request destination: "image", "style", "script", "document", ...
    #[serde(default)]
    pub destination: Option<String>,

    /// Request mode; "navigate" marks a top-level page load.
    #[serde(default)]
    pub mode: Option<String>,

    /// Request body, sent with non-GET methods.
    #[serde(default)]
    pub body: Option<String>,

    /// Wait for background revalidation before returning.
    #[serde(default)]
    pub settle: bool,

    /// Include the body of textual responses (default: true).
    #[serde(default = "default_true")]
    pub include_body: bool,
}

fn default_method() -> String {
    "GET".into()
}

fn default_true() -> bool {
    true
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// The resolved request URL.
    pub url: String,
    /// Whether the worker answered the request (false: straight to network).
    pub intercepted: bool,
    pub kind: Option<ResourceKind>,
    pub strategy: Option<Strategy>,
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    /// Where the response came from: network, cache or synthetic.
    pub source: ResponseSource,
    pub response_type: ResponseType,
    pub body_bytes: usize,
    pub body: Option<String>,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(worker: &Worker, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidParams("url cannot be empty".into()).into());
    }
    if params.method.trim().is_empty() {
        return Err(ToolError::InvalidParams("method cannot be empty".into()).into());
    }

    let url = resolve(&params.url, worker.origin()).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let mut request = Request::new(params.method.trim(), url);
    if let Some(destination) = params.destination.as_deref() {
        request = request.with_destination(destination.parse()?);
    }
    if let Some(mode) = params.mode.as_deref() {
        request = request.with_mode(mode.parse()?);
    }
    if let Some(body) = params.body {
        request.body = Some(body.into_bytes());
    }

    let (kind, response) = worker.fetch_routed(&request).await?;
    tracing::debug!(url = %request.url, ?kind, "sw_fetch");
    if params.settle {
        worker.settle().await;
    }

    let output = SwFetchOutput {
        url: request.url.to_string(),
        intercepted: kind.is_some(),
        kind,
        strategy: kind.map(|k| k.strategy()),
        status: response.status,
        status_text: response.status_text.clone(),
        content_type: response.content_type().map(str::to_string),
        source: response.source,
        response_type: response.response_type,
        body_bytes: response.body.len(),
        body: if params.include_body { body_text(&response) } else { None },
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{output, url, worker};
    use folio_core::{CacheRole, Response};

    fn params(url: &str) -> SwFetchParams {
        SwFetchParams {
            url: url.to_string(),
            method: default_method(),
            destination: None,
            mode: None,
            body: None,
            settle: false,
            include_body: true,
        }
    }

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let (worker, _) = worker().await;
        assert!(fetch_impl(&worker, params("  ")).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_unknown_destination() {
        let (worker, _) = worker().await;
        let p = SwFetchParams { destination: Some("hologram".into()), ..params("/a.png") };
        assert!(fetch_impl(&worker, p).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_navigation_network_first() {
        let (worker, network) = worker().await;
        network.route(&url("/about.html"), Response::ok("text/html", "<h1>About</h1>"));

        let p = SwFetchParams { mode: Some("navigate".into()), ..params("/about.html") };
        let out: SwFetchOutput = output(&fetch_impl(&worker, p).await.unwrap());

        assert!(out.intercepted);
        assert_eq!(out.kind, Some(ResourceKind::Navigation));
        assert_eq!(out.strategy, Some(Strategy::NetworkFirst(CacheRole::Runtime)));
        assert_eq!(out.source, ResponseSource::Network);
        assert_eq!(out.body.as_deref(), Some("<h1>About</h1>"));
    }

    #[tokio::test]
    async fn test_fetch_offline_navigation_gets_offline_page() {
        let (worker, network) = worker().await;
        network.set_offline(true);

        let p = SwFetchParams { mode: Some("navigate".into()), ..params("/never-seen.html") };
        let out: SwFetchOutput = output(&fetch_impl(&worker, p).await.unwrap());
        assert_eq!(out.status, 200);
        assert_eq!(out.source, ResponseSource::Cache);
        assert_eq!(out.body.as_deref(), Some("precached /pages/offline.html"));
    }

    #[tokio::test]
    async fn test_fetch_image_binary_body_omitted() {
        let (worker, network) = worker().await;
        network.route(&url("/img/a.png"), Response::ok("image/png", vec![0x89, 0x50, 0x4e, 0x47]));

        let p = SwFetchParams { destination: Some("image".into()), ..params("/img/a.png") };
        let out: SwFetchOutput = output(&fetch_impl(&worker, p).await.unwrap());
        assert_eq!(out.kind, Some(ResourceKind::Image));
        assert_eq!(out.body_bytes, 4);
        assert!(out.body.is_none());
    }

    #[tokio::test]
    async fn test_fetch_post_not_intercepted() {
        let (worker, network) = worker().await;
        network.route(&url("/api/contact"), Response::ok("application/json", "{\"ok\":true}"));

        let p = SwFetchParams {
            method: "post".into(),
            body: Some("{\"name\":\"Ada\"}".into()),
            ..params("/api/contact")
        };
        let out: SwFetchOutput = output(&fetch_impl(&worker, p).await.unwrap());
        assert!(!out.intercepted);
        assert!(out.strategy.is_none());
        assert_eq!(out.status, 200);
    }

    #[tokio::test]
    async fn test_fetch_settle_waits_for_revalidation() {
        let (worker, network) = worker().await;
        network.route(&url("/css/main.css"), Response::ok("text/css", "body{}"));

        let p = SwFetchParams { destination: Some("style".into()), settle: true, ..params("/css/main.css") };
        let out: SwFetchOutput = output(&fetch_impl(&worker, p).await.unwrap());
        assert_eq!(out.body.as_deref(), Some("precached /css/main.css"));
        assert_eq!(worker.background().pending(), 0);

        let runtime = worker.manager().open(CacheRole::Runtime).await.unwrap();
        assert_eq!(runtime.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_fetch_waiting_worker_not_intercepted() {
        let config = folio_core::AppConfig { skip_waiting_on_install: false, ..Default::default() };
        let network = std::sync::Arc::new(folio_client::MockNetwork::new());
        for path in &config.precache_urls {
            network.route(&url(path), Response::ok("text/html", format!("live {path}")));
        }
        let db = folio_core::CacheDb::open_in_memory().await.unwrap();
        let worker = Worker::new(&config, db, network.clone()).unwrap();
        worker.start().await.unwrap();

        let out: SwFetchOutput = output(&fetch_impl(&worker, params("/index.html")).await.unwrap());
        assert!(!out.intercepted);
        assert!(out.kind.is_none());
        assert_eq!(out.source, ResponseSource::Network);

        worker.skip_waiting().await;
        let out: SwFetchOutput = output(&fetch_impl(&worker, params("/index.html")).await.unwrap());
        assert!(out.intercepted);
        assert_eq!(out.kind, Some(ResourceKind::Other));
        assert_eq!(out.strategy, Some(Strategy::NetworkFirst(CacheRole::Runtime)));
    }
}
