//! `folio fetch`: send one request through the worker.

use anyhow::{Result, bail};
use clap::Args;
use folio_client::{Worker, resolve};
use folio_core::{Request, ResourceKind, Response, ResponseSource, Strategy};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// URL or path; paths resolve against the configured origin
    pub url: String,

    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request destination: image, style, script, document, ...
    #[arg(long)]
    pub destination: Option<String>,

    /// Request mode; navigate marks a page load
    #[arg(long)]
    pub mode: Option<String>,

    /// Request body for non-GET methods
    #[arg(short, long)]
    pub data: Option<String>,

    /// Leave the body out of the output
    #[arg(long)]
    pub no_body: bool,
}

#[cfg(test)]
impl FetchArgs {
    pub(crate) fn get(url: &str) -> Self {
        Self {
            url: url.to_string(),
            method: "GET".into(),
            destination: None,
            mode: None,
            data: None,
            no_body: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct FetchOutput {
    url: String,
    intercepted: bool,
    kind: Option<ResourceKind>,
    strategy: Option<Strategy>,
    status: u16,
    status_text: String,
    content_type: Option<String>,
    source: ResponseSource,
    body_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
}

fn is_text(response: &Response) -> bool {
    response.content_type().is_some_and(|ct| {
        let ct = ct.to_ascii_lowercase();
        ct.starts_with("text/") || ["json", "xml", "javascript", "svg"].iter().any(|t| ct.contains(t))
    })
}

pub async fn run(worker: &Worker, args: FetchArgs) -> Result<Value> {
    if args.method.trim().is_empty() {
        bail!("method cannot be empty");
    }

    let mut request = Request::new(args.method.trim(), resolve(&args.url, worker.origin())?);
    if let Some(destination) = args.destination.as_deref() {
        request = request.with_destination(destination.parse()?);
    }
    if let Some(mode) = args.mode.as_deref() {
        request = request.with_mode(mode.parse()?);
    }
    request.body = args.data.map(String::into_bytes);

    let (kind, response) = worker.fetch_routed(&request).await?;

    let body = (!args.no_body && is_text(&response)).then(|| response.text());
    let output = FetchOutput {
        url: request.url.to_string(),
        intercepted: kind.is_some(),
        kind,
        strategy: kind.map(|k| k.strategy()),
        status: response.status,
        status_text: response.status_text.clone(),
        content_type: response.content_type().map(str::to_string),
        source: response.source,
        body_bytes: response.body.len(),
        body,
    };
    Ok(serde_json::to_value(output)?)
}
