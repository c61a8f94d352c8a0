//! Fully buffered HTTP responses.
//!
//! The same type carries live network responses, entries read back from the
//! cache store, and the synthetic fallbacks served when both fail.

use serde::{Deserialize, Serialize};

/// Body of the offline response for non-navigation, non-image requests.
pub const OFFLINE_TEXT: &str = "Offline - Content not available";

/// Inline placeholder served for images that fail on both network and cache.
pub const PLACEHOLDER_SVG: &str = r##"<svg width="400" height="300" xmlns="http://www.w3.org/2000/svg"><rect width="400" height="300" fill="#f0f0f0"/><text x="50%" y="50%" text-anchor="middle" fill="#999">Image Unavailable</text></svg>"##;

/// Response tainting, as observed by the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response.
    #[default]
    Basic,
    /// Cross-origin response served with CORS.
    Cors,
    /// Cross-origin response the page cannot read.
    Opaque,
    /// Built locally rather than received from the network.
    Default,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Basic => "basic",
            ResponseType::Cors => "cors",
            ResponseType::Opaque => "opaque",
            ResponseType::Default => "default",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "basic" => ResponseType::Basic,
            "cors" => ResponseType::Cors,
            "opaque" => ResponseType::Opaque,
            _ => ResponseType::Default,
        }
    }
}

/// Where a response delivered to the caller came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    #[default]
    Network,
    Cache,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Final URL the response was received from, if any.
    pub url: Option<String>,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub response_type: ResponseType,
    #[serde(skip)]
    pub source: ResponseSource,
}

impl Response {
    /// A same-origin `200 OK` network response.
    pub fn ok(content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: None,
            status: 200,
            status_text: "OK".to_string(),
            headers: vec![("content-type".to_string(), content_type.to_string())],
            body: body.into(),
            response_type: ResponseType::Basic,
            source: ResponseSource::Network,
        }
    }

    /// A network response with an arbitrary status.
    pub fn with_status(status: u16, status_text: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: None,
            status,
            status_text: status_text.to_string(),
            headers: Vec::new(),
            body: body.into(),
            response_type: ResponseType::Basic,
            source: ResponseSource::Network,
        }
    }

    /// `503 Service Unavailable` with a plain-text body.
    pub fn service_unavailable() -> Self {
        Self {
            url: None,
            status: 503,
            status_text: "Service Unavailable".to_string(),
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: OFFLINE_TEXT.as_bytes().to_vec(),
            response_type: ResponseType::Default,
            source: ResponseSource::Synthetic,
        }
    }

    /// Gray "Image Unavailable" SVG.
    pub fn placeholder_image() -> Self {
        Self {
            url: None,
            status: 200,
            status_text: "OK".to_string(),
            headers: vec![("content-type".to_string(), "image/svg+xml".to_string())],
            body: PLACEHOLDER_SVG.as_bytes().to_vec(),
            response_type: ResponseType::Default,
            source: ResponseSource::Synthetic,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    /// Status in the 2xx range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Only successful same-origin responses are ever written to a cache.
    pub fn is_cacheable(&self) -> bool {
        self.is_ok() && self.response_type == ResponseType::Basic
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
