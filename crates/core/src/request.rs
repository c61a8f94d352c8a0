//! Intercepted request model.
//!
//! A [`Request`] carries the properties the router classifies on: method,
//! URL, destination and mode. Fragments are dropped on construction so two
//! requests that differ only by `#...` share a cache key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;
use crate::cache::hash::compute_request_key;

/// What the requested resource will be used for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// `fetch()`/XHR and anything without a specific destination.
    #[default]
    Empty,
    Document,
    Image,
    Style,
    Script,
    Font,
    Manifest,
    Audio,
    Video,
    Worker,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Empty => "",
            Destination::Document => "document",
            Destination::Image => "image",
            Destination::Style => "style",
            Destination::Script => "script",
            Destination::Font => "font",
            Destination::Manifest => "manifest",
            Destination::Audio => "audio",
            Destination::Video => "video",
            Destination::Worker => "worker",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Destination {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "empty" => Ok(Destination::Empty),
            "document" => Ok(Destination::Document),
            "image" => Ok(Destination::Image),
            "style" => Ok(Destination::Style),
            "script" => Ok(Destination::Script),
            "font" => Ok(Destination::Font),
            "manifest" => Ok(Destination::Manifest),
            "audio" => Ok(Destination::Audio),
            "video" => Ok(Destination::Video),
            "worker" => Ok(Destination::Worker),
            other => Err(Error::InvalidInput(format!("unknown request destination: {other}"))),
        }
    }
}

/// Request mode; `Navigate` marks top-level page loads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    Navigate,
    SameOrigin,
    NoCors,
    #[default]
    Cors,
}

impl FromStr for RequestMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "navigate" => Ok(RequestMode::Navigate),
            "same-origin" => Ok(RequestMode::SameOrigin),
            "no-cors" => Ok(RequestMode::NoCors),
            "" | "cors" => Ok(RequestMode::Cors),
            other => Err(Error::InvalidInput(format!("unknown request mode: {other}"))),
        }
    }
}

/// A request submitted to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Upper-case HTTP method.
    pub method: String,
    pub url: Url,
    pub destination: Destination,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Build a request with an arbitrary method.
    pub fn new(method: &str, mut url: Url) -> Self {
        url.set_fragment(None);
        Self {
            method: method.to_ascii_uppercase(),
            url,
            destination: Destination::Empty,
            mode: RequestMode::Cors,
            headers: Vec::new(),
            body: None,
        }
    }

    /// A plain GET, as issued by `fetch(url)`.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// A top-level page load.
    pub fn navigate(url: Url) -> Self {
        Self::get(url)
            .with_destination(Destination::Document)
            .with_mode(RequestMode::Navigate)
    }

    /// A POST with a JSON body.
    pub fn post_json(url: Url, body: Vec<u8>) -> Self {
        let mut request = Self::new("POST", url);
        request
            .headers
            .push(("content-type".to_string(), "application/json".to_string()));
        request.body = Some(body);
        request
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Whether this request targets the same origin as `origin`.
    pub fn is_same_origin(&self, origin: &Url) -> bool {
        self.url.origin() == origin.origin()
    }

    /// Cache key for this request (method + URL).
    pub fn key(&self) -> String {
        compute_request_key(&self.method, self.url.as_str())
    }
}
