//! Request classification.
//!
//! [`classify`] is a pure function of the request and the controlled origin.
//! Side effects happen in the strategies the resulting kind maps to.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::CacheRole;
use crate::request::{Destination, Request};

/// Resource kind of an intercepted GET request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Image,
    StyleOrScript,
    Navigation,
    Other,
    CrossOrigin,
}

/// Caching strategy and the cache it operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case", tag = "strategy", content = "cache")]
pub enum Strategy {
    NetworkOnly,
    CacheFirst(CacheRole),
    StaleWhileRevalidate(CacheRole),
    NetworkFirst(CacheRole),
}

impl ResourceKind {
    pub fn strategy(&self) -> Strategy {
        match self {
            ResourceKind::CrossOrigin => Strategy::NetworkOnly,
            ResourceKind::Image => Strategy::CacheFirst(CacheRole::Image),
            ResourceKind::StyleOrScript => Strategy::StaleWhileRevalidate(CacheRole::Runtime),
            ResourceKind::Navigation | ResourceKind::Other => Strategy::NetworkFirst(CacheRole::Runtime),
        }
    }
}

/// Classify a request. `None` means the request is not intercepted at all.
///
/// Rules, first match wins: non-GET, cross-origin, image, style/script,
/// navigation, everything else.
pub fn classify(request: &Request, origin: &Url) -> Option<ResourceKind> {
    if !request.is_get() {
        return None;
    }

    if !request.is_same_origin(origin) {
        return Some(ResourceKind::CrossOrigin);
    }

    let kind = match request.destination {
        Destination::Image => ResourceKind::Image,
        Destination::Style | Destination::Script => ResourceKind::StyleOrScript,
        _ if request.is_navigation() => ResourceKind::Navigation,
        _ => ResourceKind::Other,
    };

    Some(kind)
}
