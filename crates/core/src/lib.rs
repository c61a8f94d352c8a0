//! Core types and shared functionality for folio-sw.
//!
//! This crate provides:
//! - Cache Storage implementation with SQLite backend (named caches)
//! - Request/response model and request classification
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod route;

pub use cache::{CacheDb, CacheManager, CacheRole, CacheSettings, CachedRequest, NamedCache, PendingSubmission, RegistrationState};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use request::{Destination, Request, RequestMode};
pub use response::{Response, ResponseSource, ResponseType};
pub use route::{ResourceKind, Strategy, classify};
