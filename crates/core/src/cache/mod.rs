//! SQLite-backed Cache Storage.
//!
//! A persistent set of named caches, each an insertion-ordered map from
//! request key to stored response. Access is async via tokio-rusqlite.
//! It supports:
//!
//! - Lazily created named caches with whole-cache deletion
//! - Cross-cache lookups in cache creation order
//! - FIFO trimming of a cache to a maximum entry count
//! - A queue of form submissions awaiting background sync
//! - Worker registrations recording how far each precache's worker got
//! - Automatic schema migrations and WAL mode for concurrent access

pub mod connection;
pub mod hash;
pub mod manager;
pub mod migrations;
pub mod registrations;
pub mod storage;
pub mod submissions;

pub use crate::Error;

pub use connection::CacheDb;
pub use manager::{CacheManager, CacheRole, CacheSettings};
pub use registrations::RegistrationState;
pub use storage::{CachedRequest, NamedCache};
pub use submissions::PendingSubmission;
