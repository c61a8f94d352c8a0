//! Client code for folio-sw.
//!
//! This crate provides the network layer, the caching strategies and the
//! [`Worker`] that ties them to the cache storage in `folio-core`. The server
//! and the CLI are thin front ends over it.

pub mod fetch;
pub mod strategy;
pub mod worker;

pub use fetch::{FetchClient, FetchConfig, Network, UrlError, resolve};
pub use strategy::Background;
pub use worker::{ControlMessage, Notification, Notifier, SyncOutcome, TracingNotifier, Worker, WorkerState};

#[cfg(any(test, feature = "testing"))]
pub use fetch::mock::MockNetwork;
