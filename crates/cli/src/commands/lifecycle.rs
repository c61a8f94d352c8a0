//! `folio install` and `folio status`.

use anyhow::Result;
use folio_client::{Worker, WorkerState};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Debug, Serialize)]
struct CacheSummary {
    name: String,
    entries: usize,
    current: bool,
}

/// Install unless the current version is already installed.
pub async fn install(worker: &Worker) -> Result<Value> {
    let state = worker.state().await;
    if matches!(state, WorkerState::Installed | WorkerState::Activated) || worker.resume().await? {
        return Ok(json!({ "state": worker.state().await, "installed": false }));
    }

    let state = worker.start().await?;
    let precached = worker.manifest().len();
    Ok(json!({ "state": state, "installed": true, "precached": precached }))
}

pub async fn status(worker: &Worker) -> Result<Value> {
    let manager = worker.manager();
    let db = manager.db();

    let mut caches = Vec::new();
    for name in db.cache_names().await? {
        let entries = db.open_cache(&name).await?.len().await?;
        let current = manager.is_current(&name);
        caches.push(CacheSummary { name, entries, current });
    }

    Ok(json!({
        "state": worker.state().await,
        "clients_claimed": worker.clients_claimed(),
        "origin": worker.origin().as_str(),
        "caches": caches,
        "pending_submissions": db.pending_submissions().await?.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{url, worker};
    use super::*;
    use folio_core::{AppConfig, Response};

    #[tokio::test]
    async fn test_install_then_already_installed() {
        let (worker, network) = worker().await;

        let out = install(&worker).await.unwrap();
        assert_eq!(out["state"], "activated");
        assert_eq!(out["installed"], true);
        assert_eq!(out["precached"], 9);

        let hits = network.total_hits();
        let out = install(&worker).await.unwrap();
        assert_eq!(out["installed"], false);
        assert_eq!(network.total_hits(), hits);
    }

    #[tokio::test]
    async fn test_install_resumes_worker_from_earlier_run() {
        let (first, network) = worker().await;
        install(&first).await.unwrap();
        let hits = network.total_hits();

        let config = AppConfig::default();
        let second = Worker::new(&config, first.manager().db().clone(), network.clone()).unwrap();
        let out = install(&second).await.unwrap();
        assert_eq!(out["installed"], false);
        assert_eq!(out["state"], "activated");
        assert_eq!(network.total_hits(), hits);
    }

    #[tokio::test]
    async fn test_install_failure_reported() {
        let (worker, network) = worker().await;
        network.route(&url("/index.html"), Response::with_status(500, "Internal Server Error", ""));

        assert!(install(&worker).await.is_err());
        let out = status(&worker).await.unwrap();
        assert_eq!(out["state"], "redundant");
        assert_eq!(out["caches"].as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn test_status_lists_caches() {
        let (worker, _) = worker().await;
        install(&worker).await.unwrap();
        worker.manager().db().open_cache("stale").await.unwrap();

        let out = status(&worker).await.unwrap();
        assert_eq!(out["clients_claimed"], true);
        assert_eq!(out["caches"][0]["name"], "portfolio-v1.0.0");
        assert_eq!(out["caches"][0]["entries"], 9);
        assert_eq!(out["caches"][1]["current"], false);
    }
}
