//! Install and activation.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use folio_core::{CacheRole, Error, RegistrationState, Request, Response};
use tokio::task::JoinSet;

use super::{Worker, WorkerState};

impl Worker {
    /// Install, then activate right away when the worker is configured to
    /// skip waiting. Returns the state the worker ended up in.
    ///
    /// # Errors
    ///
    /// Returns the install error; the worker is `redundant` afterwards.
    pub async fn start(&self) -> Result<WorkerState, Error> {
        self.install().await?;
        if self.skip_waiting_on_install {
            self.skip_waiting().await;
        }
        Ok(self.state().await)
    }

    /// Pick up a worker registered by an earlier process against the same
    /// store. A worker that had activated activates again, running the same
    /// cleanup of old caches; one that was still waiting comes back
    /// `installed` and activates only if it skips waiting. Returns whether
    /// the worker resumed.
    ///
    /// A registered precache missing any manifest entry is deleted and the
    /// worker is left `parsed`, ready to install again.
    ///
    /// # Errors
    ///
    /// Returns storage errors from reading the registration or precache.
    pub async fn resume(&self) -> Result<bool, Error> {
        if self.state().await != WorkerState::Parsed {
            return Ok(false);
        }
        let db = self.manager.db();
        let name = self.manager.name(CacheRole::Precache);
        let Some(registered) = db.registration(name).await? else {
            return Ok(false);
        };

        if !self.precache_complete().await? {
            tracing::warn!(cache = name, "precache is incomplete, dropping it");
            db.delete_cache(name).await?;
            return Ok(false);
        }

        self.transition(WorkerState::Parsed, WorkerState::Installed).await?;
        tracing::info!(cache = name, %registered, "resumed registered worker");
        if registered == RegistrationState::Activated || self.skip_waiting_on_install {
            self.skip_waiting().await;
        }
        Ok(true)
    }

    /// Fetch every manifest URL concurrently and store them in the precache.
    ///
    /// All-or-nothing: a failed or non-ok fetch aborts the remaining fetches,
    /// writes nothing and leaves the worker `redundant`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` unless the worker is `parsed`, and
    /// `Error::InstallFailed` if precaching fails.
    pub async fn install(&self) -> Result<(), Error> {
        self.transition(WorkerState::Parsed, WorkerState::Installing).await?;
        tracing::info!(entries = self.manifest.len(), "installing");

        match self.precache().await {
            Ok(stored) => {
                *self.state.write().await = WorkerState::Installed;
                tracing::info!(stored, cache = self.manager.name(CacheRole::Precache), "installed");
                Ok(())
            }
            Err(e) => {
                *self.state.write().await = WorkerState::Redundant;
                tracing::error!("install failed, worker is redundant: {e}");
                Err(e)
            }
        }
    }

    /// Activate an installed worker.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` unless the worker is `installed`.
    pub async fn activate(&self) -> Result<(), Error> {
        self.transition(WorkerState::Installed, WorkerState::Activating).await?;
        self.finish_activation().await;
        Ok(())
    }

    /// Activate now if the worker is waiting. Returns whether it activated;
    /// in any other state this is a no-op.
    pub async fn skip_waiting(&self) -> bool {
        if self.transition(WorkerState::Installed, WorkerState::Activating).await.is_err() {
            let state = self.state().await;
            tracing::debug!(%state, "skip waiting ignored");
            return false;
        }
        self.finish_activation().await;
        true
    }

    async fn transition(&self, from: WorkerState, to: WorkerState) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if *state != from {
            return Err(Error::InvalidState(format!("cannot go from {} to {to}", *state)));
        }
        *state = to;
        Ok(())
    }

    async fn precache(&self) -> Result<usize, Error> {
        let mut fetches = JoinSet::new();
        for (index, url) in self.manifest.iter().enumerate() {
            let network = Arc::clone(&self.network);
            let request = Request::get(url.clone());
            fetches.spawn(async move {
                let result = network.fetch(&request).await;
                (index, request, result)
            });
        }

        let mut fetched: Vec<(usize, Request, Response)> = Vec::with_capacity(self.manifest.len());
        while let Some(joined) = fetches.join_next().await {
            let (index, request, result) = joined.map_err(|e| Error::InstallFailed(format!("precache task: {e}")))?;
            let response = result.map_err(|e| Error::InstallFailed(format!("{}: {e}", request.url)))?;
            if !response.is_ok() {
                return Err(Error::InstallFailed(format!("{}: status {}", request.url, response.status)));
            }
            fetched.push((index, request, response));
        }
        fetched.sort_by_key(|(index, _, _)| *index);

        self.manager
            .db()
            .install_precache(
                self.manager.name(CacheRole::Precache),
                fetched.iter().map(|(_, request, response)| (request, response)),
            )
            .await
            .map_err(|e| Error::InstallFailed(e.to_string()))
    }

    async fn precache_complete(&self) -> Result<bool, Error> {
        let Some(precache) = self.manager.db().find_cache(self.manager.name(CacheRole::Precache)).await? else {
            return Ok(false);
        };
        let stored: HashSet<String> = precache.keys().await?.into_iter().map(|k| k.url).collect();
        Ok(self.manifest.iter().all(|url| stored.contains(url.as_str())))
    }

    async fn finish_activation(&self) {
        tracing::info!("activating");
        let db = self.manager.db();

        match db.cache_names().await {
            Ok(names) => {
                for name in names.into_iter().filter(|name| !self.manager.is_current(name)) {
                    match db.delete_cache(&name).await {
                        Ok(_) => tracing::info!(cache = %name, "deleted old cache"),
                        Err(e) => tracing::warn!(cache = %name, "failed to delete old cache: {e}"),
                    }
                }
            }
            Err(e) => tracing::warn!("failed to list caches during activation: {e}"),
        }

        let precache = self.manager.name(CacheRole::Precache);
        if let Err(e) = db.set_registration(precache, RegistrationState::Activated).await {
            tracing::warn!(cache = precache, "failed to record activation: {e}");
        }

        self.clients_claimed.store(true, Ordering::SeqCst);
        *self.state.write().await = WorkerState::Activated;
        tracing::info!("activated, clients claimed");
    }
}
