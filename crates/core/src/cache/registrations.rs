//! Persisted worker registrations.
//!
//! A registration ties a precache to the lifecycle state its worker
//! reached. It is written in the same transaction as the precache itself,
//! so a registration always points at a complete precache, and it goes away
//! with the cache.

use std::fmt;

use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

use super::connection::CacheDb;
use super::storage::{NewEntry, write_entries};
use crate::Error;
use crate::request::Request;
use crate::response::Response;

/// Lifecycle state recorded for a precache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    /// Installed and waiting to activate.
    Installed,
    Activated,
}

impl RegistrationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationState::Installed => "installed",
            RegistrationState::Activated => "activated",
        }
    }

    fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "installed" => Ok(RegistrationState::Installed),
            "activated" => Ok(RegistrationState::Activated),
            other => Err(Error::CorruptEntry(format!("unknown registration state: {other}"))),
        }
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CacheDb {
    /// Create precache `name` with every pair and register it as
    /// installed, all in one transaction. A failure leaves neither the cache
    /// nor the registration behind.
    pub async fn install_precache<'a>(
        &self, name: &str, pairs: impl IntoIterator<Item = (&'a Request, &'a Response)>,
    ) -> Result<usize, Error> {
        let entries = NewEntry::batch(pairs)?;
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.unchecked_transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                write_entries(&tx, &name, &entries, &now)?;
                tx.execute(
                    "INSERT INTO registrations (precache, state, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT (precache) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at",
                    params![name, RegistrationState::Installed.as_str(), now],
                )?;
                tx.commit()?;
                Ok(entries.len())
            })
            .await
            .map_err(Error::from)
    }

    /// The recorded state for precache `name`, if it is registered.
    pub async fn registration(&self, name: &str) -> Result<Option<RegistrationState>, Error> {
        let name = name.to_string();
        let state = self
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let state = conn
                    .query_row("SELECT state FROM registrations WHERE precache = ?1", params![name], |row| {
                        row.get(0)
                    })
                    .optional()?;
                Ok(state)
            })
            .await
            .map_err(Error::from)?;

        state.as_deref().map(RegistrationState::parse).transpose()
    }

    /// Update the state of a registered precache. Returns false if `name`
    /// is not registered.
    pub async fn set_registration(&self, name: &str, state: RegistrationState) -> Result<bool, Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let updated = conn.execute(
                    "UPDATE registrations SET state = ?2, updated_at = ?3 WHERE precache = ?1",
                    params![name, state.as_str(), now],
                )?;
                Ok(updated > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn request(path: &str) -> Request {
        Request::get(Url::parse("http://localhost:8080").unwrap().join(path).unwrap())
    }

    #[tokio::test]
    async fn test_install_precache_registers_installed() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let (a, b) = (request("/"), request("/pages/offline.html"));
        let page = Response::ok("text/html", "page");

        assert_eq!(db.install_precache("portfolio-v1.0.0", [(&a, &page), (&b, &page)]).await.unwrap(), 2);
        assert_eq!(db.registration("portfolio-v1.0.0").await.unwrap(), Some(RegistrationState::Installed));

        let cache = db.find_cache("portfolio-v1.0.0").await.unwrap().unwrap();
        assert_eq!(cache.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_failed_install_leaves_nothing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let get = request("/index.html");
        let post = Request::post_json(Url::parse("http://localhost:8080/api/contact").unwrap(), Vec::new());
        let page = Response::ok("text/html", "");

        let result = db.install_precache("portfolio-v1.0.0", [(&get, &page), (&post, &page)]).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(!db.has_cache("portfolio-v1.0.0").await.unwrap());
        assert!(db.registration("portfolio-v1.0.0").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_registration() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(!db.set_registration("portfolio-v1.0.0", RegistrationState::Activated).await.unwrap());

        let page = Response::ok("text/html", "");
        db.install_precache("portfolio-v1.0.0", [(&request("/"), &page)]).await.unwrap();
        assert!(db.set_registration("portfolio-v1.0.0", RegistrationState::Activated).await.unwrap());
        assert_eq!(db.registration("portfolio-v1.0.0").await.unwrap(), Some(RegistrationState::Activated));
    }

    #[tokio::test]
    async fn test_registration_dropped_with_cache() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let page = Response::ok("text/html", "");
        db.install_precache("portfolio-v1.0.0", [(&request("/"), &page)]).await.unwrap();

        db.delete_cache("portfolio-v1.0.0").await.unwrap();
        assert!(db.registration("portfolio-v1.0.0").await.unwrap().is_none());
    }
}
