//! Logical cache roles and their backing named caches.

use serde::{Deserialize, Serialize};

use super::connection::CacheDb;
use super::storage::NamedCache;
use crate::Error;

/// The three caches the worker knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CacheRole {
    /// Versioned cache filled at install time.
    Precache,
    /// Documents, styles and scripts fetched while browsing.
    Runtime,
    /// Images, capped separately.
    Image,
}

/// Names and size caps for the cache roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Prefix of the precache name (`<prefix>-<version>`).
    pub precache_prefix: String,
    pub version: String,
    pub runtime_cache: String,
    pub image_cache: String,
    pub max_runtime_entries: usize,
    pub max_image_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            precache_prefix: "portfolio".to_string(),
            version: "v1.0.0".to_string(),
            runtime_cache: "runtime-cache-v1".to_string(),
            image_cache: "image-cache-v1".to_string(),
            max_runtime_entries: 30,
            max_image_entries: 50,
        }
    }
}

/// Owns the mapping from [`CacheRole`] to a named cache in the store.
#[derive(Clone, Debug)]
pub struct CacheManager {
    db: CacheDb,
    settings: CacheSettings,
    precache_name: String,
}

impl CacheManager {
    pub fn new(db: CacheDb, settings: CacheSettings) -> Self {
        let precache_name = format!("{}-{}", settings.precache_prefix, settings.version);
        Self { db, settings, precache_name }
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn name(&self, role: CacheRole) -> &str {
        match role {
            CacheRole::Precache => &self.precache_name,
            CacheRole::Runtime => &self.settings.runtime_cache,
            CacheRole::Image => &self.settings.image_cache,
        }
    }

    /// Entry cap applied after writes into this role's cache.
    pub fn max_entries(&self, role: CacheRole) -> Option<usize> {
        match role {
            CacheRole::Precache => None,
            CacheRole::Runtime => Some(self.settings.max_runtime_entries),
            CacheRole::Image => Some(self.settings.max_image_entries),
        }
    }

    /// Names that survive activation cleanup.
    pub fn current_names(&self) -> [&str; 3] {
        [
            self.name(CacheRole::Precache),
            self.name(CacheRole::Runtime),
            self.name(CacheRole::Image),
        ]
    }

    pub fn is_current(&self, name: &str) -> bool {
        self.current_names().contains(&name)
    }

    pub async fn open(&self, role: CacheRole) -> Result<NamedCache, Error> {
        self.db.open_cache(self.name(role)).await
    }
}
