//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FOLIO_SW_*)
//! 2. TOML config file (if FOLIO_SW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::CacheSettings;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FOLIO_SW_*)
/// 2. TOML config file (if FOLIO_SW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache storage database.
    ///
    /// Set via FOLIO_SW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the worker controls. Requests to any other origin are
    /// passed through to the network uncached.
    ///
    /// Set via FOLIO_SW_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Version tag embedded in the precache name.
    ///
    /// Bumping it makes the next activation drop the previous precache.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Prefix of the precache name (`<prefix>-<version>`).
    #[serde(default = "default_precache_prefix")]
    pub precache_prefix: String,

    /// Name of the runtime cache (documents, styles, scripts).
    #[serde(default = "default_runtime_cache")]
    pub runtime_cache: String,

    /// Name of the image cache.
    #[serde(default = "default_image_cache")]
    pub image_cache: String,

    /// Entry cap of the runtime cache, applied after network-first writes.
    #[serde(default = "default_max_runtime_entries")]
    pub max_runtime_entries: usize,

    /// Entry cap of the image cache.
    #[serde(default = "default_max_image_entries")]
    pub max_image_entries: usize,

    /// Paths fetched and stored at install time. All must succeed.
    #[serde(default = "default_precache_urls")]
    pub precache_urls: Vec<String>,

    /// Document served for navigations that fail on network and cache.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Endpoint pending form submissions are replayed to on background sync.
    #[serde(default = "default_sync_endpoint")]
    pub sync_endpoint: String,

    /// Activate right after a successful install instead of waiting for
    /// a `skipWaiting` message.
    #[serde(default = "default_true")]
    pub skip_waiting_on_install: bool,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via FOLIO_SW_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via FOLIO_SW_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via FOLIO_SW_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./folio-sw-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_cache_version() -> String {
    "v1.0.0".into()
}

fn default_precache_prefix() -> String {
    "portfolio".into()
}

fn default_runtime_cache() -> String {
    "runtime-cache-v1".into()
}

fn default_image_cache() -> String {
    "image-cache-v1".into()
}

fn default_max_runtime_entries() -> usize {
    30
}

fn default_max_image_entries() -> usize {
    50
}

fn default_precache_urls() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/css/main.css",
        "/css/legacy-styles.css",
        "/css/mobile-fix.css",
        "/css/mobile-enhancements.css",
        "/js/legacy-main.js",
        "/js/progressive-images.js",
        "/pages/offline.html",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_offline_page() -> String {
    "/pages/offline.html".into()
}

fn default_sync_endpoint() -> String {
    "/api/contact".into()
}

fn default_user_agent() -> String {
    "folio-sw/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            cache_version: default_cache_version(),
            precache_prefix: default_precache_prefix(),
            runtime_cache: default_runtime_cache(),
            image_cache: default_image_cache(),
            max_runtime_entries: default_max_runtime_entries(),
            max_image_entries: default_max_image_entries(),
            precache_urls: default_precache_urls(),
            offline_page: default_offline_page(),
            sync_endpoint: default_sync_endpoint(),
            skip_waiting_on_install: true,
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `FOLIO_SW_`
    /// 2. TOML file from `FOLIO_SW_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let config_file = std::env::var_os("FOLIO_SW_CONFIG_FILE").map(PathBuf::from);
        Self::load_with(config_file.as_deref())
    }

    /// Like [`AppConfig::load`], with the TOML file given explicitly.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::load`].
    pub fn load_with(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_path) = config_file {
            figment = figment.merge(Toml::file(config_path));
        }

        figment = figment.merge(
            Env::prefixed("FOLIO_SW_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// The controlled origin as a parsed URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute http(s) URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Invalid {
                field: "origin".into(),
                reason: format!("unsupported scheme: {scheme}"),
            }),
        }
    }

    /// Cache names and caps for the cache manager.
    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            precache_prefix: self.precache_prefix.clone(),
            version: self.cache_version.clone(),
            runtime_cache: self.runtime_cache.clone(),
            image_cache: self.image_cache.clone(),
            max_runtime_entries: self.max_runtime_entries,
            max_image_entries: self.max_image_entries,
        }
    }

    /// Name of the versioned precache.
    pub fn precache_name(&self) -> String {
        format!("{}-{}", self.precache_prefix, self.cache_version)
    }
}
