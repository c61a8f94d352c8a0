//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an absolute http(s) URL
    /// - `cache_version` or a cache name is empty, or two cache names collide
    /// - a cache cap is 0
    /// - `precache_urls` is empty
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.origin_url()?;

        if self.cache_version.trim().is_empty() {
            return Err(invalid("cache_version", "must not be empty"));
        }
        if self.precache_prefix.trim().is_empty() {
            return Err(invalid("precache_prefix", "must not be empty"));
        }
        if self.runtime_cache.trim().is_empty() {
            return Err(invalid("runtime_cache", "must not be empty"));
        }
        if self.image_cache.trim().is_empty() {
            return Err(invalid("image_cache", "must not be empty"));
        }

        let precache = self.precache_name();
        if self.runtime_cache == self.image_cache
            || self.runtime_cache == precache
            || self.image_cache == precache
        {
            return Err(invalid("runtime_cache", "cache names must be distinct"));
        }

        if self.max_runtime_entries == 0 {
            return Err(invalid("max_runtime_entries", "must be greater than 0"));
        }
        if self.max_image_entries == 0 {
            return Err(invalid("max_image_entries", "must be greater than 0"));
        }

        if self.precache_urls.is_empty() {
            return Err(invalid("precache_urls", "must list at least one URL"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if !self.precache_urls.contains(&self.offline_page) {
            tracing::warn!(
                offline_page = %self.offline_page,
                "offline page is not in precache_urls; offline navigations will get a 503 until it is cached"
            );
        }

        Ok(())
    }
}
