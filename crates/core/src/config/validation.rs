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

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the manifest is empty, and
    /// `ConfigError::Invalid` if:
    /// - `origin` is not an absolute http(s) URL
    /// - `cache_version`, `app_slug` or `user_agent` is empty
    /// - `static_prefix` or `api_prefix` does not start and end with `/`
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    pub fn validate(&self) -> Result<(), ConfigError> {
        match url::Url::parse(&self.origin) {
            Ok(origin) if matches!(origin.scheme(), "http" | "https") => {}
            Ok(_) => return Err(invalid("origin", "scheme must be http or https")),
            Err(e) => return Err(invalid("origin", &e.to_string())),
        }

        if self.cache_version.trim().is_empty() {
            return Err(invalid("cache_version", "must not be empty"));
        }
        if self.app_slug.trim().is_empty() {
            return Err(invalid("app_slug", "must not be empty"));
        }
        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        for (field, prefix) in [("static_prefix", &self.static_prefix), ("api_prefix", &self.api_prefix)] {
            if !prefix.starts_with('/') || !prefix.ends_with('/') {
                return Err(invalid(field, "must start and end with '/'"));
            }
        }

        if self.manifest.is_empty() {
            return Err(ConfigError::Missing {
                field: "manifest".into(),
                hint: "list the assets to pre-cache under `manifest` in the config file".into(),
            });
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

        if self.asset_hosts.is_empty() {
            tracing::warn!("asset_hosts is empty; third-party assets will use stale-while-revalidate");
        }

        Ok(())
    }
}
