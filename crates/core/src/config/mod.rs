//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (STOWAWAY_*)
//! 2. TOML config file (if STOWAWAY_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (STOWAWAY_*)
/// 2. TOML config file (if STOWAWAY_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database holding the cache stores.
    ///
    /// Set via STOWAWAY_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin that relative request and manifest URLs resolve against.
    ///
    /// Set via STOWAWAY_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Application name, used as the notification title.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Short identifier prefixed to the version id reported to clients.
    #[serde(default = "default_app_slug")]
    pub app_slug: String,

    /// Deployed cache version; suffix of both store names.
    ///
    /// Set via STOWAWAY_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Path prefix of locally served static assets.
    #[serde(default = "default_static_prefix")]
    pub static_prefix: String,

    /// Path prefix of the REST backend.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Third-party hosts whose assets are served cache-first.
    #[serde(default = "default_asset_hosts")]
    pub asset_hosts: Vec<String>,

    /// URLs fetched into the static store at install time.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// URL opened when a notification is clicked.
    #[serde(default = "default_root_url")]
    pub root_url: String,

    /// User-Agent string for network requests.
    ///
    /// Set via STOWAWAY_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via STOWAWAY_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to read per response.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./stowaway-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:5000".into()
}

fn default_app_name() -> String {
    "Automation AI Advisor".into()
}

fn default_app_slug() -> String {
    "automation-ai-advisor".into()
}

fn default_cache_version() -> String {
    "v1.0.0".into()
}

fn default_static_prefix() -> String {
    "/static/".into()
}

fn default_api_prefix() -> String {
    "/api/".into()
}

fn default_asset_hosts() -> Vec<String> {
    vec!["cdn.jsdelivr.net".into()]
}

fn default_manifest() -> Vec<String> {
    [
        "/",
        "/static/css/style.css",
        "/static/js/dashboard.js",
        "/static/js/notifications.js",
        "/static/js/kanban.js",
        "/static/js/roi.js",
        "/static/js/recommendations.js",
        "/static/manifest.json",
        "https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css",
        "https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/js/bootstrap.bundle.min.js",
        "https://cdn.jsdelivr.net/npm/chart.js@4.4.0/dist/chart.min.js",
        "https://cdn.jsdelivr.net/npm/bootstrap-icons@1.10.0/font/bootstrap-icons.css",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_root_url() -> String {
    "/".into()
}

fn default_user_agent() -> String {
    "stowaway/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            app_name: default_app_name(),
            app_slug: default_app_slug(),
            cache_version: default_cache_version(),
            static_prefix: default_static_prefix(),
            api_prefix: default_api_prefix(),
            asset_hosts: default_asset_hosts(),
            manifest: default_manifest(),
            root_url: default_root_url(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Version identifier reported to clients, e.g. `automation-ai-advisor-v1.0.0`.
    pub fn version_id(&self) -> String {
        format!("{}-{}", self.app_slug, self.cache_version)
    }

    /// Name of the active static store.
    pub fn static_store(&self) -> String {
        format!("static-{}", self.cache_version)
    }

    /// Name of the active dynamic store.
    pub fn dynamic_store(&self) -> String {
        format!("dynamic-{}", self.cache_version)
    }

    /// Manifest entries that are plain paths on the origin.
    pub fn manifest_paths(&self) -> impl Iterator<Item = &str> {
        self.manifest.iter().map(String::as_str).filter(|e| e.starts_with('/'))
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `STOWAWAY_`
    /// 2. TOML file from `STOWAWAY_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("STOWAWAY_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("STOWAWAY_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./stowaway-cache.sqlite"));
        assert_eq!(config.origin, "http://localhost:5000");
        assert_eq!(config.static_prefix, "/static/");
        assert_eq!(config.api_prefix, "/api/");
        assert_eq!(config.asset_hosts, vec!["cdn.jsdelivr.net".to_string()]);
        assert_eq!(config.manifest.len(), 12);
        assert_eq!(config.timeout_ms, 20_000);
    }

    #[test]
    fn test_store_names() {
        let config = AppConfig::default();
        assert_eq!(config.static_store(), "static-v1.0.0");
        assert_eq!(config.dynamic_store(), "dynamic-v1.0.0");
        assert_eq!(config.version_id(), "automation-ai-advisor-v1.0.0");
    }

    #[test]
    fn test_manifest_paths_skip_absolute_urls() {
        let config = AppConfig::default();
        let paths: Vec<&str> = config.manifest_paths().collect();
        assert_eq!(paths.len(), 8);
        assert!(paths.contains(&"/"));
        assert!(paths.iter().all(|p| !p.contains("cdn.jsdelivr.net")));
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_load_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("stowaway.toml", "cache_version = \"v2\"\napi_prefix = \"/rest/\"")?;
            jail.set_env("STOWAWAY_CONFIG_FILE", "stowaway.toml");
            jail.set_env("STOWAWAY_CACHE_VERSION", "v3");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.cache_version, "v3");
            assert_eq!(config.api_prefix, "/rest/");
            assert_eq!(config.static_store(), "static-v3");
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("STOWAWAY_TIMEOUT_MS", "10");
            assert!(matches!(AppConfig::load(), Err(ConfigError::Invalid { .. })));
            Ok(())
        });
    }
}
