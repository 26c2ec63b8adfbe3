//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWORKER_*)
//! 2. TOML config file (if SWORKER_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::manifest::{DEFAULT_CACHE_VERSION, EXTERNAL_HOSTS, Manifest, StoreNames};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin the site is served from.
    ///
    /// Set via SWORKER_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Version tag embedded in both store names. Bumping it invalidates
    /// every previously cached response on the next activation.
    ///
    /// Set via SWORKER_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Path to the SQLite cache database.
    ///
    /// Set via SWORKER_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum response body bytes read from the network.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Network timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Whether install pre-caches the external font and icon resources.
    #[serde(default = "default_true")]
    pub precache_external: bool,

    /// Hosts whose cross-origin resources are served stale-while-revalidate.
    #[serde(default = "default_external_hosts")]
    pub external_hosts: Vec<String>,
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_cache_version() -> String {
    DEFAULT_CACHE_VERSION.into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./sworker-cache.sqlite")
}

fn default_user_agent() -> String {
    "sworker/0.1".into()
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

fn default_external_hosts() -> Vec<String> {
    EXTERNAL_HOSTS.iter().map(|h| h.to_string()).collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            cache_version: default_cache_version(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            precache_external: true,
            external_hosts: default_external_hosts(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parsed site origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin is not an http(s) URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Invalid { field: "origin".into(), reason: format!("unsupported scheme {scheme}") }),
        }
    }

    pub fn store_names(&self) -> StoreNames {
        StoreNames::for_version(&self.cache_version)
    }

    /// The embedded manifest bound to this configuration's origin and hosts.
    pub fn manifest(&self) -> Result<Manifest, ConfigError> {
        let manifest = Manifest::new(self.origin_url()?).with_external_hosts(self.external_hosts.clone());
        Ok(if self.precache_external { manifest } else { Manifest { external_assets: Vec::new(), ..manifest } })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SWORKER_`
    /// 2. TOML file from `SWORKER_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("SWORKER_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWORKER_")
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
    use crate::{RequestKind, WorkerRequest, classify};

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.origin, "http://localhost:8080");
        assert_eq!(config.cache_version, "v1.0");
        assert_eq!(config.db_path, PathBuf::from("./sworker-cache.sqlite"));
        assert_eq!(config.user_agent, "sworker/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert!(config.precache_external);
        assert_eq!(config.external_hosts.len(), 3);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_store_names_follow_version() {
        let config = AppConfig { cache_version: "v2.1".into(), ..Default::default() };
        let names = config.store_names();
        assert_eq!(names.static_store, "static-cache-v2.1");
        assert_eq!(names.dynamic_store, "dynamic-cache-v2.1");
    }

    #[test]
    fn test_manifest_without_external_precache() {
        let config = AppConfig { precache_external: false, ..Default::default() };
        let manifest = config.manifest().unwrap();
        assert!(manifest.external_assets.is_empty());
        assert!(!manifest.static_assets.is_empty());
        assert_eq!(manifest.external_hosts.len(), 3);
    }

    #[test]
    fn test_external_hosts_match_case_insensitively() {
        let config = AppConfig { external_hosts: vec![" GStatic.com".into()], ..Default::default() };
        let manifest = config.manifest().unwrap();
        assert_eq!(manifest.external_hosts, vec!["gstatic.com".to_string()]);

        let font = WorkerRequest::get(Url::parse("https://fonts.gstatic.com/s/inter.woff2").unwrap());
        assert_eq!(classify(&manifest, &font), RequestKind::ExternalAsset);
    }

    #[test]
    fn test_origin_url_rejects_other_schemes() {
        let config = AppConfig { origin: "ftp://portfolio.test".into(), ..Default::default() };
        assert!(matches!(config.origin_url(), Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }
}
