//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Command-line overrides
//! 2. Environment variables (CATCACHE_*)
//! 3. TOML config file (if CATCACHE_CONFIG_FILE or `--config` is set)
//! 4. Built-in defaults

use std::path::{Path, PathBuf};
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
/// 1. Command-line overrides
/// 2. Environment variables (CATCACHE_*)
/// 3. TOML config file
/// 4. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address to bind the HTTP listener to.
    ///
    /// Set via `-h/--host` or CATCACHE_HOST. Required.
    #[serde(default)]
    pub host: Option<String>,

    /// Port to bind the HTTP listener to.
    ///
    /// Set via `-p/--port` or CATCACHE_PORT. Required.
    #[serde(default)]
    pub port: Option<u16>,

    /// Directory holding one `<key>.jpg` file per cached entry.
    ///
    /// Set via `-c/--cache` or CATCACHE_CACHE_DIR. Required.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Base URL of the upstream image provider.
    ///
    /// Set via CATCACHE_UPSTREAM_URL environment variable.
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    /// User-Agent string for upstream requests.
    ///
    /// Set via CATCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Upstream request timeout in milliseconds.
    ///
    /// Set via CATCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes accepted from the upstream or in a PUT body.
    ///
    /// Set via CATCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Whether concurrent misses on one key share a single upstream fetch.
    ///
    /// Set via CATCACHE_SINGLE_FLIGHT environment variable.
    #[serde(default = "default_true")]
    pub single_flight: bool,
}

fn default_upstream_url() -> String {
    "https://http.cat".into()
}

fn default_user_agent() -> String {
    "catcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            cache_dir: None,
            upstream_url: default_upstream_url(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            single_flight: true,
        }
    }
}

/// Values supplied on the command line.
///
/// Unset fields are skipped so they never mask lower layers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// TOML file to read; takes precedence over CATCACHE_CONFIG_FILE.
    #[serde(skip)]
    pub config_file: Option<PathBuf>,
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from the file and environment layers only.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::load_with`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(ConfigOverrides::default())
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. `overrides` (command line)
    /// 2. Environment variables prefixed with `CATCACHE_`
    /// 3. TOML file from `overrides.config_file` or `CATCACHE_CONFIG_FILE`
    /// 4. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load_with(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let config_file = overrides
            .config_file
            .clone()
            .or_else(|| std::env::var_os("CATCACHE_CONFIG_FILE").map(PathBuf::from));
        if let Some(config_path) = config_file {
            figment = figment.merge(Toml::file(config_path));
        }

        figment = figment
            .merge(
                Env::prefixed("CATCACHE_")
                    .ignore(&["CONFIG_FILE"])
                    .map(|key| key.as_str().to_lowercase().into())
                    .split("__"),
            )
            .merge(Serialized::defaults(overrides));

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no host is configured.
    pub fn require_host(&self) -> Result<&str, ConfigError> {
        self.host.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "host".into(),
            hint: "Pass -h/--host or set CATCACHE_HOST".into(),
        })
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no port is configured.
    pub fn require_port(&self) -> Result<u16, ConfigError> {
        self.port.ok_or_else(|| ConfigError::Missing {
            field: "port".into(),
            hint: "Pass -p/--port or set CATCACHE_PORT".into(),
        })
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no cache directory is configured.
    pub fn require_cache_dir(&self) -> Result<&Path, ConfigError> {
        self.cache_dir.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "cache_dir".into(),
            hint: "Pass -c/--cache or set CATCACHE_CACHE_DIR".into(),
        })
    }

    /// `host:port` string suitable for binding a listener.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if host or port is not configured.
    pub fn bind_address(&self) -> Result<String, ConfigError> {
        let host = self.require_host()?;
        let port = self.require_port()?;
        if host.contains(':') && !host.starts_with('[') {
            Ok(format!("[{host}]:{port}"))
        } else {
            Ok(format!("{host}:{port}"))
        }
    }
}
