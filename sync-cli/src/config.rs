//! Configuration loading for cleanout-sync.
//!
//! Configuration is loaded from a TOML file (default: `cleanout-sync.toml`
//! in the data directory). Every section and field has a default, so a
//! missing file or a partial one is fine.

use cleanout_sync_client::{GatewayConfig, DEFAULT_BASE_URL, DEFAULT_CHECK_INTERVAL};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the config file looked up in the data directory.
pub const CONFIG_FILE_NAME: &str = "cleanout-sync.toml";

/// Root configuration for cleanout-sync.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Backend configuration.
    pub backend: BackendConfig,
    /// Queue storage configuration.
    pub storage: StorageConfig,
    /// Connectivity monitor configuration.
    pub monitor: MonitorConfig,
}

/// Backend configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BackendConfig {
    /// Backend root URL (default: http://localhost:8000).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for JSON requests in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Timeout for room uploads in seconds (default: 60).
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,
    /// Timeout for the health check in seconds (default: 5).
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,
}

/// Where the queue is persisted.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One file per key under the data directory.
    #[default]
    File,
    /// SQLite database in the data directory.
    Sqlite,
    /// Process memory; nothing survives the command.
    Memory,
}

/// Queue storage configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Storage backend (default: file).
    #[serde(default)]
    pub backend: StorageBackend,
    /// Namespace separating this app's keys (default: cleanout).
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// SQLite database file, relative to the data directory (default: cleanout-sync.db).
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

/// Connectivity monitor configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MonitorConfig {
    /// Seconds between connectivity checks (default: 30).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

// Default value functions
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_upload_timeout_secs() -> u64 {
    60
}

fn default_health_timeout_secs() -> u64 {
    5
}

fn default_namespace() -> String {
    "cleanout".to_string()
}

fn default_database() -> PathBuf {
    PathBuf::from("cleanout-sync.db")
}

fn default_interval_secs() -> u64 {
    DEFAULT_CHECK_INTERVAL.as_secs()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            upload_timeout_secs: default_upload_timeout_secs(),
            health_timeout_secs: default_health_timeout_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            namespace: default_namespace(),
            database: default_database(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl BackendConfig {
    /// Gateway configuration for these settings.
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::new(self.base_url.as_str())
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_upload_timeout(Duration::from_secs(self.upload_timeout_secs))
            .with_health_timeout(Duration::from_secs(self.health_timeout_secs))
    }
}

impl MonitorConfig {
    /// Check interval. Zero is raised to one second.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load the explicit `path`, or the data directory's config file if it
    /// exists, or the defaults.
    pub fn load(path: Option<&Path>, data_dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        let default_path = data_dir.join(CONFIG_FILE_NAME);
        if default_path.exists() {
            Self::from_file(&default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.backend.request_timeout_secs, 30);
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.namespace, "cleanout");
        assert_eq!(config.monitor.interval_secs, 30);
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[backend]
base_url = "https://api.cleanout.example"
upload_timeout_secs = 120

[storage]
backend = "sqlite"
namespace = "crew-7"

[monitor]
interval_secs = 10
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.backend.base_url, "https://api.cleanout.example");
        assert_eq!(config.backend.upload_timeout_secs, 120);
        assert_eq!(config.backend.health_timeout_secs, 5);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.storage.namespace, "crew-7");
        assert_eq!(config.storage.database, PathBuf::from("cleanout-sync.db"));
        assert_eq!(config.monitor.interval_secs, 10);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn unknown_storage_backend_is_rejected() {
        let result: Result<Config, _> = toml::from_str("[storage]\nbackend = \"redis\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn gateway_config_carries_timeouts() {
        let backend = BackendConfig {
            base_url: "http://backend/".into(),
            request_timeout_secs: 3,
            upload_timeout_secs: 7,
            health_timeout_secs: 1,
        };
        let gateway = backend.gateway_config();
        assert_eq!(gateway.base_url, "http://backend");
        assert_eq!(gateway.request_timeout, Duration::from_secs(3));
        assert_eq!(gateway.upload_timeout, Duration::from_secs(7));
        assert_eq!(gateway.health_timeout, Duration::from_secs(1));
    }

    #[test]
    fn zero_interval_is_clamped() {
        let monitor = MonitorConfig { interval_secs: 0 };
        assert_eq!(monitor.interval(), Duration::from_secs(1));
    }

    #[test]
    fn load_prefers_explicit_path() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[monitor]\ninterval_secs = 99\n",
        )
        .unwrap();
        let explicit = dir.path().join("other.toml");
        std::fs::write(&explicit, "[monitor]\ninterval_secs = 5\n").unwrap();

        assert_eq!(
            Config::load(Some(&explicit), dir.path()).unwrap().monitor.interval_secs,
            5
        );
        assert_eq!(
            Config::load(None, dir.path()).unwrap().monitor.interval_secs,
            99
        );
    }

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        assert_eq!(Config::load(None, dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::load(Some(&missing), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }
}
