//! Central module for application-wide configuration settings.
//!
//! Directories and the listening port come from environment variables; service
//! endpoints, credentials and tunables come from optional JSON files in the
//! secrets directory. A missing file falls back to defaults, a malformed one is
//! an error.

use std::{
    env,
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use adapters::CameraSettings;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 8181;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {reason}")]
    InvalidVar { key: String, reason: String },

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the UI is served from; used for CORS and redirects.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FrontendConfig {
    pub host: String,
    pub port: u16,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".to_string(),
            port: 8080,
        }
    }
}

impl FrontendConfig {
    pub fn url(&self) -> String {
        format!("{}:{}", self.host.trim_end_matches('/'), self.port)
    }

    /// `HEAD`s the frontend root.
    pub async fn is_up(&self) -> bool {
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!("Cannot build HTTP client: {e}");
                return false;
            }
        };

        match client.head(self.url()).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Error connecting to the frontend: {e}");
                false
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MongoConfig {
    pub db: String,
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub backup_path: PathBuf,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            db: "visia_demo".to_string(),
            username: "rootuser".to_string(),
            password: "rootpass".to_string(),
            host: "localhost".to_string(),
            port: 27017,
            backup_path: PathBuf::from("backups"),
        }
    }
}

impl MongoConfig {
    /// Host without any URL scheme, as the driver and the dump tools expect it.
    pub fn bare_host(&self) -> &str {
        self.host
            .trim_start_matches("mongodb://")
            .trim_start_matches("http://")
            .trim_start_matches("https://")
            .trim_end_matches('/')
    }

    /// Connection string without credentials. Those are handed to the driver
    /// separately so reserved characters in the password need no escaping.
    pub fn uri(&self) -> String {
        format!("mongodb://{}:{}/", self.bare_host(), self.port)
    }
}

/// Tunables read from `backend_config.json`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BackendSettings {
    /// Also write the plain uploaded video into the uploads folder.
    pub keep_upload_copies: bool,
    pub check_file_timeout_secs: u64,
    pub new_file_poll_interval_ms: u64,
    pub preview_timeout_secs: u64,
    pub preview_recording_ms: u64,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    pub backup_count: usize,
    pub backups_per_day: usize,
    pub tools_dir: PathBuf,
    pub max_upload_mb: usize,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            keep_upload_copies: false,
            check_file_timeout_secs: 15 * 60,
            new_file_poll_interval_ms: 10_000,
            preview_timeout_secs: 120,
            preview_recording_ms: 1_500,
            access_token_ttl_secs: 15 * 60,
            refresh_token_ttl_secs: 30 * 24 * 60 * 60,
            backup_count: 5,
            backups_per_day: 2,
            tools_dir: PathBuf::from("utils"),
            max_upload_mb: 2048,
        }
    }
}

impl BackendSettings {
    pub fn check_file_timeout(&self) -> Duration {
        Duration::from_secs(self.check_file_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.new_file_poll_interval_ms)
    }

    pub fn preview_timeout(&self) -> Duration {
        Duration::from_secs(self.preview_timeout_secs)
    }

    pub fn preview_recording(&self) -> Duration {
        Duration::from_millis(self.preview_recording_ms)
    }

    pub fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl_secs)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_secs)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub secrets_dir: PathBuf,
    pub log_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub static_dir: PathBuf,
    pub frontend: FrontendConfig,
    pub mongo: MongoConfig,
    pub camera: CameraSettings,
    pub backend: BackendSettings,
}

impl Config {
    /// Loads the configuration from the environment and the secrets directory.
    pub fn load() -> Result<Self, ConfigError> {
        let port = try_load("VISIA_PORT", &DEFAULT_PORT.to_string())?;
        let secrets_dir: PathBuf = try_load("VISIA_SECRETS_DIR", "secrets")?;
        let log_dir = Self::log_dir()?;
        let uploads_dir = try_load("VISIA_UPLOADS_DIR", "uploads")?;
        let static_dir = try_load("VISIA_STATIC_DIR", "static")?;

        Ok(Self {
            port,
            frontend: load_json_or_default(&secrets_dir.join("frontend_config.json"))?,
            mongo: load_json_or_default(&secrets_dir.join("mongo_config.json"))?,
            camera: load_json_or_default(&secrets_dir.join("camera_config.json"))?,
            backend: load_json_or_default(&secrets_dir.join("backend_config.json"))?,
            secrets_dir,
            log_dir,
            uploads_dir,
            static_dir,
        })
    }

    /// Directory for the rolling log file. Read on its own so logging can start
    /// before the rest of the configuration is loaded.
    pub fn log_dir() -> Result<PathBuf, ConfigError> {
        try_load("VISIA_LOG_DIR", "logs")
    }

    /// Default configuration with every directory placed under `root`.
    pub fn rooted(root: &Path) -> Self {
        let backend = BackendSettings {
            tools_dir: root.join("utils"),
            ..BackendSettings::default()
        };
        let mongo = MongoConfig {
            backup_path: root.join("backups"),
            ..MongoConfig::default()
        };
        let camera = CameraSettings {
            storage_path: root.join("uploads"),
            ..CameraSettings::default()
        };

        Self {
            port: DEFAULT_PORT,
            secrets_dir: root.join("secrets"),
            log_dir: root.join("logs"),
            uploads_dir: root.join("uploads"),
            static_dir: root.join("static"),
            frontend: FrontendConfig::default(),
            mongo,
            camera,
            backend,
        }
    }

    pub fn secret_key_path(&self) -> PathBuf {
        self.secrets_dir.join("secret.key")
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e: T::Err| ConfigError::InvalidVar {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Reads a JSON config file. Keys present in the file override the defaults.
pub fn load_json_or_default<T>(path: &Path) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        warn!("Config file not found - Location: {}", path.display());
        info!("Using default values for {}", path.display());
        return Ok(T::default());
    }

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value = serde_json::from_str(&raw).map_err(|source| ConfigError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Configuration loaded from {}", path.display());
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_override_only_named_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mongo_config.json");
        std::fs::write(&path, r#"{"db": "visia", "port": 27018}"#).expect("write");

        let mongo: MongoConfig = load_json_or_default(&path).expect("load");
        assert_eq!(mongo.db, "visia");
        assert_eq!(mongo.port, 27018);
        assert_eq!(mongo.username, "rootuser");
    }

    #[test]
    fn missing_files_use_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let frontend: FrontendConfig =
            load_json_or_default(&dir.path().join("frontend_config.json")).expect("load");
        assert_eq!(frontend, FrontendConfig::default());
        assert_eq!(frontend.url(), "http://localhost:8080");
    }

    #[test]
    fn malformed_files_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("backend_config.json");
        std::fs::write(&path, "{not json").expect("write");

        let err = load_json_or_default::<BackendSettings>(&path).expect_err("malformed");
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn mongo_uri_strips_schemes_and_leaves_out_credentials() {
        let mongo = MongoConfig {
            host: "http://db.local".to_string(),
            password: "p@ss:w/rd".to_string(),
            ..MongoConfig::default()
        };
        assert_eq!(mongo.uri(), "mongodb://db.local:27017/");
        assert_eq!(
            MongoConfig::default().uri(),
            "mongodb://localhost:27017/"
        );
    }
}
