//! Configuration for the editor watcher.

use crate::client::{DEFAULT_PORT, TESTING_PORT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default merge window for heartbeats, in seconds.
pub const DEFAULT_PULSE_TIME_SECS: f64 = 20.0;

/// Main configuration for the watcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// ActivityWatch server host
    pub server_host: String,

    /// ActivityWatch server port (defaults depend on `testing`)
    pub server_port: Option<u16>,

    /// Talk to a testing-mode server
    pub testing: bool,

    /// Rate ceiling for heartbeats within the same file and branch
    pub max_heartbeats_per_sec: Option<f64>,

    /// Overrides the app short name used in the bucket id
    pub bucket_suffix: Option<String>,

    /// Server-side merge window for heartbeats (in seconds)
    pub pulse_time_secs: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: None,
            testing: false,
            max_heartbeats_per_sec: None,
            bucket_suffix: None,
            pulse_time_secs: DEFAULT_PULSE_TIME_SECS,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load configuration from `path`, falling back to defaults on error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load_from(path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "using default configuration");
            Self::default()
        })
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        Self::data_dir().join("config.json")
    }

    /// Directory holding the configuration file.
    pub fn data_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("aw-watcher-editor")
    }

    /// Effective server port.
    pub fn port(&self) -> u16 {
        self.server_port.unwrap_or(if self.testing {
            TESTING_PORT
        } else {
            DEFAULT_PORT
        })
    }

    /// Base URL of the ActivityWatch server.
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.port())
    }

    /// Bucket suffix override, if set to something non-blank.
    pub fn bucket_suffix(&self) -> Option<&str> {
        self.bucket_suffix
            .as_deref()
            .filter(|suffix| !suffix.trim().is_empty())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
