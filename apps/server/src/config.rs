//! Server configuration.
//!
//! Loaded in two layers: an optional TOML file named by `KASIR_CONFIG`, then
//! environment variables. Anything left unset falls back to development
//! defaults.
//!
//! ```toml
//! # kasir.toml
//! bind_addr = "0.0.0.0:8080"
//! database_path = "/var/lib/kasir/kasir.db"
//! max_connections = 5
//! page_size = 20
//! ```

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: SocketAddr,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Rows per page of the summary history
    pub page_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            database_path: PathBuf::from("./kasir_dev.db"),
            max_connections: 5,
            page_size: 20,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from `KASIR_CONFIG` (if set) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let base = match env::var("KASIR_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => ServerConfig::default(),
        };

        base.with_overrides(|key| env::var(key).ok())
    }

    /// Reads a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Unreadable(format!("{}: {}", path, e)))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(contents)?;
        config.validate()
    }

    /// Applies `KASIR_*` overrides looked up through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("KASIR_BIND_ADDR") {
            self.bind_addr = value
                .parse()
                .map_err(|_| ConfigError::InvalidValue("KASIR_BIND_ADDR".to_string()))?;
        }

        if let Some(value) = lookup("KASIR_DATABASE_PATH") {
            self.database_path = PathBuf::from(value);
        }

        if let Some(value) = lookup("KASIR_MAX_CONNECTIONS") {
            self.max_connections = value
                .parse()
                .map_err(|_| ConfigError::InvalidValue("KASIR_MAX_CONNECTIONS".to_string()))?;
        }

        if let Some(value) = lookup("KASIR_PAGE_SIZE") {
            self.page_size = value
                .parse()
                .map_err(|_| ConfigError::InvalidValue("KASIR_PAGE_SIZE".to_string()))?;
        }

        self.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue("page_size".to_string()));
        }
        Ok(self)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Cannot read config file {0}")]
    Unreadable(String),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}
