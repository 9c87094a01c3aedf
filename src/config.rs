//! Sidecar Configuration
//!
//! Loaded from a JSON file, then overridden from the environment, then
//! validated. Every field except the provider endpoint, key, and database
//! has a default.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_ENDPOINT: &str = "COSMOS_ENDPOINT";
pub const ENV_KEY: &str = "COSMOS_KEY";
pub const ENV_DATABASE: &str = "COSMOS_DATABASE";
pub const ENV_PORT: &str = "SIDECAR_PORT";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SidecarConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub cosmos: CosmosConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Provider account configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CosmosConfig {
    /// Account endpoint, e.g. `https://acct.documents.azure.com:443/`
    #[serde(default)]
    pub endpoint: String,

    /// Base64 master key
    #[serde(default, skip_serializing)]
    pub key: String,

    /// Database every container lives in
    #[serde(default)]
    pub database: String,

    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Parallel cross-partition execution; 0 disables it.
    /// Independent of the per-request page size.
    #[serde(default)]
    pub max_degree_of_parallelism: u32,
}

/// Client connection tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Idle connections kept per host (default: 100)
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Whole-request timeout in milliseconds (default: 60000)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_max_connections() -> usize {
    100
}

fn default_request_timeout_ms() -> u64 {
    60_000
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl SidecarConfig {
    /// Load, apply environment overrides, and validate
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse the file without overrides or validation
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            self.cosmos.endpoint = endpoint;
        }
        if let Some(key) = lookup(ENV_KEY) {
            self.cosmos.key = key;
        }
        if let Some(database) = lookup(ENV_DATABASE) {
            self.cosmos.database = database;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::invalid("server.port", format!("'{}' is not a port", port)))?;
        }
        Ok(())
    }

    /// Validate all fields
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid("server.port", "must be > 0"));
        }

        let endpoint = self.cosmos.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigError::invalid("cosmos.endpoint", "must be set"));
        }
        let url = reqwest::Url::parse(endpoint)
            .map_err(|e| ConfigError::invalid("cosmos.endpoint", e.to_string()))?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::invalid(
                "cosmos.endpoint",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        if self.cosmos.key.is_empty() {
            return Err(ConfigError::invalid("cosmos.key", "must be set"));
        }
        STANDARD
            .decode(self.cosmos.key.trim())
            .map_err(|_| ConfigError::invalid("cosmos.key", "not valid base64"))?;

        if self.cosmos.database.trim().is_empty() {
            return Err(ConfigError::invalid("cosmos.database", "must be set"));
        }

        if self.cosmos.connection.max_connections == 0 {
            return Err(ConfigError::invalid(
                "cosmos.connection.max_connections",
                "must be > 0",
            ));
        }
        if self.cosmos.connection.request_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "cosmos.connection.request_timeout_ms",
                "must be > 0",
            ));
        }

        Ok(())
    }
}
