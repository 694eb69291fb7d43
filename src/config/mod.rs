mod loader;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use loader::load_config;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    /// Apply a permissive CORS layer to every route, not just the model list
    #[serde(default)]
    pub cors_permissive: bool,
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            cors_permissive: false,
        }
    }
}

/// Outbound relay configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    /// Upper bound on one upstream generation call
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Largest inbound request body accepted
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Log request/response bodies (redacted) at debug level
    #[serde(default = "default_log_bodies")]
    pub log_bodies: bool,
    /// Characters of a body kept per log line
    #[serde(default = "default_body_log_limit")]
    pub body_log_limit: usize,
    /// TLS configuration options
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

/// TLS configuration for upstream connections
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Accept invalid certificates (self-signed, expired)
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// Path to custom CA certificate (PEM format)
    pub ca_cert_path: Option<String>,
}

fn default_timeout() -> u64 {
    300
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_log_bodies() -> bool {
    true
}

fn default_body_log_limit() -> usize {
    2000
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_body_bytes: default_max_body_bytes(),
            log_bodies: default_log_bodies(),
            body_log_limit: default_body_log_limit(),
            tls: None,
        }
    }
}

/// Model-list relay configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_timeout")]
    pub timeout_seconds: u64,
    /// Used by `list-models` when no URL is given
    #[serde(default = "default_ollama_url")]
    pub default_url: String,
}

fn default_ollama_timeout() -> u64 {
    5
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_ollama_timeout(),
            default_url: default_ollama_url(),
        }
    }
}

/// Provider settings persistence
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SettingsConfig {
    /// JSON file holding provider settings; in-memory only when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Stats logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatsConfig {
    #[serde(default = "default_stats_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub format: StatsFormat,
}

fn default_stats_enabled() -> bool {
    true
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            enabled: default_stats_enabled(),
            format: StatsFormat::default(),
        }
    }
}

/// Stats output format
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StatsFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

/// Places searched when no config path is given
pub const DEFAULT_CONFIG_PATHS: [&str; 3] = ["config.yaml", "config.yml", "./config/config.yaml"];

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = load_config(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback to default path
    pub fn load_or_default(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => Self::from_file(path),
            None => Self::load_first(DEFAULT_CONFIG_PATHS.iter().map(Path::new)),
        }
    }

    fn load_first<'a>(candidates: impl IntoIterator<Item = &'a Path>) -> Result<Self, ConfigError> {
        let mut tried = Vec::new();
        for path in candidates {
            if path.exists() {
                return Self::from_file(path);
            }
            tried.push(path.display().to_string());
        }
        Err(ConfigError::NotFound(format!(
            "No config file found. Tried: {}",
            tried.join(", ")
        )))
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Validation("server.host must not be empty".to_string()));
        }
        if self.relay.timeout_seconds == 0 {
            return Err(ConfigError::Validation("relay.timeout_seconds must be > 0".to_string()));
        }
        if self.relay.max_body_bytes == 0 {
            return Err(ConfigError::Validation("relay.max_body_bytes must be > 0".to_string()));
        }
        if self.ollama.timeout_seconds == 0 {
            return Err(ConfigError::Validation("ollama.timeout_seconds must be > 0".to_string()));
        }
        if !self.ollama.default_url.starts_with("http") {
            return Err(ConfigError::Validation(format!(
                "ollama.default_url must start with http: '{}'",
                self.ollama.default_url
            )));
        }
        if let Some(ref tls) = self.relay.tls {
            if let Some(ref ca) = tls.ca_cert_path {
                if !Path::new(ca).exists() {
                    return Err(ConfigError::Validation(format!("CA certificate not found: {}", ca)));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}
