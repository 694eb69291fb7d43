use std::path::Path;

use super::{AppConfig, ConfigError};

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        tracing::warn!(path = %path.display(), "Config file is empty, using defaults");
        return Ok(AppConfig::default());
    }

    let config: AppConfig = serde_yaml::from_str(&content)?;
    tracing::debug!(path = %path.display(), "Loaded configuration");

    Ok(config)
}
