//! Settings storage backends

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::ProviderSettings;

/// Versioned document key; bump the suffix when the layout changes
pub const SETTINGS_KEY: &str = "globalProviderSettings_v1";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Settings store unavailable: {0}")]
    Unavailable(String),
}

/// Load/save boundary for provider settings
pub trait SettingsStore: Send + Sync {
    /// Load the whole settings map; a missing store yields an empty map
    fn load(&self) -> Result<ProviderSettings, SettingsError>;

    /// Replace the whole settings map
    fn save(&self, settings: &ProviderSettings) -> Result<(), SettingsError>;

    /// Name of the backend (for logging)
    fn name(&self) -> &str;
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct SettingsDocument {
    #[serde(rename = "globalProviderSettings_v1", default)]
    providers: ProviderSettings,
}

/// JSON file store, written atomically through a temp file in the same directory
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<ProviderSettings, SettingsError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No settings file yet, starting empty");
            return Ok(ProviderSettings::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ProviderSettings::new());
        }

        let document: SettingsDocument = serde_json::from_str(&content)?;
        Ok(document.providers)
    }

    fn save(&self, settings: &ProviderSettings) -> Result<(), SettingsError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let document = SettingsDocument {
            providers: settings.clone(),
        };
        let json = serde_json::to_vec_pretty(&document)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| SettingsError::Io(e.error))?;

        tracing::debug!(path = %self.path.display(), providers = settings.len(), "Settings saved");
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// In-process store, used by tests and when no settings path is configured
#[derive(Default)]
pub struct MemorySettingsStore {
    inner: Mutex<ProviderSettings>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: ProviderSettings) -> Self {
        Self {
            inner: Mutex::new(settings),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<ProviderSettings, SettingsError> {
        self.inner
            .lock()
            .map(|guard| guard.clone())
            .map_err(|e| SettingsError::Unavailable(e.to_string()))
    }

    fn save(&self, settings: &ProviderSettings) -> Result<(), SettingsError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| SettingsError::Unavailable(e.to_string()))?;
        *guard = settings.clone();
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
