//! Per-provider user settings and their resolution against registry defaults

mod store;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::providers::Provider;

pub use store::{FileSettingsStore, MemorySettingsStore, SettingsError, SettingsStore, SETTINGS_KEY};

/// User overrides for one provider; absent or empty fields fall back to the
/// registry defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalProviderSetting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl GlobalProviderSetting {
    /// Copy with the API key masked for display
    pub fn masked(&self) -> Self {
        Self {
            api_key: self.api_key.as_deref().map(mask_secret),
            custom_url: self.custom_url.clone(),
            default_model: self.default_model.clone(),
        }
    }
}

/// At most one setting per provider
pub type ProviderSettings = BTreeMap<Provider, GlobalProviderSetting>;

/// Per-request values supplied by the caller, highest precedence
#[derive(Debug, Clone, Default)]
pub struct ProviderOverrides {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

impl ProviderOverrides {
    /// Build overrides from raw form strings; empty strings count as absent
    pub fn from_fields(url: &str, api_key: &str, model: &str) -> Self {
        Self {
            url: non_empty(Some(url)),
            api_key: non_empty(Some(api_key)),
            model: non_empty(Some(model)),
        }
    }
}

/// Endpoint, credentials, and model after resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProvider {
    pub provider: Provider,
    pub url: String,
    pub api_key: Option<String>,
    pub model: String,
}

/// Resolve in order: request override, stored setting, registry default
pub fn resolve(provider: Provider, overrides: &ProviderOverrides, settings: &ProviderSettings) -> ResolvedProvider {
    let stored = settings.get(&provider);
    let defaults = provider.config();

    let url = non_empty(overrides.url.as_deref())
        .or_else(|| non_empty(stored.and_then(|s| s.custom_url.as_deref())))
        .unwrap_or_else(|| defaults.base_url.to_string());

    let api_key = non_empty(overrides.api_key.as_deref())
        .or_else(|| non_empty(stored.and_then(|s| s.api_key.as_deref())));

    let model = non_empty(overrides.model.as_deref())
        .or_else(|| non_empty(stored.and_then(|s| s.default_model.as_deref())))
        .unwrap_or_else(|| defaults.default_model.to_string());

    ResolvedProvider {
        provider,
        url,
        api_key,
        model,
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Mask a secret, keeping a short prefix and suffix
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 10 {
        return "****".to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// A JSON file store when a path is configured, an in-memory one otherwise
pub fn open_store(path: Option<&Path>) -> Arc<dyn SettingsStore> {
    match path {
        Some(path) => Arc::new(FileSettingsStore::new(path)),
        None => {
            tracing::debug!("No settings path configured, provider settings live in memory only");
            Arc::new(MemorySettingsStore::new())
        }
    }
}

/// Process-wide settings: loaded once, written through on every update
pub struct SettingsHandle {
    store: Arc<dyn SettingsStore>,
    current: RwLock<ProviderSettings>,
}

impl SettingsHandle {
    /// Load the current settings from the store
    pub fn load(store: Arc<dyn SettingsStore>) -> Result<Self, SettingsError> {
        let current = store.load()?;
        tracing::info!(
            store = store.name(),
            providers = current.len(),
            "Provider settings loaded"
        );
        Ok(Self {
            store,
            current: RwLock::new(current),
        })
    }

    /// Copy of the current settings
    pub async fn snapshot(&self) -> ProviderSettings {
        self.current.read().await.clone()
    }

    /// Replace one provider's setting and persist the whole map
    pub async fn update(&self, provider: Provider, setting: GlobalProviderSetting) -> Result<(), SettingsError> {
        let mut guard = self.current.write().await;
        let mut next = guard.clone();
        next.insert(provider, setting);
        *guard = self.persist(next).await?;
        tracing::info!(provider = %provider, "Provider setting updated");
        Ok(())
    }

    /// Remove one provider's setting and persist
    pub async fn remove(&self, provider: Provider) -> Result<bool, SettingsError> {
        let mut guard = self.current.write().await;
        if !guard.contains_key(&provider) {
            return Ok(false);
        }
        let mut next = guard.clone();
        next.remove(&provider);
        *guard = self.persist(next).await?;
        Ok(true)
    }

    /// Save on the blocking pool. Callers hold the write guard across the
    /// await, so writes stay serialized and the map only changes on success.
    async fn persist(&self, next: ProviderSettings) -> Result<ProviderSettings, SettingsError> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.save(&next).map(|()| next))
            .await
            .map_err(|e| SettingsError::Unavailable(format!("settings save task failed: {}", e)))?
    }
}
