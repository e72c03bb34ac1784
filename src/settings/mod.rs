//! Settings Module
//!
//! Persists the reasoning-service credential across restarts. The key is
//! encrypted at rest using AES-256-GCM; the first load falls back to the
//! configured default when nothing has been stored yet.

pub mod storage;
pub mod routes;

pub use storage::*;
pub use routes::router;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::models::Credential;

/// Settings persisted on disk
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserSettings {
    /// The API key (encrypted at rest, decrypted when loaded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Credential status for display (never includes the key itself)
#[derive(Debug, Clone, Serialize)]
pub struct SettingsResponse {
    pub has_key: bool,
    pub key_hint: Option<String>,
    pub provider: String,
    pub model: String,
}

/// Request to update settings; an empty `api_key` removes the stored key
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSettingsRequest {
    pub api_key: Option<String>,
}

/// Process-wide credential shared by the analysis and chat clients.
#[derive(Clone)]
pub struct CredentialStore {
    current: Arc<RwLock<Option<Credential>>>,
    storage: Option<Arc<SettingsStorage>>,
}

impl CredentialStore {
    /// Load the stored key, falling back to `default_key`.
    pub async fn initialize(storage: SettingsStorage, default_key: Option<&str>) -> Self {
        let stored = match storage.load().await {
            Ok(settings) => settings.api_key.and_then(Credential::new),
            Err(e) => {
                warn!(error = %e, "Failed to load stored settings, using default credential");
                None
            }
        };

        let source = if stored.is_some() { "storage" } else { "default" };
        let current = stored.or_else(|| default_key.and_then(Credential::new));
        info!(source, configured = current.is_some(), "Credential initialized");

        Self {
            current: Arc::new(RwLock::new(current)),
            storage: Some(Arc::new(storage)),
        }
    }

    /// A store that never touches disk.
    pub fn in_memory(credential: Option<Credential>) -> Self {
        Self {
            current: Arc::new(RwLock::new(credential)),
            storage: None,
        }
    }

    pub async fn current(&self) -> Option<Credential> {
        self.current.read().await.clone()
    }

    /// Replace the credential and write it back to storage. Blank input clears it.
    pub async fn set(&self, key: &str) -> anyhow::Result<Option<Credential>> {
        let credential = Credential::new(key);

        if let Some(storage) = &self.storage {
            let settings = UserSettings {
                api_key: credential.as_ref().map(|c| c.expose().to_string()),
                updated_at: Some(chrono::Utc::now()),
            };
            storage.save(&settings).await?;
        }

        *self.current.write().await = credential.clone();
        info!(configured = credential.is_some(), "Credential updated");
        Ok(credential)
    }
}
