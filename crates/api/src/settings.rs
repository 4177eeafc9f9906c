//! Service and integration settings.
//!
//! Integration settings are edited through the admin surface and persisted
//! by upserting the flat environment names into the env file. They take
//! effect on the next start.

use gardens_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Request-path settings the handlers need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Storefront base URL the webhook redirects customers to
    pub storefront_url: String,
    /// Shared secret for `X-MikPos-Signature`; empty rejects every webhook
    #[serde(default)]
    pub webhook_secret: String,
    /// Allowed clock skew for webhook timestamps; 0 disables the check
    pub replay_tolerance_secs: u64,
    /// Bearer token for `/admin/*`; unset disables the admin surface
    pub admin_token: Option<String>,
    /// Env file the admin settings endpoint writes to
    pub env_file: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            storefront_url: "http://localhost:3000".to_string(),
            webhook_secret: String::new(),
            replay_tolerance_secs: gardens_core::limits::DEFAULT_REPLAY_TOLERANCE_SECS,
            admin_token: None,
            env_file: PathBuf::from(".env"),
        }
    }
}

/// Integration settings as stored in the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationSettings {
    pub whatsapp_api_url: String,
    pub whatsapp_api_token: String,
    pub whatsapp_sender: String,
    pub mikpos_base_url: String,
    pub mikpos_api_key: String,
    pub mikpos_webhook_secret: String,
    pub mikrotik_host: String,
    pub mikrotik_username: String,
    pub mikrotik_password: String,
}

impl IntegrationSettings {
    /// Copy safe to return to the admin UI.
    pub fn masked(&self) -> Self {
        Self {
            whatsapp_api_token: mask(&self.whatsapp_api_token),
            mikpos_api_key: mask(&self.mikpos_api_key),
            mikpos_webhook_secret: mask(&self.mikpos_webhook_secret),
            mikrotik_password: mask(&self.mikrotik_password),
            ..self.clone()
        }
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "WHATSAPP_API_URL" => Some(&mut self.whatsapp_api_url),
            "WHATSAPP_API_TOKEN" => Some(&mut self.whatsapp_api_token),
            "WHATSAPP_SENDER" => Some(&mut self.whatsapp_sender),
            "MIKPOS_BASE_URL" => Some(&mut self.mikpos_base_url),
            "MIKPOS_API_KEY" => Some(&mut self.mikpos_api_key),
            "MIKPOS_WEBHOOK_SECRET" => Some(&mut self.mikpos_webhook_secret),
            "MIKROTIK_HOST" => Some(&mut self.mikrotik_host),
            "MIKROTIK_USERNAME" => Some(&mut self.mikrotik_username),
            "MIKROTIK_PASSWORD" => Some(&mut self.mikrotik_password),
            _ => None,
        }
    }

    /// Applies env-style pairs produced by [`SettingsUpdate::to_env_pairs`].
    pub fn apply(&mut self, pairs: &[(String, String)]) {
        for (key, value) in pairs {
            if let Some(field) = self.field_mut(key) {
                *field = value.clone();
            }
        }
    }
}

/// Keeps the last four characters of a secret.
fn mask(secret: &str) -> String {
    let count = secret.chars().count();
    if count == 0 {
        return String::new();
    }
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}

/// Body of `PUT /admin/settings`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SettingsUpdate {
    #[validate(url)]
    pub whatsapp_api_url: Option<String>,
    #[validate(length(max = 512))]
    pub whatsapp_api_token: Option<String>,
    #[validate(length(max = 64))]
    pub whatsapp_sender: Option<String>,
    #[validate(url)]
    pub mikpos_base_url: Option<String>,
    #[validate(length(max = 512))]
    pub mikpos_api_key: Option<String>,
    #[validate(length(max = 512))]
    pub mikpos_webhook_secret: Option<String>,
    #[validate(length(max = 255))]
    pub mikrotik_host: Option<String>,
    #[validate(length(max = 128))]
    pub mikrotik_username: Option<String>,
    #[validate(length(max = 128))]
    pub mikrotik_password: Option<String>,
}

impl SettingsUpdate {
    /// Validates and flattens into env-file pairs.
    pub fn to_env_pairs(&self) -> Result<Vec<(String, String)>> {
        self.validate()
            .map_err(|e| Error::invalid_input(e.to_string()))?;

        let fields = [
            ("WHATSAPP_API_URL", &self.whatsapp_api_url),
            ("WHATSAPP_API_TOKEN", &self.whatsapp_api_token),
            ("WHATSAPP_SENDER", &self.whatsapp_sender),
            ("MIKPOS_BASE_URL", &self.mikpos_base_url),
            ("MIKPOS_API_KEY", &self.mikpos_api_key),
            ("MIKPOS_WEBHOOK_SECRET", &self.mikpos_webhook_secret),
            ("MIKROTIK_HOST", &self.mikrotik_host),
            ("MIKROTIK_USERNAME", &self.mikrotik_username),
            ("MIKROTIK_PASSWORD", &self.mikrotik_password),
        ];

        let pairs: Vec<(String, String)> = fields
            .into_iter()
            .filter_map(|(key, value)| {
                value
                    .as_ref()
                    .map(|v| (key.to_string(), v.trim().to_string()))
            })
            .collect();

        if pairs.is_empty() {
            return Err(Error::invalid_input("no settings provided"));
        }
        Ok(pairs)
    }
}
