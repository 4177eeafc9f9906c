//! Messaging and billing client configuration.

use serde::{Deserialize, Serialize};

/// WhatsApp messaging provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Provider base URL; empty or "mock" runs the client in mock mode
    #[serde(default)]
    pub api_url: String,
    /// Bearer token for the provider API
    #[serde(default)]
    pub api_token: String,
    /// Sender number or device id registered with the provider
    #[serde(default)]
    pub sender: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// MikPos billing product configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// MikPos base URL; empty or "mock" runs the client in mock mode
    #[serde(default)]
    pub base_url: String,
    /// Bearer token for MikPos callbacks
    #[serde(default)]
    pub api_key: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

fn is_mock_url(url: &str) -> bool {
    let url = url.trim();
    url.is_empty() || url == "mock"
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_token: String::new(),
            sender: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl MessagingConfig {
    pub fn is_mock(&self) -> bool {
        is_mock_url(&self.api_url)
    }

    /// Provider URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api_url.trim().trim_end_matches('/')
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BillingConfig {
    pub fn is_mock(&self) -> bool {
        is_mock_url(&self.base_url)
    }

    pub fn callback_url(&self) -> String {
        format!(
            "{}/api/webhook/voucher-generated",
            self.base_url.trim().trim_end_matches('/')
        )
    }
}
