//! WhatsApp messaging provider client.

use async_trait::async_trait;
use gardens_core::{Error, Result};
use serde::Serialize;
use std::time::{Duration, Instant};
use telemetry::{health, metrics};
use tracing::{debug, info, warn};

use crate::config::MessagingConfig;

/// Sends text messages to customers.
///
/// Implemented by [`WhatsAppClient`] in production and by in-memory mocks in
/// tests.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Sends `message` to an already-normalized international number.
    async fn send_text(&self, phone: &str, message: &str) -> Result<()>;

    /// Checks the configured credentials against the provider identity
    /// endpoint.
    async fn test_connection(&self) -> Result<bool>;

    /// Whether the last exchange with the provider succeeded.
    fn is_healthy(&self) -> bool;
}

#[derive(Debug, Serialize)]
struct SendTextRequest<'a> {
    to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a str>,
    #[serde(rename = "type")]
    kind: &'static str,
    message: &'a str,
}

/// Bearer-authenticated JSON client for the messaging provider.
#[derive(Clone)]
pub struct WhatsAppClient {
    config: MessagingConfig,
    http_client: reqwest::Client,
    mock_mode: bool,
}

impl WhatsAppClient {
    /// Creates a client. An empty or `mock` URL puts it in mock mode, where
    /// sends are logged and succeed.
    pub fn new(config: MessagingConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {}", e)))?;

        let mock_mode = config.is_mock();
        if mock_mode {
            health().messaging.set_healthy();
        }

        Ok(Self {
            config,
            http_client,
            mock_mode,
        })
    }

    pub fn is_mock(&self) -> bool {
        self.mock_mode
    }

    fn require_token(&self) -> Result<&str> {
        let token = self.config.api_token.trim();
        if token.is_empty() {
            return Err(Error::configuration("WhatsApp API token is not configured"));
        }
        Ok(token)
    }
}

#[async_trait]
impl MessageSender for WhatsAppClient {
    async fn send_text(&self, phone: &str, message: &str) -> Result<()> {
        if self.mock_mode {
            debug!(phone = %phone, chars = message.len(), "Mock WhatsApp send");
            return Ok(());
        }

        let token = self.require_token()?;
        let url = format!("{}/send", self.config.base_url());
        let request = SendTextRequest {
            to: phone,
            from: Some(self.config.sender.as_str()).filter(|s| !s.is_empty()),
            kind: "text",
            message,
        };

        let start = Instant::now();
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "WhatsApp request failed");
                health().messaging.set_unhealthy(e.to_string());
                Error::upstream(format!("WhatsApp provider unavailable: {}", e))
            })?;
        metrics()
            .messaging_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "WhatsApp provider returned error");
            health()
                .messaging
                .set_unhealthy(format!("provider returned {}", status));
            return Err(Error::upstream(format!(
                "WhatsApp provider returned {}: {}",
                status, body
            )));
        }

        health().messaging.set_healthy();
        debug!(phone = %phone, "WhatsApp message accepted");
        Ok(())
    }

    async fn test_connection(&self) -> Result<bool> {
        if self.mock_mode {
            return Ok(true);
        }

        let token = self.require_token()?;
        let url = format!("{}/me", self.config.base_url());

        match self.http_client.get(&url).bearer_auth(token).send().await {
            Ok(response) if response.status().is_success() => {
                let identity: serde_json::Value = response.json().await.unwrap_or_default();
                info!(identity = %identity, "WhatsApp provider credentials verified");
                health().messaging.set_healthy();
                Ok(true)
            }
            Ok(response) => {
                let status = response.status();
                warn!(status = %status, "WhatsApp identity check rejected");
                health()
                    .messaging
                    .set_unhealthy(format!("identity check returned {}", status));
                Ok(false)
            }
            Err(e) => {
                warn!(error = %e, "WhatsApp identity check failed");
                health().messaging.set_unhealthy(e.to_string());
                Ok(false)
            }
        }
    }

    fn is_healthy(&self) -> bool {
        self.mock_mode || health().messaging.is_healthy()
    }
}
