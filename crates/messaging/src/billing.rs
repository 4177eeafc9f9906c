//! MikPos billing callback client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gardens_core::{Customer, Error, Result, Voucher};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use telemetry::{health, metrics};
use tracing::{debug, warn};

use crate::config::BillingConfig;

/// Body of the voucher-generated callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherGenerated {
    pub event: String,
    pub order_id: String,
    pub voucher_code: String,
    pub profile: String,
    pub customer: Customer,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl VoucherGenerated {
    pub const EVENT: &'static str = "voucher_generated";

    pub fn from_voucher(voucher: &Voucher) -> Self {
        Self {
            event: Self::EVENT.to_string(),
            order_id: voucher.order_id.clone(),
            voucher_code: voucher.code.clone(),
            profile: voucher.profile().to_string(),
            customer: voucher.customer.clone(),
            created_at: voucher.created_at,
            expires_at: voucher.expires_at,
        }
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Announces issued vouchers to the billing product.
#[async_trait]
pub trait BillingNotifier: Send + Sync {
    /// Posts a voucher-generated callback body.
    async fn voucher_generated(&self, payload: &serde_json::Value) -> Result<()>;

    fn is_healthy(&self) -> bool;
}

/// Bearer-authenticated JSON client for MikPos callbacks.
#[derive(Clone)]
pub struct MikPosClient {
    config: BillingConfig,
    http_client: reqwest::Client,
    mock_mode: bool,
}

impl MikPosClient {
    pub fn new(config: BillingConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {}", e)))?;

        let mock_mode = config.is_mock();
        if mock_mode {
            health().billing.set_healthy();
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
}

#[async_trait]
impl BillingNotifier for MikPosClient {
    async fn voucher_generated(&self, payload: &serde_json::Value) -> Result<()> {
        if self.mock_mode {
            debug!(payload = %payload, "Mock MikPos callback");
            return Ok(());
        }

        let api_key = self.config.api_key.trim();
        if api_key.is_empty() {
            return Err(Error::configuration("MikPos API key is not configured"));
        }

        let url = self.config.callback_url();
        let start = Instant::now();
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "MikPos callback request failed");
                health().billing.set_unhealthy(e.to_string());
                Error::upstream(format!("MikPos unavailable: {}", e))
            })?;
        metrics()
            .billing_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "MikPos callback rejected");
            health()
                .billing
                .set_unhealthy(format!("callback returned {}", status));
            return Err(Error::upstream(format!(
                "MikPos returned {}: {}",
                status, body
            )));
        }

        health().billing.set_healthy();
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        self.mock_mode || health().billing.is_healthy()
    }
}
