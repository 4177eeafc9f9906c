//! Inbound webhook payloads from the billing product.
//!
//! ```json
//! {
//!   "action": "voucher_purchase_request",
//!   "customer": { "mac_address": "AA:BB:CC:DD:EE:FF", "ip_address": "10.5.50.2" },
//!   "hotspot": { "interface": "ether2", "server_name": "hs-gardens", "login_url": "http://10.5.50.1/login" },
//!   "requested_profile": "1day",
//!   "timestamp": 1760659200
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result, SignatureErrorCode};
use crate::package::Package;
use crate::session::{Customer, HotspotInfo, NewSession};

/// Webhook action discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookAction {
    VoucherPurchaseRequest,
    CustomerRedirect,
    PaymentNotification,
}

impl WebhookAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VoucherPurchaseRequest => "voucher_purchase_request",
            Self::CustomerRedirect => "customer_redirect",
            Self::PaymentNotification => "payment_notification",
        }
    }

    /// Actions that open a customer session.
    pub fn creates_session(&self) -> bool {
        matches!(self, Self::VoucherPurchaseRequest | Self::CustomerRedirect)
    }
}

impl FromStr for WebhookAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "voucher_purchase_request" => Ok(Self::VoucherPurchaseRequest),
            "customer_redirect" => Ok(Self::CustomerRedirect),
            "payment_notification" => Ok(Self::PaymentNotification),
            other => Err(Error::invalid_input(format!("unknown action: {}", other))),
        }
    }
}

/// Device identity reported by the hotspot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookCustomer {
    #[serde(default)]
    pub mac_address: String,
    #[serde(default)]
    pub ip_address: String,
    pub name: Option<String>,
    pub whatsapp: Option<String>,
    pub user_agent: Option<String>,
}

/// Payment status pushed by the billing product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentNotice {
    pub order_id: Option<String>,
    pub status: Option<String>,
    pub transaction_id: Option<String>,
}

/// Raw webhook body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub action: String,
    #[serde(default)]
    pub customer: Option<WebhookCustomer>,
    #[serde(default)]
    pub hotspot: HotspotInfo,
    pub requested_profile: Option<String>,
    /// Unix seconds, unix milliseconds, or an RFC 3339 string.
    pub timestamp: Option<serde_json::Value>,
    #[serde(default)]
    pub payment: Option<PaymentNotice>,
}

impl WebhookPayload {
    /// Parses a raw body.
    pub fn parse(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body)
            .map_err(|e| Error::invalid_input(format!("malformed webhook payload: {}", e)))
    }

    pub fn action(&self) -> Result<WebhookAction> {
        self.action.parse()
    }

    /// Requested profile, rejecting unknown package ids.
    pub fn requested_package(&self) -> Result<Option<Package>> {
        match self.requested_profile.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(id) => id.parse().map(Some),
        }
    }

    /// Payload timestamp, if present and parseable.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self.timestamp.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64().and_then(from_unix),
            serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| s.trim().parse::<i64>().ok().and_then(from_unix)),
            _ => None,
        }
    }

    /// Rejects payloads whose timestamp lies outside `tolerance_secs` of now.
    ///
    /// A tolerance of zero disables the check. Otherwise the timestamp is
    /// required, so every accepted delivery falls inside the replay window.
    pub fn check_freshness(&self, now: DateTime<Utc>, tolerance_secs: u64) -> Result<()> {
        if tolerance_secs == 0 {
            return Ok(());
        }
        if self.timestamp.is_none() {
            return Err(Error::signature(
                SignatureErrorCode::Stale,
                "webhook timestamp is required",
            ));
        }
        let ts = self.timestamp().ok_or_else(|| {
            Error::signature(SignatureErrorCode::Stale, "unparseable webhook timestamp")
        })?;
        let skew = (now - ts).num_seconds().unsigned_abs();
        if skew > tolerance_secs {
            return Err(Error::signature(
                SignatureErrorCode::Stale,
                format!("timestamp is {}s away from server time", skew),
            ));
        }
        Ok(())
    }

    /// Builds the session input for session-creating actions.
    pub fn to_new_session(&self) -> Result<NewSession> {
        let customer = self
            .customer
            .as_ref()
            .filter(|c| !c.mac_address.trim().is_empty())
            .ok_or_else(|| Error::invalid_input("customer.mac_address is required"))?;

        let input = NewSession {
            customer: Customer {
                name: customer.name.clone().unwrap_or_default(),
                whatsapp: customer.whatsapp.clone().unwrap_or_default(),
            },
            mac_address: customer.mac_address.trim().to_string(),
            ip_address: customer.ip_address.trim().to_string(),
            user_agent: customer.user_agent.clone(),
            hotspot: self.hotspot.clone(),
            requested_profile: self.requested_package()?,
        };
        input.check()?;
        Ok(input)
    }
}

/// Interprets large values as milliseconds.
fn from_unix(value: i64) -> Option<DateTime<Utc>> {
    if value > 100_000_000_000 {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    }
}
