//! Customer session types.

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use uuid::Uuid;
use validator::Validate;

use crate::error::{Error, Result};
use crate::limits::{MAX_CUSTOMER_NAME_LEN, MAX_WHATSAPP_LEN};
use crate::package::Package;
use crate::phone::normalize_phone;

/// Session lifetime (30 minutes from the hotspot redirect).
pub const SESSION_TTL_MINUTES: i64 = 30;

static MAC_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{2}([:-][0-9A-Fa-f]{2}){5}$").expect("invalid MAC pattern")
});

/// Customer identity as captured by the storefront.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub whatsapp: String,
}

impl Customer {
    pub fn new(name: impl Into<String>, whatsapp: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            whatsapp: whatsapp.into(),
        }
    }

    /// Both name and WhatsApp number are present.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.whatsapp.trim().is_empty()
    }

    /// Length limits only. Either field may still be empty.
    pub fn check_lengths(&self) -> Result<()> {
        if self.name.chars().count() > MAX_CUSTOMER_NAME_LEN {
            return Err(Error::invalid_input(format!(
                "customer name exceeds {} characters",
                MAX_CUSTOMER_NAME_LEN
            )));
        }
        if self.whatsapp.chars().count() > MAX_WHATSAPP_LEN {
            return Err(Error::invalid_input(format!(
                "whatsapp number exceeds {} characters",
                MAX_WHATSAPP_LEN
            )));
        }
        Ok(())
    }

    /// A customer that can be ordered for: complete, within limits and
    /// reachable on a number that normalizes.
    pub fn check(&self) -> Result<()> {
        if !self.is_complete() {
            return Err(Error::invalid_input(
                "customer name and whatsapp are required",
            ));
        }
        self.check_lengths()?;
        normalize_phone(&self.whatsapp)?;
        Ok(())
    }
}

/// Where the device should be sent back after purchase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotspotInfo {
    #[serde(default)]
    pub interface: String,
    #[serde(default)]
    pub server_name: String,
    #[serde(default)]
    pub login_url: String,
}

/// Input for creating a session.
#[derive(Debug, Clone, Validate)]
pub struct NewSession {
    pub customer: Customer,
    #[validate(length(min = 1, max = 17))]
    pub mac_address: String,
    #[validate(length(max = 45))]
    pub ip_address: String,
    #[validate(length(max = 512))]
    pub user_agent: Option<String>,
    pub hotspot: HotspotInfo,
    pub requested_profile: Option<Package>,
}

impl NewSession {
    /// Validate field lengths and the MAC address format.
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| Error::invalid_input(e.to_string()))?;
        self.customer.check_lengths()?;
        if !MAC_REGEX.is_match(&self.mac_address) {
            return Err(Error::invalid_input(format!(
                "invalid MAC address: {}",
                self.mac_address
            )));
        }
        Ok(())
    }
}

/// A short-lived record linking a hotspot device to a prospective purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSession {
    pub id: String,
    pub customer: Customer,
    pub mac_address: String,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub hotspot: HotspotInfo,
    pub requested_profile: Option<Package>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CustomerSession {
    /// Creates a new session with a fresh id.
    pub fn new(input: NewSession, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            id: generate_session_id(),
            customer: input.customer,
            mac_address: input.mac_address.to_uppercase().replace('-', ":"),
            ip_address: input.ip_address,
            user_agent: input.user_agent,
            hotspot: input.hotspot,
            requested_profile: input.requested_profile,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Seconds left before expiry, zero once expired.
    pub fn expires_in_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

/// Generates an opaque session id.
pub fn generate_session_id() -> String {
    format!("sess_{}", Uuid::new_v4().simple())
}
