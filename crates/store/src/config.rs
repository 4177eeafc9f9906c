//! Store configuration.

use chrono::Duration;
use gardens_core::{ORDER_TTL_MINUTES, SESSION_TTL_MINUTES};
use serde::{Deserialize, Serialize};

/// Entity lifetimes enforced by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Customer session lifetime in minutes
    #[serde(default = "default_session_ttl_minutes")]
    pub session_ttl_minutes: i64,
    /// Pending order lifetime in minutes
    #[serde(default = "default_order_ttl_minutes")]
    pub order_ttl_minutes: i64,
    /// Attempts at drawing a voucher code not already in the store
    #[serde(default = "default_code_attempts")]
    pub code_attempts: u32,
}

fn default_session_ttl_minutes() -> i64 {
    SESSION_TTL_MINUTES
}

fn default_order_ttl_minutes() -> i64 {
    ORDER_TTL_MINUTES
}

fn default_code_attempts() -> u32 {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            session_ttl_minutes: default_session_ttl_minutes(),
            order_ttl_minutes: default_order_ttl_minutes(),
            code_attempts: default_code_attempts(),
        }
    }
}

impl StoreConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::minutes(self.session_ttl_minutes)
    }

    pub fn order_ttl(&self) -> Duration {
        Duration::minutes(self.order_ttl_minutes)
    }
}
