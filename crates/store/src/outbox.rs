//! Outbound delivery records retried by the outbox worker.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// What to deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboxKind {
    /// WhatsApp text to an already-normalized number.
    WhatsApp { phone: String, message: String },
    /// Voucher-generated callback to the billing product.
    BillingCallback { payload: serde_json::Value },
}

impl OutboxKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::WhatsApp { .. } => "whatsapp",
            Self::BillingCallback { .. } => "billing_callback",
        }
    }
}

/// Delivery state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboxState {
    Pending,
    Delivered,
    Dead,
}

/// A pending outbound delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: u64,
    pub order_id: String,
    pub kind: OutboxKind,
    pub state: OutboxState,
    pub attempts: u32,
    pub next_attempt_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OutboxEntry {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.state == OutboxState::Pending && self.next_attempt_at <= now
    }
}

/// Exponential backoff policy for outbox retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay before the first retry in seconds
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: i64,
    /// Upper bound on any single delay in seconds
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: i64,
    /// Attempts before an entry is marked dead
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_base_delay_secs() -> i64 {
    5
}

fn default_max_delay_secs() -> i64 {
    600
}

fn default_max_attempts() -> u32 {
    8
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay_secs: default_base_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl RetryPolicy {
    /// Delay after `attempts` failed attempts: base * 2^(attempts-1), capped.
    pub fn backoff(&self, attempts: u32) -> Duration {
        let exponent = attempts.saturating_sub(1).min(30);
        let secs = self
            .base_delay_secs
            .saturating_mul(1_i64 << exponent)
            .min(self.max_delay_secs);
        Duration::seconds(secs)
    }

    pub fn exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }
}
