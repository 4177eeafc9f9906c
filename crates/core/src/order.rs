//! Order types and the pending → completed/failed lifecycle.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::limits::MAX_SOURCE_LEN;
use crate::package::Package;
use crate::session::Customer;

/// Orders must be paid within 15 minutes.
pub const ORDER_TTL_MINUTES: i64 = 15;

/// Order source when the storefront does not send one.
pub const DEFAULT_ORDER_SOURCE: &str = "web";

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Payment metadata recorded on completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: String,
    pub transaction_id: String,
    pub amount: u64,
    pub paid_at: DateTime<Utc>,
}

/// Input for creating an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub session_id: String,
    pub package: Package,
    pub customer: Customer,
    pub amount: u64,
    pub source: String,
}

impl NewOrder {
    /// Rejects orders whose customer could never be notified.
    pub fn check(&self) -> Result<()> {
        self.customer.check()?;
        if self.amount != self.package.price() {
            return Err(Error::invalid_input(format!(
                "amount {} does not match {} price {}",
                self.amount,
                self.package,
                self.package.price()
            )));
        }
        Ok(())
    }
}

/// A purchase intent referencing a session and a package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub session_id: String,
    #[serde(rename = "package_id")]
    pub package: Package,
    pub customer: Customer,
    pub amount: u64,
    pub source: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub payment: Option<PaymentInfo>,
    pub failure_reason: Option<String>,
    /// Hotspot login page of the session the order was placed from.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub login_url: String,
    /// Bumped on every state transition.
    pub version: u64,
}

impl Order {
    pub fn new(input: NewOrder, ttl: Duration, now: DateTime<Utc>) -> Self {
        let source = sanitize_source(&input.source);
        Self {
            id: generate_order_id(&source, now),
            session_id: input.session_id,
            package: input.package,
            customer: input.customer,
            amount: input.amount,
            source,
            status: OrderStatus::Pending,
            created_at: now,
            expires_at: now + ttl,
            completed_at: None,
            payment: None,
            failure_reason: None,
            login_url: String::new(),
            version: 1,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Transition pending → completed.
    pub fn complete(&mut self, payment: PaymentInfo) -> Result<()> {
        if !self.is_pending() {
            return Err(Error::already_processed(format!(
                "order {} is {}",
                self.id,
                self.status.as_str()
            )));
        }
        self.completed_at = Some(payment.paid_at);
        self.payment = Some(payment);
        self.status = OrderStatus::Completed;
        self.version += 1;
        Ok(())
    }

    /// Transition pending → failed.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        if !self.is_pending() {
            return Err(Error::already_processed(format!(
                "order {} is {}",
                self.id,
                self.status.as_str()
            )));
        }
        self.failure_reason = Some(reason.into());
        self.status = OrderStatus::Failed;
        self.version += 1;
        Ok(())
    }
}

/// Upper-cased alphanumeric source, `WEB` when empty.
fn sanitize_source(source: &str) -> String {
    let cleaned: String = source
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(MAX_SOURCE_LEN)
        .collect::<String>()
        .to_uppercase();
    if cleaned.is_empty() {
        DEFAULT_ORDER_SOURCE.to_uppercase()
    } else {
        cleaned
    }
}

/// Generates an order id prefixed by its source.
pub fn generate_order_id(source: &str, now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{}-{}-{:06}", source, now.timestamp_millis(), suffix)
}
