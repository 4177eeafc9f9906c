//! Voucher issuing and lazy expiry.
//!
//! Codes have the shape `{PREFIX}-{time}-{random}`, e.g. `1D-482913-K7Q2M9XA`:
//! the package prefix, the last six digits of the issue time in milliseconds,
//! and eight random characters from `[A-Z0-9]`. Uniqueness is probabilistic
//! here; the store rejects duplicates on insert.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::package::Package;
use crate::session::Customer;

/// Characters used in the random code suffix.
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of the random code suffix (36^8 ≈ 2.8e12 combinations).
pub const RANDOM_SUFFIX_LEN: usize = 8;

/// Voucher status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherStatus {
    Active,
    Used,
    Expired,
}

/// A time-boxed hotspot access code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voucher {
    pub code: String,
    #[serde(rename = "package_id")]
    pub package: Package,
    pub customer: Customer,
    pub order_id: String,
    pub status: VoucherStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl Voucher {
    /// Issues a voucher whose expiry follows the package duration exactly.
    pub fn issue(
        package: Package,
        customer: Customer,
        order_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            code: generate_code(package, now),
            package,
            customer,
            order_id: order_id.into(),
            status: VoucherStatus::Active,
            created_at: now,
            expires_at: now + package.duration(),
            used_at: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Flips `active` → `expired` once past expiry. Returns true on change.
    pub fn refresh_status(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == VoucherStatus::Active && self.is_expired(now) {
            self.status = VoucherStatus::Expired;
            return true;
        }
        false
    }

    pub fn profile(&self) -> &'static str {
        self.package.as_str()
    }
}

/// Generates a voucher code for a package.
pub fn generate_code(package: Package, now: DateTime<Utc>) -> String {
    let time_suffix = now.timestamp_millis().rem_euclid(1_000_000);
    let mut rng = rand::thread_rng();
    let random: String = (0..RANDOM_SUFFIX_LEN)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect();
    format!("{}-{:06}-{}", package.code_prefix(), time_suffix, random)
}
