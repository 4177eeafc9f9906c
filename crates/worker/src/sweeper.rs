//! Expiry sweeper.
//!
//! Lazy expiry on read covers anything a client touches; the sweep covers
//! everything else so abandoned sessions and orders do not accumulate.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use store::{Store, SweepReport};
use tracing::{debug, info};

/// Worker that expires sessions, pending orders and vouchers.
pub struct ExpirySweeper {
    store: Arc<Store>,
}

impl ExpirySweeper {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Runs one sweep at the current time.
    pub fn run(&self) -> SweepReport {
        self.run_at(Utc::now())
    }

    pub fn run_at(&self, now: DateTime<Utc>) -> SweepReport {
        let report = self.store.sweep_expired(now);
        if report.is_empty() {
            debug!("Expiry sweep found nothing to expire");
        } else {
            info!(
                sessions_removed = report.sessions_removed,
                orders_failed = report.orders_failed,
                vouchers_expired = report.vouchers_expired,
                "Expiry sweep complete"
            );
        }
        report
    }
}
