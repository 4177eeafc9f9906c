//! In-process transactional store.
//!
//! All tables sit behind one mutex, so every operation below is atomic with
//! respect to every other. The lock is never held across an `.await`.

use chrono::{DateTime, Utc};
use gardens_core::{
    generate_code, CustomerSession, Error, NewOrder, NewSession, Order, OrderStatus, PaymentInfo,
    Result, Voucher, VoucherStatus,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use telemetry::metrics;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::outbox::{OutboxEntry, OutboxKind, OutboxState, RetryPolicy};

#[derive(Default)]
struct Tables {
    sessions: HashMap<String, CustomerSession>,
    orders: HashMap<String, Order>,
    /// Voucher code -> voucher
    vouchers: HashMap<String, Voucher>,
    /// Order id -> voucher code
    voucher_by_order: HashMap<String, String>,
    outbox: BTreeMap<u64, OutboxEntry>,
    next_outbox_id: u64,
}

impl Tables {
    fn outbox_depth(&self) -> u64 {
        self.outbox
            .values()
            .filter(|e| e.state == OutboxState::Pending)
            .count() as u64
    }
}

/// Result of one expiry sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub sessions_removed: usize,
    pub orders_failed: usize,
    pub vouchers_expired: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.sessions_removed == 0 && self.orders_failed == 0 && self.vouchers_expired == 0
    }
}

/// Entity counts for the admin dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub sessions: usize,
    pub orders_pending: usize,
    pub orders_completed: usize,
    pub orders_failed: usize,
    pub vouchers_active: usize,
    pub vouchers_used: usize,
    pub vouchers_expired: usize,
    pub outbox_pending: usize,
    pub outbox_dead: usize,
}

/// Session, order, voucher and outbox tables.
pub struct Store {
    config: StoreConfig,
    tables: Mutex<Tables>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl Store {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            tables: Mutex::new(Tables::default()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // === Sessions ===

    /// Stores a new session and returns it.
    pub fn create_session(&self, input: NewSession, now: DateTime<Utc>) -> CustomerSession {
        let session = CustomerSession::new(input, self.config.session_ttl(), now);
        self.tables
            .lock()
            .sessions
            .insert(session.id.clone(), session.clone());

        metrics().sessions_created.inc();
        debug!(session_id = %session.id, mac = %session.mac_address, "Session created");
        session
    }

    /// Fetches a live session.
    ///
    /// An expired session is deleted and reported as `SessionExpired` once;
    /// later lookups of the same id are `NotFound`.
    pub fn get_session(&self, id: &str, now: DateTime<Utc>) -> Result<CustomerSession> {
        let mut tables = self.tables.lock();
        live_session(&mut tables, id, now).cloned()
    }

    pub fn delete_session(&self, id: &str) -> bool {
        self.tables.lock().sessions.remove(id).is_some()
    }

    // === Orders ===

    /// Creates a pending order against a live session.
    pub fn create_order(&self, input: NewOrder, now: DateTime<Utc>) -> Result<Order> {
        input.check()?;

        let mut tables = self.tables.lock();
        let session = live_session(&mut tables, &input.session_id, now)?;
        session.customer = input.customer.clone();
        let login_url = session.hotspot.login_url.clone();

        let mut order = Order::new(input, self.config.order_ttl(), now);
        order.login_url = login_url;
        tables.orders.insert(order.id.clone(), order.clone());
        drop(tables);

        metrics().orders_created.inc();
        info!(
            order_id = %order.id,
            session_id = %order.session_id,
            package = %order.package,
            amount = order.amount,
            "Order created"
        );
        Ok(order)
    }

    pub fn get_order(&self, id: &str) -> Result<Order> {
        self.tables
            .lock()
            .orders
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found("order", id))
    }

    /// Completes a pending order and issues its voucher in one step.
    ///
    /// Exactly one caller can win the pending → completed transition for a
    /// given order; every other caller gets `AlreadyProcessed` and no voucher.
    pub fn complete_order_and_issue_voucher(
        &self,
        order_id: &str,
        payment: PaymentInfo,
        now: DateTime<Utc>,
    ) -> Result<(Order, Voucher)> {
        let mut tables = self.tables.lock();

        let order = tables
            .orders
            .get_mut(order_id)
            .ok_or_else(|| Error::not_found("order", order_id))?;

        if !order.is_pending() {
            metrics().orders_rejected.inc();
            warn!(order_id = %order_id, status = order.status.as_str(), "Order already processed");
            return Err(Error::already_processed(format!(
                "order {} is {}",
                order_id,
                order.status.as_str()
            )));
        }

        if order.is_expired(now) {
            order.fail("payment window expired")?;
            metrics().orders_failed.inc();
            return Err(Error::OrderExpired(order_id.to_string()));
        }

        if payment.amount != order.amount {
            return Err(Error::invalid_input(format!(
                "paid amount {} does not match order amount {}",
                payment.amount, order.amount
            )));
        }

        let mut voucher = Voucher::issue(order.package, order.customer.clone(), order_id, now);
        let mut attempts = 1;
        while tables.vouchers.contains_key(&voucher.code) {
            if attempts >= self.config.code_attempts {
                return Err(Error::internal("could not draw a unique voucher code"));
            }
            voucher.code = generate_code(voucher.package, now);
            attempts += 1;
        }

        let order = tables
            .orders
            .get_mut(order_id)
            .ok_or_else(|| Error::not_found("order", order_id))?;
        order.complete(payment)?;
        let order = order.clone();

        tables
            .voucher_by_order
            .insert(order_id.to_string(), voucher.code.clone());
        tables.vouchers.insert(voucher.code.clone(), voucher.clone());
        drop(tables);

        metrics().orders_completed.inc();
        metrics().vouchers_issued.inc();
        info!(
            order_id = %order.id,
            voucher_code = %voucher.code,
            expires_at = %voucher.expires_at,
            "Order completed and voucher issued"
        );
        Ok((order, voucher))
    }

    /// Marks a pending order as failed.
    pub fn fail_order(&self, order_id: &str, reason: &str) -> Result<Order> {
        let mut tables = self.tables.lock();
        let order = tables
            .orders
            .get_mut(order_id)
            .ok_or_else(|| Error::not_found("order", order_id))?;
        order.fail(reason)?;
        let order = order.clone();
        drop(tables);

        metrics().orders_failed.inc();
        info!(order_id = %order.id, reason = reason, "Order failed");
        Ok(order)
    }

    // === Vouchers ===

    /// Looks up a voucher by code, persisting any lazy expiry.
    pub fn voucher_by_code(&self, code: &str, now: DateTime<Utc>) -> Result<Voucher> {
        let mut tables = self.tables.lock();
        let voucher = tables
            .vouchers
            .get_mut(code)
            .ok_or_else(|| Error::not_found("voucher", code))?;
        if voucher.refresh_status(now) {
            metrics().vouchers_expired.inc();
        }
        Ok(voucher.clone())
    }

    /// Looks up the voucher issued for an order.
    pub fn voucher_by_order(&self, order_id: &str, now: DateTime<Utc>) -> Result<Voucher> {
        let code = self
            .tables
            .lock()
            .voucher_by_order
            .get(order_id)
            .cloned()
            .ok_or_else(|| Error::not_found("voucher", order_id))?;
        self.voucher_by_code(&code, now)
    }

    /// Marks an active voucher as used.
    pub fn redeem_voucher(&self, code: &str, now: DateTime<Utc>) -> Result<Voucher> {
        let mut tables = self.tables.lock();
        let voucher = tables
            .vouchers
            .get_mut(code)
            .ok_or_else(|| Error::not_found("voucher", code))?;
        if voucher.refresh_status(now) {
            metrics().vouchers_expired.inc();
        }
        match voucher.status {
            VoucherStatus::Active => {
                voucher.status = VoucherStatus::Used;
                voucher.used_at = Some(now);
                metrics().vouchers_redeemed.inc();
                Ok(voucher.clone())
            }
            VoucherStatus::Used => Err(Error::already_processed(format!(
                "voucher {} already used",
                code
            ))),
            VoucherStatus::Expired => Err(Error::VoucherExpired(code.to_string())),
        }
    }

    // === Expiry ===

    /// Removes expired sessions, fails expired pending orders, and expires
    /// vouchers past their end time.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> SweepReport {
        let mut tables = self.tables.lock();
        let mut report = SweepReport::default();

        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| !s.is_expired(now));
        report.sessions_removed = before - tables.sessions.len();

        for order in tables.orders.values_mut() {
            if order.is_pending() && order.is_expired(now) && order.fail("payment window expired").is_ok() {
                report.orders_failed += 1;
            }
        }

        for voucher in tables.vouchers.values_mut() {
            if voucher.refresh_status(now) {
                report.vouchers_expired += 1;
            }
        }
        drop(tables);

        metrics().sessions_expired.inc_by(report.sessions_removed as u64);
        metrics().orders_failed.inc_by(report.orders_failed as u64);
        metrics().vouchers_expired.inc_by(report.vouchers_expired as u64);
        report
    }

    // === Outbox ===

    /// Queues a delivery for the outbox worker, due immediately.
    pub fn enqueue_outbox(&self, order_id: &str, kind: OutboxKind, now: DateTime<Utc>) -> u64 {
        let mut tables = self.tables.lock();
        tables.next_outbox_id += 1;
        let id = tables.next_outbox_id;
        let label = kind.label();
        tables.outbox.insert(
            id,
            OutboxEntry {
                id,
                order_id: order_id.to_string(),
                kind,
                state: OutboxState::Pending,
                attempts: 0,
                next_attempt_at: now,
                last_error: None,
                created_at: now,
            },
        );
        metrics().outbox_depth.set(tables.outbox_depth());
        drop(tables);

        metrics().outbox_enqueued.inc();
        debug!(outbox_id = id, order_id = %order_id, kind = label, "Outbox entry queued");
        id
    }

    /// Pending entries due at `now`, oldest first.
    pub fn due_outbox(&self, now: DateTime<Utc>, limit: usize) -> Vec<OutboxEntry> {
        self.tables
            .lock()
            .outbox
            .values()
            .filter(|e| e.is_due(now))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Records a successful delivery; delivered entries are dropped.
    pub fn record_delivery(&self, id: u64) {
        let mut tables = self.tables.lock();
        if tables.outbox.remove(&id).is_some() {
            metrics().outbox_delivered.inc();
        }
        metrics().outbox_depth.set(tables.outbox_depth());
    }

    /// Records a failed attempt and schedules the next one, or marks the
    /// entry dead once the policy is exhausted.
    pub fn record_failure(
        &self,
        id: u64,
        error: &str,
        policy: &RetryPolicy,
        now: DateTime<Utc>,
    ) -> Option<OutboxState> {
        let mut tables = self.tables.lock();
        let entry = tables.outbox.get_mut(&id)?;
        entry.attempts += 1;
        entry.last_error = Some(error.to_string());
        if policy.exhausted(entry.attempts) {
            entry.state = OutboxState::Dead;
            metrics().outbox_dead.inc();
            warn!(
                outbox_id = id,
                order_id = %entry.order_id,
                attempts = entry.attempts,
                error = error,
                "Outbox entry dead after final attempt"
            );
        } else {
            entry.next_attempt_at = now + policy.backoff(entry.attempts);
        }
        let state = entry.state;
        metrics().outbox_depth.set(tables.outbox_depth());
        Some(state)
    }

    pub fn outbox_entry(&self, id: u64) -> Option<OutboxEntry> {
        self.tables.lock().outbox.get(&id).cloned()
    }

    pub fn outbox_entries(&self) -> Vec<OutboxEntry> {
        self.tables.lock().outbox.values().cloned().collect()
    }

    // === Stats ===

    pub fn stats(&self) -> StoreStats {
        let tables = self.tables.lock();
        let mut stats = StoreStats {
            sessions: tables.sessions.len(),
            ..StoreStats::default()
        };
        for order in tables.orders.values() {
            match order.status {
                OrderStatus::Pending => stats.orders_pending += 1,
                OrderStatus::Completed => stats.orders_completed += 1,
                OrderStatus::Failed => stats.orders_failed += 1,
            }
        }
        for voucher in tables.vouchers.values() {
            match voucher.status {
                VoucherStatus::Active => stats.vouchers_active += 1,
                VoucherStatus::Used => stats.vouchers_used += 1,
                VoucherStatus::Expired => stats.vouchers_expired += 1,
            }
        }
        for entry in tables.outbox.values() {
            match entry.state {
                OutboxState::Pending => stats.outbox_pending += 1,
                OutboxState::Dead => stats.outbox_dead += 1,
                OutboxState::Delivered => {}
            }
        }
        stats
    }
}

/// Returns the live session or removes it if expired.
fn live_session<'a>(
    tables: &'a mut Tables,
    id: &str,
    now: DateTime<Utc>,
) -> Result<&'a mut CustomerSession> {
    let expired = match tables.sessions.get(id) {
        None => return Err(Error::not_found("session", id)),
        Some(session) => session.is_expired(now),
    };
    if expired {
        tables.sessions.remove(id);
        metrics().sessions_expired.inc();
        debug!(session_id = %id, "Session expired on read");
        return Err(Error::SessionExpired(id.to_string()));
    }
    tables
        .sessions
        .get_mut(id)
        .ok_or_else(|| Error::not_found("session", id))
}
