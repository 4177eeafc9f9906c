//! Internal metrics collection.
//!
//! Collects lifecycle metrics in-memory; the admin stats endpoint and the
//! periodic metrics log read snapshots of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the voucher service.
#[derive(Debug, Default)]
pub struct Metrics {
    // Webhook gateway
    pub webhooks_received: Counter,
    pub webhooks_rejected: Counter,

    // Lifecycle
    pub sessions_created: Counter,
    pub sessions_expired: Counter,
    pub orders_created: Counter,
    pub orders_completed: Counter,
    pub orders_failed: Counter,
    pub orders_rejected: Counter,
    pub vouchers_issued: Counter,
    pub vouchers_expired: Counter,
    pub vouchers_redeemed: Counter,

    // Outbound deliveries
    pub notifications_sent: Counter,
    pub notifications_failed: Counter,
    pub callbacks_sent: Counter,
    pub callbacks_failed: Counter,
    pub outbox_enqueued: Counter,
    pub outbox_delivered: Counter,
    pub outbox_dead: Counter,
    pub rate_limited_requests: Counter,

    // Latency histograms
    pub payment_latency_ms: Histogram,
    pub messaging_latency_ms: Histogram,
    pub billing_latency_ms: Histogram,

    // Gauges
    pub outbox_depth: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub webhooks_received: u64,
    pub webhooks_rejected: u64,
    pub sessions_created: u64,
    pub orders_created: u64,
    pub orders_completed: u64,
    pub orders_failed: u64,
    pub orders_rejected: u64,
    pub vouchers_issued: u64,
    pub vouchers_redeemed: u64,
    pub notifications_sent: u64,
    pub notifications_failed: u64,
    pub callbacks_sent: u64,
    pub callbacks_failed: u64,
    pub outbox_dead: u64,
    pub outbox_depth: u64,
    pub payment_latency_mean_ms: f64,
    pub messaging_latency_mean_ms: f64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            webhooks_received: self.webhooks_received.get(),
            webhooks_rejected: self.webhooks_rejected.get(),
            sessions_created: self.sessions_created.get(),
            orders_created: self.orders_created.get(),
            orders_completed: self.orders_completed.get(),
            orders_failed: self.orders_failed.get(),
            orders_rejected: self.orders_rejected.get(),
            vouchers_issued: self.vouchers_issued.get(),
            vouchers_redeemed: self.vouchers_redeemed.get(),
            notifications_sent: self.notifications_sent.get(),
            notifications_failed: self.notifications_failed.get(),
            callbacks_sent: self.callbacks_sent.get(),
            callbacks_failed: self.callbacks_failed.get(),
            outbox_dead: self.outbox_dead.get(),
            outbox_depth: self.outbox_depth.get(),
            payment_latency_mean_ms: self.payment_latency_ms.mean(),
            messaging_latency_mean_ms: self.messaging_latency_ms.mean(),
        }
    }
}

/// Logs a snapshot as one structured line.
pub fn log_snapshot(snapshot: &MetricsSnapshot) {
    tracing::info!(
        webhooks_received = snapshot.webhooks_received,
        webhooks_rejected = snapshot.webhooks_rejected,
        orders_created = snapshot.orders_created,
        orders_completed = snapshot.orders_completed,
        orders_rejected = snapshot.orders_rejected,
        vouchers_issued = snapshot.vouchers_issued,
        notifications_failed = snapshot.notifications_failed,
        callbacks_failed = snapshot.callbacks_failed,
        outbox_depth = snapshot.outbox_depth,
        outbox_dead = snapshot.outbox_dead,
        payment_latency_mean_ms = snapshot.payment_latency_mean_ms,
        "Lifecycle metrics"
    );
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
