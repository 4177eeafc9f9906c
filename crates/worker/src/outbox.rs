//! Outbox delivery worker.
//!
//! Retries WhatsApp notifications and billing callbacks that failed inline.
//! Delays follow the store's [`RetryPolicy`]; entries that exhaust it are
//! marked dead and kept for the admin stats.

use chrono::{DateTime, Utc};
use messaging::{NotificationDispatcher, OutboundMessage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use store::{OutboxKind, OutboxState, RetryPolicy, Store};
use tracing::{debug, info, warn};

/// Default number of entries attempted per run.
pub const DEFAULT_OUTBOX_BATCH: usize = 50;

/// Result of one outbox run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxRunReport {
    pub delivered: usize,
    pub retried: usize,
    pub dead: usize,
}

/// Worker that drains due outbox entries.
pub struct OutboxWorker {
    store: Arc<Store>,
    dispatcher: NotificationDispatcher,
    policy: RetryPolicy,
    batch_size: usize,
}

impl OutboxWorker {
    pub fn new(store: Arc<Store>, dispatcher: NotificationDispatcher, policy: RetryPolicy) -> Self {
        Self {
            store,
            dispatcher,
            policy,
            batch_size: DEFAULT_OUTBOX_BATCH,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub async fn run(&self) -> OutboxRunReport {
        self.run_at(Utc::now()).await
    }

    /// Attempts every entry due at `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> OutboxRunReport {
        let due = self.store.due_outbox(now, self.batch_size);
        let mut report = OutboxRunReport::default();
        if due.is_empty() {
            return report;
        }

        debug!(due = due.len(), "Draining outbox");

        for entry in due {
            let delivered = match &entry.kind {
                OutboxKind::WhatsApp { phone, message } => {
                    self.dispatcher
                        .deliver(&OutboundMessage {
                            phone: phone.clone(),
                            message: message.clone(),
                        })
                        .await
                }
                OutboxKind::BillingCallback { payload } => {
                    self.dispatcher.deliver_callback(payload).await
                }
            };

            if delivered {
                self.store.record_delivery(entry.id);
                report.delivered += 1;
                continue;
            }

            let error = format!("{} delivery failed", entry.kind.label());
            match self.store.record_failure(entry.id, &error, &self.policy, now) {
                Some(OutboxState::Dead) => report.dead += 1,
                Some(_) => report.retried += 1,
                None => warn!(outbox_id = entry.id, "Outbox entry vanished during delivery"),
            }
        }

        info!(
            delivered = report.delivered,
            retried = report.retried,
            dead = report.dead,
            "Outbox run complete"
        );
        report
    }
}
