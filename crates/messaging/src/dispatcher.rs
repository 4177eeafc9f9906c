//! Notification dispatcher.
//!
//! Sends never fail the caller. Each voucher notification reports a
//! [`Delivery`]; on a transport failure it hands back the rendered item so
//! the caller can queue it in the outbox.

use gardens_core::{normalize_phone, Voucher};
use std::sync::Arc;
use telemetry::metrics;
use tracing::{info, warn};

use crate::billing::{BillingNotifier, VoucherGenerated};
use crate::templates::voucher_message;
use crate::whatsapp::MessageSender;

/// A rendered message addressed to a normalized number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub phone: String,
    pub message: String,
}

/// Outcome of one notification attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery<T> {
    Sent,
    /// The transport failed; the rendered item can be sent again later.
    Retry(T),
    /// Nothing could be rendered. Retrying will not help.
    Dropped,
}

impl<T> Delivery<T> {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// Delivers voucher notifications to customers and the billing product.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: Arc<dyn MessageSender>,
    billing: Arc<dyn BillingNotifier>,
}

impl NotificationDispatcher {
    pub fn new(sender: Arc<dyn MessageSender>, billing: Arc<dyn BillingNotifier>) -> Self {
        Self { sender, billing }
    }

    pub fn sender(&self) -> &Arc<dyn MessageSender> {
        &self.sender
    }

    /// Normalizes the number, renders the template and sends it.
    pub async fn send_voucher(
        &self,
        whatsapp: &str,
        voucher: &Voucher,
    ) -> Delivery<OutboundMessage> {
        let phone = match normalize_phone(whatsapp) {
            Ok(phone) => phone,
            Err(e) => {
                metrics().notifications_failed.inc();
                warn!(
                    order_id = %voucher.order_id,
                    error = %e,
                    "Voucher notification not sent"
                );
                return Delivery::Dropped;
            }
        };

        let outbound = OutboundMessage {
            phone,
            message: voucher_message(voucher),
        };
        if self.deliver(&outbound).await {
            Delivery::Sent
        } else {
            Delivery::Retry(outbound)
        }
    }

    /// Sends an already-rendered message.
    pub async fn deliver(&self, outbound: &OutboundMessage) -> bool {
        match self.sender.send_text(&outbound.phone, &outbound.message).await {
            Ok(()) => {
                metrics().notifications_sent.inc();
                info!(phone = %outbound.phone, "Voucher notification sent");
                true
            }
            Err(e) => {
                metrics().notifications_failed.inc();
                warn!(phone = %outbound.phone, error = %e, "Voucher notification failed");
                false
            }
        }
    }

    /// Announces an issued voucher to the billing product.
    pub async fn announce_voucher(&self, voucher: &Voucher) -> Delivery<serde_json::Value> {
        let payload = match VoucherGenerated::from_voucher(voucher).to_value() {
            Ok(payload) => payload,
            Err(e) => {
                metrics().callbacks_failed.inc();
                warn!(order_id = %voucher.order_id, error = %e, "Billing callback not built");
                return Delivery::Dropped;
            }
        };

        if self.deliver_callback(&payload).await {
            Delivery::Sent
        } else {
            Delivery::Retry(payload)
        }
    }

    /// Posts an already-built callback body.
    pub async fn deliver_callback(&self, payload: &serde_json::Value) -> bool {
        match self.billing.voucher_generated(payload).await {
            Ok(()) => {
                metrics().callbacks_sent.inc();
                true
            }
            Err(e) => {
                metrics().callbacks_failed.inc();
                warn!(error = %e, "Billing callback failed");
                false
            }
        }
    }
}
