//! Outbound integrations for the voucher service.
//!
//! - WhatsApp messaging provider (voucher delivery to the customer)
//! - MikPos billing callback (voucher-generated announcement)
//! - Notification dispatcher tying templates, phone normalization and the
//!   two clients together

pub mod billing;
pub mod config;
pub mod dispatcher;
pub mod templates;
pub mod whatsapp;

pub use billing::{BillingNotifier, MikPosClient, VoucherGenerated};
pub use config::{BillingConfig, MessagingConfig};
pub use dispatcher::{Delivery, NotificationDispatcher, OutboundMessage};
pub use whatsapp::{MessageSender, WhatsAppClient};
