//! Transactional store for the voucher lifecycle.
//!
//! Holds customer sessions, orders, vouchers and the notification outbox.
//! State transitions that must not race (most importantly pending →
//! completed with voucher issuance) are single store operations.

pub mod config;
pub mod memory;
pub mod outbox;

pub use config::StoreConfig;
pub use memory::{Store, StoreStats, SweepReport};
pub use outbox::{OutboxEntry, OutboxKind, OutboxState, RetryPolicy};
