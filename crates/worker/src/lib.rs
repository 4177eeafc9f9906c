//! Background workers for the voucher service.
//!
//! - Expiry sweeper (sessions, pending orders, vouchers)
//! - Outbox delivery with exponential backoff
//! - Periodic metrics log

pub mod outbox;
pub mod scheduler;
pub mod sweeper;

pub use outbox::{OutboxRunReport, OutboxWorker};
pub use scheduler::*;
pub use sweeper::ExpirySweeper;
