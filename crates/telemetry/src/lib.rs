//! Internal telemetry for the GARDENS-NET voucher service.
//!
//! Structured logging setup, in-process lifecycle metrics, and the health
//! registry behind the `/health` endpoints.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
