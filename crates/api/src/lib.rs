//! HTTP API layer for the voucher service.

pub mod extractors;
pub mod lifecycle;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod settings;
pub mod state;

pub use routes::router;
pub use settings::{IntegrationSettings, ServiceConfig};
pub use state::AppState;
