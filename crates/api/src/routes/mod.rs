//! API routes.

pub mod admin;
pub mod health;
pub mod order;
pub mod packages;
pub mod payment;
pub mod session;
pub mod voucher;
pub mod webhook;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use gardens_core::limits::MAX_WEBHOOK_BODY_BYTES;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Hotspot billing product
        .route("/webhook", post(webhook::webhook_handler))
        // Storefront
        .route("/session/:id", get(session::get_session_handler))
        .route("/order/create", post(order::create_order_handler))
        .route("/order/:id", get(order::get_order_handler))
        .route("/payment/success", post(payment::payment_success_handler))
        .route("/payment/failure", post(payment::payment_failure_handler))
        .route("/voucher/status", get(voucher::voucher_status_handler))
        .route("/voucher/redeem", post(voucher::redeem_voucher_handler))
        .route("/packages", get(packages::packages_handler))
        // Admin
        .route(
            "/admin/settings",
            get(admin::get_settings_handler).put(admin::update_settings_handler),
        )
        .route("/admin/stats", get(admin::stats_handler))
        .route("/admin/messaging/test", post(admin::messaging_test_handler))
        // Probes
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .layer(DefaultBodyLimit::max(MAX_WEBHOOK_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
