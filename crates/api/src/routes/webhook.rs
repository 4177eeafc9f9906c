//! MikPos webhook endpoint.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use gardens_core::SIGNATURE_HEADER;
use telemetry::metrics;
use tracing::warn;

use crate::extractors::ClientIp;
use crate::lifecycle::handle_webhook;
use crate::response::{ApiError, WebhookResponse};
use crate::state::AppState;

/// POST /webhook - Hotspot purchase requests, redirects and payment notices.
///
/// The body is verified against `X-MikPos-Signature` (HMAC-SHA256 of the raw
/// bytes) before it is parsed.
pub async fn webhook_handler(
    State(state): State<AppState>,
    client_ip: ClientIp,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    if !state.rate_limiter.check(client_ip.key()) {
        metrics().rate_limited_requests.inc();
        return Err(ApiError::rate_limited(
            "Too many webhook requests",
            Some(state.rate_limiter.retry_after_secs()),
        ));
    }

    metrics().webhooks_received.inc();

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    match handle_webhook(&state, &body, signature, Utc::now()).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            metrics().webhooks_rejected.inc();
            warn!(
                client_ip = client_ip.key(),
                code = e.error_code(),
                error = %e,
                "Webhook rejected"
            );
            Err(e.into())
        }
    }
}
