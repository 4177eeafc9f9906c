//! Admin endpoints, guarded by the `ADMIN_TOKEN` bearer token.

use axum::{body::Bytes, extract::State, Json};
use gardens_core::{normalize_phone, write_env_file, Error};
use messaging::templates::connection_test_message;
use serde::Deserialize;
use telemetry::metrics;
use tracing::{info, warn};

use crate::extractors::{AdminAuth, JsonBody};
use crate::response::{ApiError, MessagingTestResponse, SettingsUpdateResponse, StatsResponse};
use crate::settings::{IntegrationSettings, SettingsUpdate};
use crate::state::AppState;

/// GET /admin/settings - Current integration settings, secrets masked.
pub async fn get_settings_handler(
    _auth: AdminAuth,
    State(state): State<AppState>,
) -> Json<IntegrationSettings> {
    Json(state.integrations.read().masked())
}

/// PUT /admin/settings - Persists settings to the env file.
///
/// Existing `KEY=` lines are replaced in place and new keys appended; the
/// running service keeps its current clients until restarted. Updates are
/// applied one at a time so concurrent writers cannot drop each other's keys.
pub async fn update_settings_handler(
    _auth: AdminAuth,
    State(state): State<AppState>,
    JsonBody(update): JsonBody<SettingsUpdate>,
) -> Result<Json<SettingsUpdateResponse>, ApiError> {
    let pairs = update.to_env_pairs()?;
    let path = state.config.env_file.clone();

    let guard = state.settings_lock.lock().await;
    let to_write = pairs.clone();
    tokio::task::spawn_blocking(move || write_env_file(&path, &to_write))
        .await
        .map_err(|e| Error::internal(format!("settings writer panicked: {}", e)))??;

    state.integrations.write().apply(&pairs);
    drop(guard);

    let updated: Vec<String> = pairs.into_iter().map(|(key, _)| key).collect();
    info!(keys = ?updated, env_file = %state.config.env_file.display(), "Settings updated");

    Ok(Json(SettingsUpdateResponse {
        success: true,
        updated,
        restart_required: true,
    }))
}

/// GET /admin/stats
pub async fn stats_handler(_auth: AdminAuth, State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        store: state.store.stats(),
        metrics: metrics().snapshot(),
    })
}

/// Body of `POST /admin/messaging/test`.
#[derive(Debug, Default, Deserialize)]
pub struct MessagingTestRequest {
    /// Optional number to send a test message to
    pub phone: Option<String>,
}

/// POST /admin/messaging/test - Checks provider credentials, optionally
/// sending a test message. The body may be empty.
pub async fn messaging_test_handler(
    _auth: AdminAuth,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<MessagingTestResponse>, ApiError> {
    let request: MessagingTestRequest = if body.iter().all(u8::is_ascii_whitespace) {
        MessagingTestRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {}", e)))?
    };
    let sender = state.dispatcher.sender();

    let connected = sender.test_connection().await?;
    if !connected {
        warn!("Messaging provider rejected the configured credentials");
    }

    let message_sent = match request.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(raw) if connected => {
            let phone = normalize_phone(raw)?;
            Some(sender.send_text(&phone, &connection_test_message()).await.is_ok())
        }
        _ => None,
    };

    Ok(Json(MessagingTestResponse {
        success: connected,
        connected,
        message_sent,
    }))
}
