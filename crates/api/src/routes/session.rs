//! Customer session lookup.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use gardens_core::CustomerSession;

use crate::response::ApiError;
use crate::state::AppState;

/// GET /session/:id - 404 when unknown, 410 once expired.
pub async fn get_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<CustomerSession>, ApiError> {
    let session = state.store.get_session(&session_id, Utc::now())?;
    Ok(Json(session))
}
