//! Voucher status and redemption.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use gardens_core::Voucher;
use serde::Deserialize;

use crate::extractors::JsonBody;
use crate::response::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VoucherStatusQuery {
    pub code: Option<String>,
    pub order_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub code: String,
}

/// GET /voucher/status?code=|order_id= - Applies lazy expiry before answering.
pub async fn voucher_status_handler(
    State(state): State<AppState>,
    Query(query): Query<VoucherStatusQuery>,
) -> Result<Json<Voucher>, ApiError> {
    let now = Utc::now();
    let code = query.code.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let order_id = query
        .order_id
        .as_deref()
        .map(str::trim)
        .filter(|o| !o.is_empty());

    let voucher = match (code, order_id) {
        (Some(code), _) => state.store.voucher_by_code(code, now)?,
        (None, Some(order_id)) => state.store.voucher_by_order(order_id, now)?,
        (None, None) => return Err(ApiError::bad_request("code or order_id is required")),
    };
    Ok(Json(voucher))
}

/// POST /voucher/redeem - Marks an active voucher as used.
pub async fn redeem_voucher_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RedeemRequest>,
) -> Result<Json<Voucher>, ApiError> {
    let voucher = state
        .store
        .redeem_voucher(request.code.trim(), Utc::now())?;
    Ok(Json(voucher))
}
