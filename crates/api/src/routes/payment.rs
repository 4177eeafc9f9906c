//! Payment gateway callbacks from the storefront.

use axum::{extract::State, Json};
use chrono::Utc;
use gardens_core::PaymentInfo;
use serde::Deserialize;
use validator::Validate;

use crate::extractors::JsonBody;
use crate::lifecycle::{complete_payment, fail_payment};
use crate::response::{ApiError, PaymentFailureResponse, PaymentSuccessResponse};
use crate::state::AppState;

/// Body of `POST /payment/success`.
#[derive(Debug, Deserialize, Validate)]
pub struct PaymentSuccessRequest {
    #[validate(length(min = 1, max = 128))]
    pub order_id: String,
    #[validate(length(min = 1, max = 128))]
    pub payment_method: String,
    #[validate(length(min = 1, max = 128))]
    pub transaction_id: String,
    pub amount: u64,
}

/// Body of `POST /payment/failure`.
#[derive(Debug, Deserialize, Validate)]
pub struct PaymentFailureRequest {
    #[validate(length(min = 1, max = 128))]
    pub order_id: String,
    #[validate(length(max = 128))]
    pub reason: Option<String>,
}

fn validation_errors(errors: validator::ValidationErrors) -> ApiError {
    let details = errors
        .field_errors()
        .into_iter()
        .map(|(field, _)| format!("{} is invalid", field))
        .collect();
    ApiError::validation(details)
}

/// POST /payment/success - Completes the order and issues the voucher.
///
/// A second call for the same order is rejected with 409 and issues nothing.
pub async fn payment_success_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<PaymentSuccessRequest>,
) -> Result<Json<PaymentSuccessResponse>, ApiError> {
    request.validate().map_err(validation_errors)?;

    let now = Utc::now();
    let payment = PaymentInfo {
        method: request.payment_method,
        transaction_id: request.transaction_id,
        amount: request.amount,
        paid_at: now,
    };

    let response = complete_payment(&state, &request.order_id, payment, now).await?;
    Ok(Json(response))
}

/// POST /payment/failure - Fails a pending order.
pub async fn payment_failure_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<PaymentFailureRequest>,
) -> Result<Json<PaymentFailureResponse>, ApiError> {
    request.validate().map_err(validation_errors)?;

    let order = fail_payment(&state, &request.order_id, request.reason.as_deref())?;
    Ok(Json(PaymentFailureResponse {
        success: true,
        order_id: order.id,
        status: order.status.as_str().to_string(),
    }))
}
