//! Order creation and lookup.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use gardens_core::{Customer, NewOrder, Order, Package, DEFAULT_ORDER_SOURCE};
use serde::Deserialize;
use tracing::debug;

use crate::extractors::JsonBody;
use crate::response::{ApiError, CreateOrderResponse};
use crate::state::AppState;

/// Body of `POST /order/create`.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub session_id: String,
    pub package_id: String,
    pub customer: Customer,
    pub amount: u64,
    #[serde(default)]
    pub source: Option<String>,
}

/// POST /order/create - Opens a 15 minute payment window.
pub async fn create_order_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, ApiError> {
    let package: Package = request.package_id.parse()?;
    debug!(session_id = %request.session_id, package = %package, "Creating order");

    let order = state.store.create_order(
        NewOrder {
            session_id: request.session_id,
            package,
            customer: request.customer,
            amount: request.amount,
            source: request
                .source
                .unwrap_or_else(|| DEFAULT_ORDER_SOURCE.to_string()),
        },
        Utc::now(),
    )?;

    Ok(Json(CreateOrderResponse {
        success: true,
        order_id: order.id,
        package_id: order.package,
        amount: order.amount,
        status: order.status.as_str().to_string(),
        expires_at: order.expires_at,
    }))
}

/// GET /order/:id
pub async fn get_order_handler(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.store.get_order(&order_id)?))
}
