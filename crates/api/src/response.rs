//! Standardized API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use gardens_core::{Error, Package};
use serde::{Deserialize, Serialize};
use store::StoreStats;
use telemetry::MetricsSnapshot;
use tracing::error;

/// Response to a session-creating webhook.
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Seconds until the session expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged: Option<bool>,
}

impl WebhookResponse {
    pub fn redirect(redirect_url: String, session_id: String, expires_in: i64) -> Self {
        Self {
            success: true,
            redirect_url: Some(redirect_url),
            session_id: Some(session_id),
            expires_in: Some(expires_in),
            acknowledged: None,
        }
    }

    pub fn acknowledged() -> Self {
        Self {
            success: true,
            redirect_url: None,
            session_id: None,
            expires_in: None,
            acknowledged: Some(true),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub success: bool,
    pub order_id: String,
    pub package_id: Package,
    pub amount: u64,
    pub status: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentSuccessResponse {
    pub success: bool,
    pub order_id: String,
    pub voucher_code: String,
    pub package_id: Package,
    pub expires_at: DateTime<Utc>,
    pub whatsapp_sent: bool,
    /// Hotspot login URL with the voucher prefilled, when the session
    /// carried one
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentFailureResponse {
    pub success: bool,
    pub order_id: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SettingsUpdateResponse {
    pub success: bool,
    pub updated: Vec<String>,
    pub restart_required: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub store: StoreStats,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessagingTestResponse {
    pub success: bool,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_sent: Option<bool>,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub messaging_healthy: bool,
    pub billing_healthy: bool,
    pub outbox_depth: u64,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = Some(details);
        self
    }
}

/// API error type carrying a stable error code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
    pub retry_after: Option<u64>,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new(msg, code),
            retry_after: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "INVALID_INPUT", msg)
    }

    pub fn rate_limited(msg: impl Into<String>, retry_after: Option<u64>) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            response: ErrorResponse::new(msg, "RATE_LIMITED"),
            retry_after,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", msg)
    }

    pub fn validation(errors: Vec<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            response: ErrorResponse::new("Validation failed", "INVALID_INPUT").with_details(errors),
            retry_after: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.response)).into_response();

        if let Some(retry_after) = self.retry_after {
            if let Ok(value) = retry_after.to_string().parse() {
                response.headers_mut().insert("Retry-After", value);
            }
        }

        response
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status =
            StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Server faults are logged here and not echoed to the client.
        if status.is_server_error() && !matches!(err, Error::Configuration(_) | Error::Upstream(_))
        {
            error!(error = %err, "Request failed");
            return ApiError::internal("Internal server error");
        }

        let message = match &err {
            Error::Signature { message, .. } => message.clone(),
            other => other.to_string(),
        };
        ApiError::with_code(status, err.error_code(), message)
    }
}
