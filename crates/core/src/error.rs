//! Unified error types for the voucher service.
//!
//! Every variant carries a stable error code and an HTTP status so the API
//! layer can render it without re-classifying:
//! - SIG_001-005: Webhook signature errors
//! - NOT_FOUND, SESSION_EXPIRED, ORDER_EXPIRED, VOUCHER_EXPIRED: lookup errors
//! - ALREADY_PROCESSED: state transition rejected
//! - INVALID_INPUT, INVALID_PACKAGE: validation errors
//! - UPSTREAM_FAILURE, CONFIGURATION_ERROR: integration errors

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Webhook signature error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureErrorCode {
    /// SIG_001: Signature header is required
    Missing,
    /// SIG_002: Signature header is not a hex HMAC-SHA256 digest
    Malformed,
    /// SIG_003: Signature does not match the payload
    Mismatch,
    /// SIG_004: Payload timestamp outside the tolerance window
    Stale,
    /// SIG_005: Delivery already seen
    Replayed,
}

impl SignatureErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Missing => "SIG_001",
            Self::Malformed => "SIG_002",
            Self::Mismatch => "SIG_003",
            Self::Stale => "SIG_004",
            Self::Replayed => "SIG_005",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Replayed => 409,
            _ => 401,
        }
    }
}

/// Unified error type for the voucher service.
#[derive(Debug, Error)]
pub enum Error {
    /// Webhook signature error with code.
    #[error("[{code}] {message}")]
    Signature {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("session expired: {0}")]
    SessionExpired(String),

    #[error("order expired: {0}")]
    OrderExpired(String),

    #[error("voucher expired: {0}")]
    VoucherExpired(String),

    #[error("already processed: {0}")]
    AlreadyProcessed(String),

    #[error("invalid package: {0}")]
    InvalidPackage(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a signature error.
    pub fn signature(code: SignatureErrorCode, msg: impl Into<String>) -> Self {
        Self::Signature {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn already_processed(msg: impl Into<String>) -> Self {
        Self::AlreadyProcessed(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Signature { http_status, .. } => *http_status,
            Self::NotFound { .. } => 404,
            Self::SessionExpired(_) => 410,
            Self::OrderExpired(_) => 410,
            Self::VoucherExpired(_) => 410,
            Self::AlreadyProcessed(_) => 409,
            Self::InvalidPackage(_) => 400,
            Self::InvalidInput(_) => 400,
            Self::Serialization(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::Upstream(_) => 502,
            Self::Configuration(_) => 503,
            Self::Io(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// Get the stable error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Signature { code, .. } => code,
            Self::NotFound { .. } => "NOT_FOUND",
            Self::SessionExpired(_) => "SESSION_EXPIRED",
            Self::OrderExpired(_) => "ORDER_EXPIRED",
            Self::VoucherExpired(_) => "VOUCHER_EXPIRED",
            Self::AlreadyProcessed(_) => "ALREADY_PROCESSED",
            Self::InvalidPackage(_) => "INVALID_PACKAGE",
            Self::InvalidInput(_) | Self::Serialization(_) => "INVALID_INPUT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Upstream(_) => "UPSTREAM_FAILURE",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Io(_) | Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether the error is a client mistake rather than a server fault.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status())
    }
}
