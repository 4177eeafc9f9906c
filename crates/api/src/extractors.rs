//! Request extractors.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts},
    Json,
};
use gardens_core::{extract_bearer_token, verify_admin_token, Error};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::response::ApiError;
use crate::state::AppState;

/// Header accepted as an alternative to `Authorization: Bearer`.
pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// Proof that the request carried the configured admin token.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

#[async_trait]
impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state
            .config
            .admin_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Forbidden("admin access is disabled".into()))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());
        let admin_header = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|h| h.to_str().ok());

        let token = extract_bearer_token(auth_header, admin_header)?;
        verify_admin_token(token, Some(expected)).map_err(|e| {
            warn!(path = %parts.uri.path(), "Rejected admin token");
            e
        })?;

        Ok(AdminAuth)
    }
}

/// JSON request body whose rejections render as an [`ApiError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                debug!(status = %rejection.status(), "Rejected JSON body");
                Err(ApiError::bad_request(rejection.body_text()))
            }
        }
    }
}

/// Client IP address.
#[derive(Debug, Clone)]
pub struct ClientIp(pub Option<String>);

impl ClientIp {
    /// Key for per-client limits.
    pub fn key(&self) -> &str {
        self.0.as_deref().unwrap_or("unknown")
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // First hop of X-Forwarded-For when behind a proxy
        if let Some(xff) = parts.headers.get("X-Forwarded-For") {
            if let Ok(xff_str) = xff.to_str() {
                if let Some(ip) = xff_str.split(',').next().map(str::trim) {
                    if !ip.is_empty() {
                        return Ok(ClientIp(Some(ip.to_string())));
                    }
                }
            }
        }

        if let Some(real_ip) = parts.headers.get("X-Real-IP") {
            if let Ok(ip) = real_ip.to_str() {
                return Ok(ClientIp(Some(ip.trim().to_string())));
            }
        }

        Ok(ClientIp(None))
    }
}
