//! Admin bearer-token authentication.
//!
//! The admin surface is guarded by a single shared token configured as
//! `ADMIN_TOKEN`. When no token is configured the admin routes are disabled.

use subtle::ConstantTimeEq;

use crate::error::{Error, Result};

/// Extract a token from request headers.
///
/// Checks in order:
/// 1. `Authorization: Bearer <token>`
/// 2. `X-Admin-Token: <token>`
pub fn extract_bearer_token<'a>(
    auth_header: Option<&'a str>,
    admin_header: Option<&'a str>,
) -> Result<&'a str> {
    if let Some(auth) = auth_header {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Ok(token);
            }
        }
    }

    if let Some(token) = admin_header.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(token);
    }

    Err(Error::unauthorized("admin token is required"))
}

/// Compares a presented token with the configured one in constant time.
pub fn verify_admin_token(provided: &str, expected: Option<&str>) -> Result<()> {
    let expected = expected
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::Forbidden("admin access is disabled".into()))?;

    if bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(Error::unauthorized("invalid admin token"))
    }
}
