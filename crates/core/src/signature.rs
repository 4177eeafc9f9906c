//! Webhook signature verification (HMAC-SHA256 over the raw body).

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{Error, Result, SignatureErrorCode};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the billing product's signature.
pub const SIGNATURE_HEADER: &str = "X-MikPos-Signature";

/// Optional scheme prefix on the header value.
const SCHEME_PREFIX: &str = "sha256=";

/// Computes the hex HMAC-SHA256 of `payload`.
pub fn sign(payload: &[u8], secret: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| Error::configuration("invalid webhook secret"))?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a signature header against the raw payload.
///
/// Accepts `sha256=<hex>` or a bare hex digest. The comparison runs in
/// constant time over the decoded digest bytes.
pub fn verify_signature(payload: &[u8], header: Option<&str>, secret: &str) -> Result<()> {
    if secret.is_empty() {
        return Err(Error::configuration("webhook secret is not configured"));
    }

    let header = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| {
            Error::signature(SignatureErrorCode::Missing, "signature header is required")
        })?;

    let digest = header.strip_prefix(SCHEME_PREFIX).unwrap_or(header);
    let provided = hex::decode(digest).map_err(|_| {
        Error::signature(SignatureErrorCode::Malformed, "signature is not valid hex")
    })?;
    if provided.len() != 32 {
        return Err(Error::signature(
            SignatureErrorCode::Malformed,
            "signature must be a SHA-256 digest",
        ));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| Error::configuration("invalid webhook secret"))?;
    mac.update(payload);
    let expected = mac.finalize().into_bytes();

    if bool::from(expected.as_slice().ct_eq(&provided)) {
        Ok(())
    } else {
        Err(Error::signature(
            SignatureErrorCode::Mismatch,
            "signature does not match payload",
        ))
    }
}
