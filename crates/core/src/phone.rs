//! WhatsApp number normalization to Indonesian international format.

use crate::error::{Error, Result};
use crate::limits::{MAX_PHONE_DIGITS, MIN_PHONE_DIGITS};

/// Country calling code for Indonesia.
pub const COUNTRY_CODE: &str = "62";

/// Normalizes a phone number to `62…` digits.
///
/// - formatting characters (`+`, spaces, `-`, `.`, parentheses) are dropped
/// - a leading `0` is replaced by `62`
/// - numbers already starting with `62` are kept
/// - bare subscriber numbers get `62` prepended
pub fn normalize_phone(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_input("phone number is required"));
    }

    if let Some(bad) = trimmed
        .chars()
        .find(|c| !(c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '.' | '(' | ')')))
    {
        return Err(Error::invalid_input(format!(
            "phone number contains invalid character '{}'",
            bad
        )));
    }

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    let normalized = if let Some(rest) = digits.strip_prefix('0') {
        format!("{}{}", COUNTRY_CODE, rest)
    } else if digits.starts_with(COUNTRY_CODE) {
        digits
    } else {
        format!("{}{}", COUNTRY_CODE, digits)
    };

    if normalized.len() < MIN_PHONE_DIGITS || normalized.len() > MAX_PHONE_DIGITS {
        return Err(Error::invalid_input(format!(
            "phone number must have {}-{} digits",
            MIN_PHONE_DIGITS, MAX_PHONE_DIGITS
        )));
    }

    Ok(normalized)
}
