//! Size and time limits for inbound requests.
//!
//! The webhook body limit bounds memory per request before the signature is
//! checked. Customer limits are enforced by `Customer::check_lengths`.

// === Body Limits ===

/// Maximum webhook payload size in bytes (64KB).
pub const MAX_WEBHOOK_BODY_BYTES: usize = 64 * 1024;

// === String Field Limits (chars) ===

/// Customer display name max length.
pub const MAX_CUSTOMER_NAME_LEN: usize = 100;

/// WhatsApp number max length before normalization.
pub const MAX_WHATSAPP_LEN: usize = 32;

/// Order source tag max length.
pub const MAX_SOURCE_LEN: usize = 16;

// === Phone Number Bounds (digits) ===

/// Shortest accepted subscriber number.
pub const MIN_PHONE_DIGITS: usize = 8;

/// E.164 maximum.
pub const MAX_PHONE_DIGITS: usize = 15;

// === Timestamp Bounds ===

/// Default accepted clock skew for webhook timestamps (seconds).
pub const DEFAULT_REPLAY_TOLERANCE_SECS: u64 = 300;
