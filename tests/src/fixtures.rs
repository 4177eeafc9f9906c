//! Test fixtures and payload builders.

use chrono::Utc;
use gardens_core::sign;

/// Webhook secret shared by the test router and the fixtures.
pub const TEST_SECRET: &str = "test-webhook-secret";

/// Admin token configured on the test router.
pub const TEST_ADMIN_TOKEN: &str = "test-admin-token-0123456789";

pub const TEST_MAC: &str = "AA:BB:CC:DD:EE:FF";

pub const TEST_PHONE: &str = "081234567890";

pub const TEST_LOGIN_URL: &str = "http://10.5.50.1/login";

/// A `voucher_purchase_request` body for `mac` asking for `profile`.
pub fn purchase_request(mac: &str, profile: Option<&str>) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "action": "voucher_purchase_request",
        "customer": { "mac_address": mac, "ip_address": "10.5.50.2" },
        "hotspot": {
            "interface": "ether2",
            "server_name": "hs-gardens",
            "login_url": TEST_LOGIN_URL
        },
        "timestamp": Utc::now().timestamp()
    });
    if let Some(profile) = profile {
        payload["requested_profile"] = serde_json::Value::String(profile.to_string());
    }
    payload
}

/// A `payment_notification` body.
pub fn payment_notification(order_id: &str) -> serde_json::Value {
    serde_json::json!({
        "action": "payment_notification",
        "payment": { "order_id": order_id, "status": "paid", "transaction_id": "TRX-1" },
        "timestamp": Utc::now().timestamp()
    })
}

/// Serializes a payload and signs it with [`TEST_SECRET`].
pub fn signed(payload: &serde_json::Value) -> (Vec<u8>, String) {
    let body = serde_json::to_vec(payload).unwrap();
    let signature = format!("sha256={}", sign(&body, TEST_SECRET).unwrap());
    (body, signature)
}

/// Body of `POST /order/create`.
pub fn order_request(session_id: &str, package_id: &str, amount: u64) -> serde_json::Value {
    serde_json::json!({
        "session_id": session_id,
        "package_id": package_id,
        "customer": { "name": "Andi", "whatsapp": TEST_PHONE },
        "amount": amount
    })
}

/// Body of `POST /payment/success`.
pub fn payment_success(order_id: &str, amount: u64) -> serde_json::Value {
    serde_json::json!({
        "order_id": order_id,
        "payment_method": "qris",
        "transaction_id": format!("TRX-{}", order_id),
        "amount": amount
    })
}
