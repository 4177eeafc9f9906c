//! Error paths of the webhook gateway and the order lifecycle.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use gardens_core::SIGNATURE_HEADER;
use integration_tests::{fixtures, setup::TestContext};
use std::future::IntoFuture;
use store::StoreConfig;

/// Paying the same order twice issues exactly one voucher
#[tokio::test]
async fn test_double_payment_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let session_id = ctx.open_session(&server, Some("1day")).await;
    let order_id = ctx.create_order(&server, &session_id, "1day", 15_000).await;

    server
        .post("/payment/success")
        .json(&fixtures::payment_success(&order_id, 15_000))
        .await
        .assert_status_ok();

    let response = server
        .post("/payment/success")
        .json(&fixtures::payment_success(&order_id, 15_000))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "ALREADY_PROCESSED");

    assert_eq!(ctx.store.stats().vouchers_active, 1);
    assert_eq!(ctx.messenger.sent_count(), 1);
}

/// Concurrent payment callbacks race for one order; one wins
#[tokio::test]
async fn test_concurrent_payments_issue_one_voucher() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let session_id = ctx.open_session(&server, None).await;
    let order_id = ctx.create_order(&server, &session_id, "1hour", 5_000).await;

    let body = fixtures::payment_success(&order_id, 5_000);
    let (a, b) = tokio::join!(
        server.post("/payment/success").json(&body).into_future(),
        server.post("/payment/success").json(&body).into_future(),
    );

    let mut statuses = vec![a.status_code().as_u16(), b.status_code().as_u16()];
    statuses.sort();
    assert_eq!(statuses, vec![200, 409]);
    assert_eq!(ctx.store.stats().vouchers_active, 1);
}

/// Payment amount must match the order
#[tokio::test]
async fn test_payment_amount_mismatch() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let session_id = ctx.open_session(&server, None).await;
    let order_id = ctx.create_order(&server, &session_id, "1day", 15_000).await;

    let response = server
        .post("/payment/success")
        .json(&fixtures::payment_success(&order_id, 1_000))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let order: serde_json::Value = server.get(&format!("/order/{}", order_id)).await.json();
    assert_eq!(order["status"], "pending");
}

/// A failed order cannot be paid afterwards
#[tokio::test]
async fn test_failed_order_cannot_complete() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let session_id = ctx.open_session(&server, None).await;
    let order_id = ctx.create_order(&server, &session_id, "1day", 15_000).await;

    let response = server
        .post("/payment/failure")
        .json(&serde_json::json!({ "order_id": order_id, "reason": "card declined" }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "failed");

    let response = server
        .post("/payment/success")
        .json(&fixtures::payment_success(&order_id, 15_000))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(ctx.store.stats().vouchers_active, 0);
}

/// An expired session answers 410 once, then 404
#[tokio::test]
async fn test_session_expiry() {
    let ctx = TestContext::with_store_config(
        StoreConfig {
            session_ttl_minutes: -1,
            ..StoreConfig::default()
        },
        |_| {},
    );
    let server = ctx.server();

    let session_id = ctx.open_session(&server, None).await;

    let response = server.get(&format!("/session/{}", session_id)).await;
    response.assert_status(StatusCode::GONE);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "SESSION_EXPIRED");

    let response = server.get(&format!("/session/{}", session_id)).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
}

/// Orders cannot be opened against an expired session
#[tokio::test]
async fn test_order_on_expired_session() {
    let ctx = TestContext::with_store_config(
        StoreConfig {
            session_ttl_minutes: -1,
            ..StoreConfig::default()
        },
        |_| {},
    );
    let server = ctx.server();

    let session_id = ctx.open_session(&server, None).await;
    let response = server
        .post("/order/create")
        .json(&fixtures::order_request(&session_id, "1day", 15_000))
        .await;
    response.assert_status(StatusCode::GONE);
    assert_eq!(ctx.store.stats().orders_pending, 0);
}

#[tokio::test]
async fn test_unknown_session() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.get("/session/sess_missing").await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = server
        .post("/order/create")
        .json(&fixtures::order_request("sess_missing", "1day", 15_000))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

/// Unknown package ids are rejected, never defaulted
#[tokio::test]
async fn test_unknown_package_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let session_id = ctx.open_session(&server, None).await;
    let response = server
        .post("/order/create")
        .json(&fixtures::order_request(&session_id, "2days", 20_000))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "INVALID_PACKAGE");

    let (body, signature) =
        fixtures::signed(&fixtures::purchase_request(fixtures::TEST_MAC, Some("forever")));
    let response = server
        .post("/webhook")
        .add_header(SIGNATURE_HEADER, &signature)
        .bytes(body.into())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

/// Customers that could never receive their voucher are refused up front
#[tokio::test]
async fn test_order_rejects_invalid_customer() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, None).await;

    let mut request = fixtures::order_request(&session_id, "1day", 15_000);
    request["customer"]["name"] = serde_json::json!("A".repeat(101));
    let response = server.post("/order/create").json(&request).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");

    let mut request = fixtures::order_request(&session_id, "1day", 15_000);
    request["customer"]["whatsapp"] = serde_json::json!("ask at the counter");
    let response = server.post("/order/create").json(&request).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    assert_eq!(ctx.store.stats().orders_pending, 0);
}

/// Storefront bodies that do not deserialize get the JSON error shape
#[tokio::test]
async fn test_malformed_storefront_bodies() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/payment/success")
        .json(&serde_json::json!({ "order_id": "x" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
    assert!(body["error"].as_str().unwrap().contains("payment_method"));

    let response = server
        .post("/order/create")
        .content_type("application/json")
        .bytes(b"{broken".to_vec().into())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");

    let response = server
        .post("/voucher/redeem")
        .bytes(br#"{"code":"1D-000000-NOPE"}"#.to_vec().into())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
}

/// Order amount must match the catalog price
#[tokio::test]
async fn test_order_amount_must_match_price() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let session_id = ctx.open_session(&server, None).await;
    let response = server
        .post("/order/create")
        .json(&fixtures::order_request(&session_id, "1week", 1))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

/// Signature failures map to distinct codes
#[tokio::test]
async fn test_webhook_signature_errors() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let payload = fixtures::purchase_request(fixtures::TEST_MAC, None);
    let (body, _) = fixtures::signed(&payload);

    // Missing header
    let response = server.post("/webhook").bytes(body.clone().into()).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let json: serde_json::Value = response.json();
    assert_eq!(json["code"], "SIG_001");

    // Not hex
    let response = server
        .post("/webhook")
        .add_header(SIGNATURE_HEADER, "sha256=not-a-digest")
        .bytes(body.clone().into())
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let json: serde_json::Value = response.json();
    assert_eq!(json["code"], "SIG_002");

    // Signed with another secret
    let forged = format!(
        "sha256={}",
        gardens_core::sign(&body, "someone-else").unwrap()
    );
    let response = server
        .post("/webhook")
        .add_header(SIGNATURE_HEADER, &forged)
        .bytes(body.clone().into())
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let json: serde_json::Value = response.json();
    assert_eq!(json["code"], "SIG_003");

    assert_eq!(ctx.store.stats().sessions, 0);
}

/// A body modified after signing is rejected
#[tokio::test]
async fn test_webhook_tampered_body() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let (_, signature) =
        fixtures::signed(&fixtures::purchase_request(fixtures::TEST_MAC, Some("1hour")));
    let tampered =
        serde_json::to_vec(&fixtures::purchase_request(fixtures::TEST_MAC, Some("1week")))
            .unwrap();

    let response = server
        .post("/webhook")
        .add_header(SIGNATURE_HEADER, &signature)
        .bytes(tampered.into())
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

/// Stale timestamps are rejected even with a valid signature
#[tokio::test]
async fn test_webhook_stale_timestamp() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let mut payload = fixtures::purchase_request(fixtures::TEST_MAC, None);
    payload["timestamp"] = serde_json::json!((Utc::now() - Duration::minutes(10)).timestamp());
    let (body, signature) = fixtures::signed(&payload);

    let response = server
        .post("/webhook")
        .add_header(SIGNATURE_HEADER, &signature)
        .bytes(body.into())
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let json: serde_json::Value = response.json();
    assert_eq!(json["code"], "SIG_004");
}

/// Replaying a delivery is rejected
#[tokio::test]
async fn test_webhook_replay_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let (body, signature) = fixtures::signed(&fixtures::purchase_request(fixtures::TEST_MAC, None));

    server
        .post("/webhook")
        .add_header(SIGNATURE_HEADER, &signature)
        .bytes(body.clone().into())
        .await
        .assert_status_ok();

    let response = server
        .post("/webhook")
        .add_header(SIGNATURE_HEADER, &signature)
        .bytes(body.into())
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let json: serde_json::Value = response.json();
    assert_eq!(json["code"], "SIG_005");
    assert_eq!(ctx.store.stats().sessions, 1);
}

/// A signed body without a timestamp could be replayed later, so it is refused
#[tokio::test]
async fn test_webhook_requires_timestamp() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let mut payload = fixtures::purchase_request(fixtures::TEST_MAC, None);
    payload.as_object_mut().unwrap().remove("timestamp");
    let (body, signature) = fixtures::signed(&payload);

    let response = server
        .post("/webhook")
        .add_header(SIGNATURE_HEADER, &signature)
        .bytes(body.into())
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let json: serde_json::Value = response.json();
    assert_eq!(json["code"], "SIG_004");
    assert_eq!(ctx.store.stats().sessions, 0);
}

/// Timestamps are optional when the freshness check is switched off
#[tokio::test]
async fn test_webhook_timestamp_optional_without_tolerance() {
    let ctx = TestContext::with_config(|config| config.replay_tolerance_secs = 0);
    let server = ctx.server();

    let mut payload = fixtures::purchase_request(fixtures::TEST_MAC, None);
    payload.as_object_mut().unwrap().remove("timestamp");
    let (body, signature) = fixtures::signed(&payload);

    server
        .post("/webhook")
        .add_header(SIGNATURE_HEADER, &signature)
        .bytes(body.into())
        .await
        .assert_status_ok();
}

/// A delivery rejected after signature checks is not remembered as seen
#[tokio::test]
async fn test_rejected_webhook_can_be_resent() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let (body, signature) = fixtures::signed(&fixtures::purchase_request("not-a-mac", None));
    for _ in 0..2 {
        let response = server
            .post("/webhook")
            .add_header(SIGNATURE_HEADER, &signature)
            .bytes(body.clone().into())
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let json: serde_json::Value = response.json();
        assert_eq!(json["code"], "INVALID_INPUT");
    }
}

/// Without a configured secret every webhook is refused
#[tokio::test]
async fn test_webhook_without_secret() {
    let ctx = TestContext::with_config(|config| config.webhook_secret.clear());
    let server = ctx.server();

    let (body, signature) = fixtures::signed(&fixtures::purchase_request(fixtures::TEST_MAC, None));
    let response = server
        .post("/webhook")
        .add_header(SIGNATURE_HEADER, &signature)
        .bytes(body.into())
        .await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

/// Malformed JSON with a valid signature is a client error
#[tokio::test]
async fn test_webhook_malformed_body() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let body = b"{not json".to_vec();
    let signature = format!(
        "sha256={}",
        gardens_core::sign(&body, fixtures::TEST_SECRET).unwrap()
    );
    let response = server
        .post("/webhook")
        .add_header(SIGNATURE_HEADER, &signature)
        .bytes(body.into())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

/// Voucher status needs a code or an order id
#[tokio::test]
async fn test_voucher_status_requires_key() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server
        .get("/voucher/status")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/voucher/status")
        .add_query_param("code", "1D-000000-NOPE")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
