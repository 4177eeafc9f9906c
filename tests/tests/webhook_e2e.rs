//! End-to-end tests for the purchase flow.
//!
//! Signed webhook → session → order → payment → voucher, with the WhatsApp
//! and MikPos clients replaced by mocks implementing the same traits.

use chrono::{DateTime, Duration, Utc};
use integration_tests::{fixtures, setup::TestContext};
use regex::Regex;
use store::OutboxKind;

/// Full flow: signed webhook → order → payment → voucher delivered on WhatsApp
#[tokio::test]
async fn test_purchase_flow_e2e() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let session_id = ctx.open_session(&server, Some("1day")).await;
    assert!(session_id.starts_with("sess_"));

    // The storefront reads the session back
    let response = server.get(&format!("/session/{}", session_id)).await;
    response.assert_status_ok();
    let session: serde_json::Value = response.json();
    assert_eq!(session["mac_address"], fixtures::TEST_MAC);
    assert_eq!(session["requested_profile"], "1day");

    let order_id = ctx.create_order(&server, &session_id, "1day", 15_000).await;

    let response = server
        .post("/payment/success")
        .json(&fixtures::payment_success(&order_id, 15_000))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["whatsapp_sent"], true);
    assert_eq!(body["package_id"], "1day");

    let code = body["voucher_code"].as_str().unwrap();
    let code_pattern = Regex::new(r"^[A-Z0-9]+-\d+-[A-Z0-9]+$").unwrap();
    assert!(code_pattern.is_match(code), "unexpected voucher code {}", code);
    assert!(code.starts_with("1D-"));

    // Voucher lasts exactly one day from issue
    let expires_at: DateTime<Utc> = body["expires_at"].as_str().unwrap().parse().unwrap();
    let remaining = expires_at - Utc::now();
    assert!(remaining > Duration::hours(23) && remaining <= Duration::hours(24));

    // Hotspot login URL comes back prefilled
    let return_url = body["return_url"].as_str().unwrap();
    assert!(return_url.starts_with(fixtures::TEST_LOGIN_URL));
    assert!(return_url.contains(&format!("username={}", code)));

    // WhatsApp message went to the normalized number
    let sent = ctx.messenger.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].phone, "6281234567890");
    assert!(sent[0].message.contains(code));

    // MikPos got the voucher_generated callback
    let callbacks = ctx.billing.callbacks();
    assert_eq!(callbacks.len(), 1);
    assert_eq!(callbacks[0]["event"], "voucher_generated");
    assert_eq!(callbacks[0]["voucher_code"], code);

    // Order and voucher are queryable
    let order: serde_json::Value = server.get(&format!("/order/{}", order_id)).await.json();
    assert_eq!(order["status"], "completed");

    let response = server
        .get("/voucher/status")
        .add_query_param("order_id", &order_id)
        .await;
    response.assert_status_ok();
    let voucher: serde_json::Value = response.json();
    assert_eq!(voucher["code"], code);
    assert_eq!(voucher["status"], "active");

    assert!(ctx.store.outbox_entries().is_empty());
}

/// WhatsApp outage: the voucher is still issued and the message is queued
#[tokio::test]
async fn test_purchase_with_messaging_outage_queues_notification() {
    let ctx = TestContext::new();
    let server = ctx.server();
    ctx.messenger.set_should_fail(true);

    let session_id = ctx.open_session(&server, Some("1hour")).await;
    let order_id = ctx.create_order(&server, &session_id, "1hour", 5_000).await;

    let response = server
        .post("/payment/success")
        .json(&fixtures::payment_success(&order_id, 5_000))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["whatsapp_sent"], false);
    assert!(body["voucher_code"].as_str().unwrap().starts_with("1H-"));

    let queued = ctx.store.outbox_entries();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].order_id, order_id);
    assert!(matches!(queued[0].kind, OutboxKind::WhatsApp { .. }));
}

/// Queued messages are delivered once the provider recovers
#[tokio::test]
async fn test_outbox_worker_delivers_after_recovery() {
    let ctx = TestContext::new();
    let server = ctx.server();
    ctx.messenger.set_should_fail(true);

    let session_id = ctx.open_session(&server, None).await;
    let order_id = ctx.create_order(&server, &session_id, "3days", 35_000).await;
    server
        .post("/payment/success")
        .json(&fixtures::payment_success(&order_id, 35_000))
        .await
        .assert_status_ok();
    assert_eq!(ctx.store.outbox_entries().len(), 1);

    ctx.messenger.set_should_fail(false);
    let worker = worker::OutboxWorker::new(
        ctx.store.clone(),
        ctx.dispatcher.clone(),
        store::RetryPolicy::default(),
    );
    let report = worker.run_at(Utc::now()).await;

    assert_eq!(report.delivered, 1);
    assert_eq!(ctx.messenger.sent_count(), 1);
    assert!(ctx.store.outbox_entries().is_empty());
}

/// The redirect carries the session and the requested profile
#[tokio::test]
async fn test_webhook_redirect_url() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let (body, signature) =
        fixtures::signed(&fixtures::purchase_request(fixtures::TEST_MAC, Some("1week")));
    let response = server
        .post("/webhook")
        .content_type("application/json")
        .add_header(gardens_core::SIGNATURE_HEADER, &signature)
        .bytes(body.into())
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let session_id = body["session_id"].as_str().unwrap();
    assert_eq!(
        body["redirect_url"],
        format!(
            "https://shop.gardens.test/checkout?session={}&profile=1week",
            session_id
        )
    );
    let expires_in = body["expires_in"].as_i64().unwrap();
    assert!(expires_in > 29 * 60 && expires_in <= 30 * 60);
}

/// Payment notifications are acknowledged without creating a session
#[tokio::test]
async fn test_payment_notification_acknowledged() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let (body, signature) = fixtures::signed(&fixtures::payment_notification("WEB-1"));
    let response = server
        .post("/webhook")
        .content_type("application/json")
        .add_header(gardens_core::SIGNATURE_HEADER, &signature)
        .bytes(body.into())
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["acknowledged"], true);
    assert!(body.get("session_id").is_none());
    assert_eq!(ctx.store.stats().sessions, 0);
}

/// A redeemed voucher cannot be redeemed again
#[tokio::test]
async fn test_voucher_redeem_once() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let session_id = ctx.open_session(&server, None).await;
    let order_id = ctx.create_order(&server, &session_id, "1day", 15_000).await;
    let body: serde_json::Value = server
        .post("/payment/success")
        .json(&fixtures::payment_success(&order_id, 15_000))
        .await
        .json();
    let code = body["voucher_code"].as_str().unwrap().to_string();

    let response = server
        .post("/voucher/redeem")
        .json(&serde_json::json!({ "code": code }))
        .await;
    response.assert_status_ok();
    let voucher: serde_json::Value = response.json();
    assert_eq!(voucher["status"], "used");
    assert!(voucher["used_at"].is_string());

    let response = server
        .post("/voucher/redeem")
        .json(&serde_json::json!({ "code": code }))
        .await;
    assert_eq!(response.status_code(), 409);
}

/// Catalog lists the four packages in display order
#[tokio::test]
async fn test_packages_catalog() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.get("/packages").await;
    response.assert_status_ok();

    let packages: Vec<serde_json::Value> = response.json();
    let ids: Vec<&str> = packages.iter().map(|p| p["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["1hour", "1day", "3days", "1week"]);
    assert_eq!(packages[1]["price"], 15_000);
}
