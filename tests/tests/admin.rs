//! Tests for the admin surface.

use axum::http::StatusCode;
use integration_tests::{fixtures, setup::TestContext};
use std::future::IntoFuture;

fn bearer() -> String {
    format!("Bearer {}", fixtures::TEST_ADMIN_TOKEN)
}

#[tokio::test]
async fn test_admin_requires_token() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server
        .get("/admin/settings")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    server
        .get("/admin/settings")
        .add_header("Authorization", "Bearer wrong-token")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    server
        .get("/admin/settings")
        .add_header("Authorization", &bearer())
        .await
        .assert_status_ok();

    // The alternative header works too
    server
        .get("/admin/stats")
        .add_header("X-Admin-Token", fixtures::TEST_ADMIN_TOKEN)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_admin_disabled_without_token() {
    let ctx = TestContext::with_config(|config| config.admin_token = None);
    let server = ctx.server();

    server
        .get("/admin/settings")
        .add_header("Authorization", &bearer())
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

/// Settings are persisted to the env file and returned masked
#[tokio::test]
async fn test_update_settings_writes_env_file() {
    let ctx = TestContext::new();
    let server = ctx.server();
    std::fs::write(&ctx.env_file, "# gardens\nWHATSAPP_API_TOKEN=old\nPORT=8080\n").unwrap();

    let response = server
        .put("/admin/settings")
        .add_header("Authorization", &bearer())
        .json(&serde_json::json!({
            "whatsapp_api_token": "tok-123456789",
            "mikpos_base_url": "https://billing.gardens.test"
        }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["restart_required"], true);

    let written = std::fs::read_to_string(&ctx.env_file).unwrap();
    assert!(written.starts_with("# gardens\n"));
    assert!(written.contains("WHATSAPP_API_TOKEN=tok-123456789"));
    assert!(!written.contains("WHATSAPP_API_TOKEN=old"));
    assert!(written.contains("MIKPOS_BASE_URL=https://billing.gardens.test"));
    assert!(written.contains("PORT=8080"));

    let settings: serde_json::Value = server
        .get("/admin/settings")
        .add_header("Authorization", &bearer())
        .await
        .json();
    assert_eq!(settings["whatsapp_api_token"], "*********6789");
    assert_eq!(settings["mikpos_base_url"], "https://billing.gardens.test");
}

/// Concurrent updates touching different keys both land in the env file
#[tokio::test]
async fn test_concurrent_settings_updates_keep_both_keys() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let auth = bearer();
    let (a, b) = tokio::join!(
        server
            .put("/admin/settings")
            .add_header("Authorization", &auth)
            .json(&serde_json::json!({ "whatsapp_sender": "6281100000001" }))
            .into_future(),
        server
            .put("/admin/settings")
            .add_header("Authorization", &auth)
            .json(&serde_json::json!({ "mikrotik_host": "10.5.50.1" }))
            .into_future(),
    );
    a.assert_status_ok();
    b.assert_status_ok();

    let written = std::fs::read_to_string(&ctx.env_file).unwrap();
    assert!(written.contains("WHATSAPP_SENDER=6281100000001"));
    assert!(written.contains("MIKROTIK_HOST=10.5.50.1"));
}

#[tokio::test]
async fn test_update_settings_rejects_empty_and_invalid() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server
        .put("/admin/settings")
        .add_header("Authorization", &bearer())
        .json(&serde_json::json!({}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .put("/admin/settings")
        .add_header("Authorization", &bearer())
        .json(&serde_json::json!({ "whatsapp_api_url": "not a url" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .put("/admin/settings")
        .add_header("Authorization", &bearer())
        .content_type("application/json")
        .bytes(b"[1, 2".to_vec().into())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    assert!(!ctx.env_file.exists());
}

#[tokio::test]
async fn test_stats_counts_entities() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let session_id = ctx.open_session(&server, None).await;
    ctx.create_order(&server, &session_id, "1day", 15_000).await;

    let response = server
        .get("/admin/stats")
        .add_header("Authorization", &bearer())
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["store"]["sessions"], 1);
    assert_eq!(body["store"]["orders_pending"], 1);
    assert!(body["metrics"].is_object());
}

#[tokio::test]
async fn test_messaging_test_sends_message() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/admin/messaging/test")
        .add_header("Authorization", &bearer())
        .json(&serde_json::json!({ "phone": "0812-3456-7890" }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["connected"], true);
    assert_eq!(body["message_sent"], true);
    assert_eq!(ctx.messenger.sent()[0].phone, "6281234567890");
}

#[tokio::test]
async fn test_messaging_test_reports_disconnected() {
    let ctx = TestContext::new();
    let server = ctx.server();
    ctx.messenger.set_should_fail(true);

    let response = server
        .post("/admin/messaging/test")
        .add_header("Authorization", &bearer())
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["connected"], false);
    assert!(body.get("message_sent").is_none());
}
