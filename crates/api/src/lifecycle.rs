//! Voucher lifecycle orchestration.
//!
//! Handlers stay thin; anything that spans the store and the outbound
//! integrations lives here. Outbound calls are made after the store
//! transition has committed, and a failed call is queued in the outbox
//! instead of failing the request.

use chrono::{DateTime, Utc};
use gardens_core::{
    verify_signature, Error, Order, Package, PaymentInfo, Result, SignatureErrorCode, Voucher,
    WebhookPayload,
};
use messaging::Delivery;
use std::time::Instant;
use store::OutboxKind;
use telemetry::metrics;
use tracing::info;
use url::Url;

use crate::response::{PaymentSuccessResponse, WebhookResponse};
use crate::state::AppState;

/// Verifies, de-duplicates and dispatches one MikPos webhook delivery.
///
/// A delivery that fails after the replay check is forgotten again, so
/// MikPos can retry it with the same signature.
pub async fn handle_webhook(
    state: &AppState,
    body: &[u8],
    signature: Option<&str>,
    now: DateTime<Utc>,
) -> Result<WebhookResponse> {
    verify_signature(body, signature, &state.config.webhook_secret)?;

    let payload = WebhookPayload::parse(body)?;
    payload.check_freshness(now, state.config.replay_tolerance_secs)?;

    let Some(sig) = signature else {
        return dispatch_webhook(state, &payload, now);
    };
    if !state.replay_guard.first_seen(sig).await {
        return Err(Error::signature(
            SignatureErrorCode::Replayed,
            "webhook delivery already processed",
        ));
    }

    let result = dispatch_webhook(state, &payload, now);
    if result.is_err() {
        state.replay_guard.forget(sig).await;
    }
    result
}

fn dispatch_webhook(
    state: &AppState,
    payload: &WebhookPayload,
    now: DateTime<Utc>,
) -> Result<WebhookResponse> {
    let action = payload.action()?;
    if !action.creates_session() {
        let notice = payload.payment.clone().unwrap_or_default();
        info!(
            action = action.as_str(),
            order_id = ?notice.order_id,
            status = ?notice.status,
            transaction_id = ?notice.transaction_id,
            "Payment notification acknowledged"
        );
        return Ok(WebhookResponse::acknowledged());
    }

    let input = payload.to_new_session()?;
    let profile = input.requested_profile;
    let session = state.store.create_session(input, now);
    let redirect_url =
        match build_redirect_url(&state.config.storefront_url, &session.id, profile) {
            Ok(url) => url,
            Err(e) => {
                state.store.delete_session(&session.id);
                return Err(e);
            }
        };

    info!(
        action = action.as_str(),
        session_id = %session.id,
        mac = %session.mac_address,
        "Hotspot purchase session created"
    );

    Ok(WebhookResponse::redirect(
        redirect_url,
        session.id.clone(),
        session.expires_in_secs(now),
    ))
}

/// Completes a paid order, issues its voucher and notifies both parties.
pub async fn complete_payment(
    state: &AppState,
    order_id: &str,
    payment: PaymentInfo,
    now: DateTime<Utc>,
) -> Result<PaymentSuccessResponse> {
    let start = Instant::now();
    let (order, voucher) = state
        .store
        .complete_order_and_issue_voucher(order_id, payment, now)?;
    metrics()
        .payment_latency_ms
        .observe(start.elapsed().as_millis() as u64);

    let return_url = build_return_url(&order.login_url, &voucher.code);

    let whatsapp_sent = notify_customer(state, &order, &voucher, now).await;
    notify_billing(state, &voucher, now).await;

    Ok(PaymentSuccessResponse {
        success: true,
        order_id: order.id,
        voucher_code: voucher.code,
        package_id: voucher.package,
        expires_at: voucher.expires_at,
        whatsapp_sent,
        return_url,
    })
}

/// Marks a pending order failed after the gateway reports a failed payment.
pub fn fail_payment(state: &AppState, order_id: &str, reason: Option<&str>) -> Result<Order> {
    let reason = reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("payment failed");
    state.store.fail_order(order_id, reason)
}

async fn notify_customer(
    state: &AppState,
    order: &Order,
    voucher: &Voucher,
    now: DateTime<Utc>,
) -> bool {
    match state
        .dispatcher
        .send_voucher(&order.customer.whatsapp, voucher)
        .await
    {
        Delivery::Sent => true,
        Delivery::Retry(outbound) => {
            state.store.enqueue_outbox(
                &order.id,
                OutboxKind::WhatsApp {
                    phone: outbound.phone,
                    message: outbound.message,
                },
                now,
            );
            false
        }
        Delivery::Dropped => false,
    }
}

async fn notify_billing(state: &AppState, voucher: &Voucher, now: DateTime<Utc>) {
    if let Delivery::Retry(payload) = state.dispatcher.announce_voucher(voucher).await {
        state.store.enqueue_outbox(
            &voucher.order_id,
            OutboxKind::BillingCallback { payload },
            now,
        );
    }
}

/// `{storefront}/checkout?session=<id>[&profile=<package>]`
pub fn build_redirect_url(
    storefront: &str,
    session_id: &str,
    profile: Option<Package>,
) -> Result<String> {
    let mut url = Url::parse(storefront)
        .map_err(|e| Error::configuration(format!("invalid storefront URL: {}", e)))?;

    url.path_segments_mut()
        .map_err(|_| Error::configuration("storefront URL cannot be a base"))?
        .pop_if_empty()
        .push("checkout");

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("session", session_id);
        if let Some(profile) = profile {
            query.append_pair("profile", profile.as_str());
        }
    }

    Ok(url.into())
}

/// Hotspot login URL with the voucher code as both username and password.
pub fn build_return_url(login_url: &str, code: &str) -> Option<String> {
    let login_url = login_url.trim();
    if login_url.is_empty() {
        return None;
    }
    let mut url = Url::parse(login_url).ok()?;
    url.query_pairs_mut()
        .append_pair("username", code)
        .append_pair("password", code);
    Some(url.into())
}
