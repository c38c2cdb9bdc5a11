//! Integration tests for the payments service surface.
//!
//! These tests require the payments service running
//! (cargo run -p idea-hub-payments). They exercise the two
//! authentication schemes — the service key on `/functions/*` and the
//! Stripe signature on `/webhooks/stripe` — without a real Stripe key.
//!
//! Run with: cargo test -p idea-hub-integration-tests -- --ignored

use reqwest::{Client, StatusCode};

fn payments_base_url() -> String {
    std::env::var("PAYMENTS_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

fn client() -> Client {
    Client::builder()
        .build()
        .expect("Failed to create HTTP client")
}

// =============================================================================
// Health Checks
// =============================================================================

#[tokio::test]
#[ignore = "Requires running payments service"]
async fn test_health_endpoint() {
    let resp = client()
        .get(format!("{}/health", payments_base_url()))
        .send()
        .await
        .expect("Failed to request health");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("Failed to read body"), "ok");
}

#[tokio::test]
#[ignore = "Requires running payments service and database"]
async fn test_readiness_endpoint() {
    let resp = client()
        .get(format!("{}/health/ready", payments_base_url()))
        .send()
        .await
        .expect("Failed to request readiness");

    assert_eq!(resp.status(), StatusCode::OK);
}

// =============================================================================
// Service Key Authentication
// =============================================================================

#[tokio::test]
#[ignore = "Requires running payments service"]
async fn test_functions_reject_missing_service_key() {
    let base_url = payments_base_url();
    let client = client();

    for endpoint in [
        "create-checkout",
        "create-wallet-purchase",
        "create-partnership-payment",
        "create-payout-session",
    ] {
        let resp = client
            .post(format!("{base_url}/functions/{endpoint}"))
            .json(&serde_json::json!({}))
            .send()
            .await
            .expect("Failed to call function");

        assert_eq!(
            resp.status(),
            StatusCode::UNAUTHORIZED,
            "{endpoint} should require the service key"
        );
    }
}

#[tokio::test]
#[ignore = "Requires running payments service"]
async fn test_functions_reject_wrong_service_key() {
    let resp = client()
        .post(format!("{}/functions/create-checkout", payments_base_url()))
        .bearer_auth("not-the-service-key")
        .json(&serde_json::json!({"user_id": 1, "email": "x@example.com", "plan": "monthly"}))
        .send()
        .await
        .expect("Failed to call function");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Webhook Signature Verification
// =============================================================================

#[tokio::test]
#[ignore = "Requires running payments service"]
async fn test_webhook_rejects_unsigned_delivery() {
    let payload = serde_json::json!({
        "id": "evt_test",
        "type": "checkout.session.completed",
        "data": {"object": {"id": "cs_test", "metadata": {}}}
    });

    let resp = client()
        .post(format!("{}/webhooks/stripe", payments_base_url()))
        .json(&payload)
        .send()
        .await
        .expect("Failed to post webhook");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running payments service"]
async fn test_webhook_rejects_forged_signature() {
    let payload = r#"{"id":"evt_test","type":"account.updated","data":{"object":{"id":"acct_1"}}}"#;

    let resp = client()
        .post(format!("{}/webhooks/stripe", payments_base_url()))
        .header("Stripe-Signature", "t=1735689600,v1=deadbeef")
        .header("content-type", "application/json")
        .body(payload)
        .send()
        .await
        .expect("Failed to post webhook");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
