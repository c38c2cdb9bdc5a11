//! Integration tests for partnership wizard gating, the wallet, and pricing.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The web server running (cargo run -p idea-hub-web)
//!
//! Run with: cargo test -p idea-hub-integration-tests -- --ignored
//!
//! Partnership-mode uploads require premium, which only a Stripe webhook
//! can grant, so the wizard tests cover the gating around the flow rather
//! than a completed request.

use std::sync::atomic::{AtomicUsize, Ordering};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, redirect};
use uuid::Uuid;

const PASSWORD: &str = "integration-pass-1";

// Octet range disjoint from the other test binaries, which share the
// server's rate-limit state.
static NEXT_IP: AtomicUsize = AtomicUsize::new(128);

fn web_base_url() -> String {
    std::env::var("WEB_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Client with a cookie jar, redirects disabled, and its own rate-limit
/// bucket (the server keys limits on `X-Forwarded-For`).
fn client() -> Client {
    let octet = NEXT_IP.fetch_add(1, Ordering::Relaxed) % 254 + 1;
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_str(&format!("203.0.113.{octet}")).expect("valid header value"),
    );

    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

fn location(resp: &reqwest::Response) -> String {
    resp.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Test helper: sign up a fresh account without picking a role.
async fn sign_up(client: &Client) -> String {
    let base_url = web_base_url();
    let tag = Uuid::new_v4().simple().to_string();
    let email = format!("it-{tag}@example.com");

    let resp = client
        .post(format!("{base_url}/auth/signup"))
        .form(&[("email", email.as_str()), ("username", tag.as_str()), ("password", PASSWORD)])
        .send()
        .await
        .expect("Failed to sign up");
    assert_eq!(location(&resp), "/auth/role");

    tag
}

/// Test helper: sign up and pick a role.
async fn sign_up_with_role(client: &Client, role: &str) -> String {
    let tag = sign_up(client).await;
    client
        .post(format!("{}/auth/role", web_base_url()))
        .form(&[("role", role)])
        .send()
        .await
        .expect("Failed to set role");
    tag
}

/// Test helper: publish an idea and return its detail path (`/ideas/{id}`).
async fn publish_idea(client: &Client, title: &str, ownership_mode: &str) -> String {
    let resp = client
        .post(format!("{}/upload", web_base_url()))
        .form(&[
            ("title", title),
            ("description", "Posted by an integration test."),
            ("tags", "integration"),
            ("ownership_mode", ownership_mode),
        ])
        .send()
        .await
        .expect("Failed to publish idea");

    location(&resp).replace("?success=published", "")
}

// =============================================================================
// Partnership Wizard Gating
// =============================================================================

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_partner_wizard_requires_login() {
    let anonymous = client();

    let resp = anonymous
        .get(format!("{}/ideas/1/partner", web_base_url()))
        .send()
        .await
        .expect("Failed to request NDA page");

    assert_eq!(location(&resp), "/auth");
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_partner_wizard_rejects_non_partnership_ideas() {
    let base_url = web_base_url();
    let creator = client();
    sign_up_with_role(&creator, "creator").await;
    let path = publish_idea(&creator, "For sale, not partnership", "forsale").await;

    let investor = client();
    sign_up_with_role(&investor, "investor").await;

    let resp = investor
        .get(format!("{base_url}{path}/partner"))
        .send()
        .await
        .expect("Failed to request NDA page");

    assert_eq!(location(&resp), format!("{path}?error=not_partnership"));
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_partner_message_step_needs_a_signed_nda() {
    // Jumping straight to a later wizard step without the session-held
    // NDA bounces back to the start. The idea itself fails the
    // partnership check first for a forsale idea, so assert on that hop.
    let base_url = web_base_url();
    let creator = client();
    sign_up_with_role(&creator, "creator").await;
    let path = publish_idea(&creator, "Skip-ahead target", "forsale").await;

    let investor = client();
    sign_up_with_role(&investor, "investor").await;

    let resp = investor
        .get(format!("{base_url}{path}/partner/message"))
        .send()
        .await
        .expect("Failed to request message page");

    assert!(resp.status().is_redirection());
    assert_eq!(location(&resp), format!("{path}?error=not_partnership"));
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_partnership_upload_requires_premium() {
    let client = client();
    sign_up_with_role(&client, "creator").await;

    let resp = client
        .post(format!("{}/upload", web_base_url()))
        .form(&[
            ("title", "Protected idea"),
            ("description", "Needs premium."),
            ("tags", ""),
            ("ownership_mode", "partnership"),
        ])
        .send()
        .await
        .expect("Failed to submit upload");

    assert_eq!(location(&resp), "/upload?error=premium_required");
}

// =============================================================================
// Wallet Tests
// =============================================================================

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_wallet_hidden_from_investors() {
    let client = client();
    sign_up_with_role(&client, "investor").await;

    let resp = client
        .get(format!("{}/wallet", web_base_url()))
        .send()
        .await
        .expect("Failed to request wallet");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_wallet_waits_for_role_selection() {
    let client = client();
    sign_up(&client).await;

    let resp = client
        .get(format!("{}/wallet", web_base_url()))
        .send()
        .await
        .expect("Failed to request wallet");

    assert_eq!(location(&resp), "/auth/role");
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_wallet_page_shows_empty_balance() {
    let client = client();
    sign_up_with_role(&client, "creator").await;

    let resp = client
        .get(format!("{}/wallet", web_base_url()))
        .send()
        .await
        .expect("Failed to load wallet");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read wallet body");
    assert!(body.contains("$0.00"), "fresh wallet should show a zero balance");
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_withdrawal_enforces_minimum() {
    let client = client();
    sign_up_with_role(&client, "creator").await;

    let resp = client
        .post(format!("{}/wallet/withdraw", web_base_url()))
        .form(&[
            ("amount", "5"),
            ("account_holder_name", "Integration Test"),
            ("bank_name", "Test Bank"),
            ("account_number", "000123456789"),
            ("routing_number", "110000000"),
        ])
        .send()
        .await
        .expect("Failed to submit withdrawal");

    assert_eq!(location(&resp), "/wallet?error=minimum");
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_withdrawal_rejects_insufficient_balance() {
    let client = client();
    sign_up_with_role(&client, "creator").await;

    // Above the minimum, but the fresh wallet holds nothing
    let resp = client
        .post(format!("{}/wallet/withdraw", web_base_url()))
        .form(&[
            ("amount", "10"),
            ("account_holder_name", "Integration Test"),
            ("bank_name", "Test Bank"),
            ("account_number", "000123456789"),
            ("routing_number", "110000000"),
        ])
        .send()
        .await
        .expect("Failed to submit withdrawal");

    assert_eq!(location(&resp), "/wallet?error=insufficient_balance");
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_withdrawal_rejects_malformed_amounts() {
    let client = client();
    sign_up_with_role(&client, "creator").await;

    for amount in ["abc", "10.123", "-5"] {
        let resp = client
            .post(format!("{}/wallet/withdraw", web_base_url()))
            .form(&[
                ("amount", amount),
                ("account_holder_name", "Integration Test"),
                ("bank_name", "Test Bank"),
                ("account_number", "000123456789"),
                ("routing_number", "110000000"),
            ])
            .send()
            .await
            .expect("Failed to submit withdrawal");

        assert_eq!(
            location(&resp),
            "/wallet?error=invalid_amount",
            "amount {amount} should be rejected"
        );
    }
}

// =============================================================================
// Pricing Tests
// =============================================================================

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_pricing_page_is_public() {
    let resp = client()
        .get(format!("{}/pricing", web_base_url()))
        .send()
        .await
        .expect("Failed to load pricing");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read pricing body");
    assert!(body.contains("Lifetime"));
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_plan_checkout_requires_login() {
    let resp = client()
        .post(format!("{}/pricing/checkout", web_base_url()))
        .form(&[("plan", "monthly")])
        .send()
        .await
        .expect("Failed to submit checkout");

    assert_eq!(location(&resp), "/auth");
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_plan_checkout_rejects_unknown_plans() {
    let client = client();
    sign_up_with_role(&client, "creator").await;

    let resp = client
        .post(format!("{}/pricing/checkout", web_base_url()))
        .form(&[("plan", "weekly")])
        .send()
        .await
        .expect("Failed to submit checkout");

    assert_eq!(location(&resp), "/pricing?error=invalid_plan");
}
