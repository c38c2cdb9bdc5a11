//! Integration tests for sign-up, login, and role selection.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The web server running (cargo run -p idea-hub-web)
//!
//! Run with: cargo test -p idea-hub-integration-tests -- --ignored
//!
//! Accounts are created with random emails and left behind afterwards.

use std::sync::atomic::{AtomicUsize, Ordering};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, redirect};
use uuid::Uuid;

/// Password used for every throwaway account.
const PASSWORD: &str = "integration-pass-1";

// Octet range disjoint from the other test binaries, which share the
// server's rate-limit state.
static NEXT_IP: AtomicUsize = AtomicUsize::new(1);

/// Base URL for the web server (configurable via environment).
fn web_base_url() -> String {
    std::env::var("WEB_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Client with a cookie jar and redirects disabled, so tests can assert on
/// individual redirect hops.
///
/// The server keys rate limits on `X-Forwarded-For`, so every client gets a
/// distinct TEST-NET address; parallel tests would otherwise exhaust the
/// strict auth limiter from one shared loopback bucket.
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

/// Random credentials that satisfy the sign-up validators.
fn unique_credentials() -> (String, String) {
    let tag = Uuid::new_v4().simple().to_string();
    (format!("it-{tag}@example.com"), tag)
}

/// Where a redirect points, or empty if the response is not a redirect.
fn location(resp: &reqwest::Response) -> String {
    resp.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Test helper: sign up a fresh account on the given client.
async fn sign_up(client: &Client, email: &str, username: &str) -> reqwest::Response {
    client
        .post(format!("{}/auth/signup", web_base_url()))
        .form(&[("email", email), ("username", username), ("password", PASSWORD)])
        .send()
        .await
        .expect("Failed to sign up")
}

// =============================================================================
// Sign-up Flow Tests
// =============================================================================

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_signup_redirects_to_role_picker() {
    let client = client();
    let (email, username) = unique_credentials();

    let resp = sign_up(&client, &email, &username).await;

    assert!(resp.status().is_redirection(), "got: {}", resp.status());
    assert_eq!(location(&resp), "/auth/role");
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_signup_duplicate_email_rejected() {
    let client = client();
    let (email, username) = unique_credentials();

    let resp = sign_up(&client, &email, &username).await;
    assert_eq!(location(&resp), "/auth/role");

    // Same email, different username
    let (_, other_username) = unique_credentials();
    let resp = sign_up(&client, &email, &other_username).await;
    assert_eq!(location(&resp), "/auth?error=email_taken");
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_signup_weak_password_rejected() {
    let client = client();
    let (email, username) = unique_credentials();

    let resp = client
        .post(format!("{}/auth/signup", web_base_url()))
        .form(&[("email", email.as_str()), ("username", username.as_str()), ("password", "short")])
        .send()
        .await
        .expect("Failed to sign up");

    assert_eq!(location(&resp), "/auth?error=weak_password");
}

// =============================================================================
// Role Picker Tests
// =============================================================================

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_role_selection_routes_by_role() {
    let base_url = web_base_url();

    // Creators land on their dashboard
    let creator = client();
    let (email, username) = unique_credentials();
    sign_up(&creator, &email, &username).await;

    let resp = creator
        .post(format!("{base_url}/auth/role"))
        .form(&[("role", "creator")])
        .send()
        .await
        .expect("Failed to set role");
    assert_eq!(location(&resp), "/dashboard/creator");

    // Investors land on the feed
    let investor = client();
    let (email, username) = unique_credentials();
    sign_up(&investor, &email, &username).await;

    let resp = investor
        .post(format!("{base_url}/auth/role"))
        .form(&[("role", "investor")])
        .send()
        .await
        .expect("Failed to set role");
    assert_eq!(location(&resp), "/");
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_role_rejects_unknown_value() {
    let client = client();
    let (email, username) = unique_credentials();
    sign_up(&client, &email, &username).await;

    let resp = client
        .post(format!("{}/auth/role", web_base_url()))
        .form(&[("role", "landlord")])
        .send()
        .await
        .expect("Failed to submit role");

    assert_eq!(location(&resp), "/auth/role?error=invalid_role");
}

// =============================================================================
// Login Tests
// =============================================================================

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_login_and_logout() {
    let base_url = web_base_url();
    let client = client();
    let (email, username) = unique_credentials();
    sign_up(&client, &email, &username).await;

    client
        .post(format!("{base_url}/auth/role"))
        .form(&[("role", "creator")])
        .send()
        .await
        .expect("Failed to set role");

    // Log out, then back in with the same credentials
    let resp = client
        .post(format!("{base_url}/auth/logout"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(location(&resp), "/");

    let resp = client
        .post(format!("{base_url}/auth/login"))
        .form(&[("email", email.as_str()), ("password", PASSWORD)])
        .send()
        .await
        .expect("Failed to log in");

    // Role already picked, so login goes straight to the feed
    assert_eq!(location(&resp), "/");
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_login_wrong_password_rejected() {
    let client = client();
    let (email, username) = unique_credentials();
    sign_up(&client, &email, &username).await;

    let resp = client
        .post(format!("{}/auth/login", web_base_url()))
        .form(&[("email", email.as_str()), ("password", "not-the-password")])
        .send()
        .await
        .expect("Failed to log in");

    assert_eq!(location(&resp), "/auth?error=credentials");
}

// =============================================================================
// Session Gating Tests
// =============================================================================

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_protected_page_redirects_anonymous_to_auth() {
    let client = client();

    let resp = client
        .get(format!("{}/upload", web_base_url()))
        .send()
        .await
        .expect("Failed to request upload page");

    assert!(resp.status().is_redirection());
    assert_eq!(location(&resp), "/auth");
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_status_endpoint_returns_401_for_json_clients() {
    let client = client();

    let resp = client
        .get(format!("{}/profile/status", web_base_url()))
        .header("accept", "application/json")
        .send()
        .await
        .expect("Failed to request status");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_status_endpoint_shape_for_fresh_account() {
    let client = client();
    let (email, username) = unique_credentials();
    sign_up(&client, &email, &username).await;

    let resp = client
        .get(format!("{}/profile/status", web_base_url()))
        .send()
        .await
        .expect("Failed to request status");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.expect("Failed to parse status JSON");
    assert_eq!(body.get("is_premium"), Some(&serde_json::Value::Bool(false)));
    assert_eq!(
        body.get("minted").and_then(serde_json::Value::as_array).map(Vec::len),
        Some(0)
    );
}
