//! Integration tests for idea upload, the feed, and interactions.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The web server running (cargo run -p idea-hub-web)
//!
//! Run with: cargo test -p idea-hub-integration-tests -- --ignored

use std::sync::atomic::{AtomicUsize, Ordering};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, redirect};
use uuid::Uuid;

const PASSWORD: &str = "integration-pass-1";

// Octet range disjoint from the other test binaries, which share the
// server's rate-limit state.
static NEXT_IP: AtomicUsize = AtomicUsize::new(64);

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

/// Test helper: sign up a fresh account and pick a role. Returns the username.
async fn sign_up_with_role(client: &Client, role: &str) -> String {
    let base_url = web_base_url();
    let tag = Uuid::new_v4().simple().to_string();
    let email = format!("it-{tag}@example.com");

    let resp = client
        .post(format!("{base_url}/auth/signup"))
        .form(&[("email", email.as_str()), ("username", tag.as_str()), ("password", PASSWORD)])
        .send()
        .await
        .expect("Failed to sign up");
    assert_eq!(location(&resp), "/auth/role", "sign-up should reach the role picker");

    client
        .post(format!("{base_url}/auth/role"))
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
            ("tags", "integration, testing"),
            ("ownership_mode", ownership_mode),
        ])
        .send()
        .await
        .expect("Failed to publish idea");

    let target = location(&resp);
    assert!(
        target.starts_with("/ideas/") && target.ends_with("?success=published"),
        "unexpected upload redirect: {target}"
    );
    target.replace("?success=published", "")
}

// =============================================================================
// Feed Tests
// =============================================================================

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_feed_page_loads_for_anonymous_visitors() {
    let client = client();

    let resp = client
        .get(web_base_url())
        .send()
        .await
        .expect("Failed to load feed");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read feed body");
    assert!(body.contains("Idea-HUB"));
    assert!(body.contains("feed-filters"));
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_feed_accepts_filter_parameters() {
    let client = client();
    let base_url = web_base_url();

    for query in [
        "?sort=oldest",
        "?status=available",
        "?status=minted&sort=newest",
        "?tag=integration",
    ] {
        let resp = client
            .get(format!("{base_url}/{query}"))
            .send()
            .await
            .expect("Failed to load filtered feed");
        assert_eq!(resp.status(), StatusCode::OK, "feed rejected {query}");
    }
}

// =============================================================================
// Upload Tests
// =============================================================================

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_upload_requires_creator_role() {
    let client = client();
    sign_up_with_role(&client, "investor").await;

    let resp = client
        .post(format!("{}/upload", web_base_url()))
        .form(&[
            ("title", "Investor idea"),
            ("description", "Should be rejected."),
            ("tags", ""),
            ("ownership_mode", "forsale"),
        ])
        .send()
        .await
        .expect("Failed to submit upload");

    assert_eq!(location(&resp), "/?error=creators_only");
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_upload_rejects_missing_fields() {
    let client = client();
    sign_up_with_role(&client, "creator").await;

    let resp = client
        .post(format!("{}/upload", web_base_url()))
        .form(&[
            ("title", "   "),
            ("description", ""),
            ("tags", ""),
            ("ownership_mode", "forsale"),
        ])
        .send()
        .await
        .expect("Failed to submit upload");

    assert_eq!(location(&resp), "/upload?error=missing_fields");
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_upload_and_view_idea() {
    let client = client();
    let username = sign_up_with_role(&client, "creator").await;

    let title = format!("Integration idea {}", Uuid::new_v4().simple());
    let path = publish_idea(&client, &title, "forsale").await;

    let resp = client
        .get(format!("{}{path}", web_base_url()))
        .send()
        .await
        .expect("Failed to load idea detail");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read detail body");
    assert!(body.contains(&title));
    assert!(body.contains(&username), "detail page should credit the author");
}

// =============================================================================
// Interaction Tests
// =============================================================================

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_upvote_toggles() {
    let base_url = web_base_url();
    let creator = client();
    sign_up_with_role(&creator, "creator").await;
    let path = publish_idea(&creator, "Upvote target", "showcase").await;

    let voter = client();
    sign_up_with_role(&voter, "investor").await;

    // First post upvotes, second removes the upvote; both bounce back
    for _ in 0..2 {
        let resp = voter
            .post(format!("{base_url}{path}/upvote"))
            .form(&[("next", path.as_str())])
            .send()
            .await
            .expect("Failed to upvote");
        assert!(resp.status().is_redirection());
        assert_eq!(location(&resp), path);
    }
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_comment_appears_on_detail_page() {
    let base_url = web_base_url();
    let creator = client();
    sign_up_with_role(&creator, "creator").await;
    let path = publish_idea(&creator, "Comment target", "showcase").await;

    let commenter = client();
    sign_up_with_role(&commenter, "investor").await;

    let text = format!("Looks promising ({})", Uuid::new_v4().simple());
    let resp = commenter
        .post(format!("{base_url}{path}/comments"))
        .form(&[("content", text.as_str())])
        .send()
        .await
        .expect("Failed to comment");
    assert_eq!(location(&resp), format!("{path}#comments"));

    let body = commenter
        .get(format!("{base_url}{path}"))
        .send()
        .await
        .expect("Failed to load detail")
        .text()
        .await
        .expect("Failed to read detail body");
    assert!(body.contains(&text));
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_empty_comment_rejected() {
    let base_url = web_base_url();
    let client = client();
    sign_up_with_role(&client, "creator").await;
    let path = publish_idea(&client, "Silence", "showcase").await;

    let resp = client
        .post(format!("{base_url}{path}/comments"))
        .form(&[("content", "   ")])
        .send()
        .await
        .expect("Failed to comment");

    assert_eq!(location(&resp), format!("{path}?error=empty_comment"));
}

// =============================================================================
// Edit & Remix Tests
// =============================================================================

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_edit_page_hidden_from_non_owners() {
    let base_url = web_base_url();
    let owner = client();
    sign_up_with_role(&owner, "creator").await;
    let path = publish_idea(&owner, "Private draft", "forsale").await;

    let other = client();
    sign_up_with_role(&other, "creator").await;

    let resp = other
        .get(format!("{base_url}{path}/edit"))
        .send()
        .await
        .expect("Failed to request edit page");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_remix_creates_linked_idea() {
    let base_url = web_base_url();
    let original_author = client();
    sign_up_with_role(&original_author, "creator").await;
    let source_path = publish_idea(&original_author, "Remix source", "showcase").await;

    let remixer = client();
    sign_up_with_role(&remixer, "creator").await;

    let resp = remixer
        .post(format!("{base_url}{source_path}/remix"))
        .form(&[
            ("title", "Remix source, but better"),
            ("changes", "Swapped the business model."),
            ("tags", "remix"),
            ("ownership_mode", "forsale"),
        ])
        .send()
        .await
        .expect("Failed to remix");

    let target = location(&resp);
    assert!(
        target.starts_with("/ideas/") && target.contains("success="),
        "unexpected remix redirect: {target}"
    );
    assert_ne!(target.split('?').next(), Some(source_path.as_str()));

    // The remix detail page links back to the source
    let body = remixer
        .get(format!("{base_url}{}", target.split('?').next().unwrap_or_default()))
        .send()
        .await
        .expect("Failed to load remix detail")
        .text()
        .await
        .expect("Failed to read remix body");
    assert!(body.contains("Remix source"));
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_remix_requires_creator_role() {
    let base_url = web_base_url();
    let owner = client();
    sign_up_with_role(&owner, "creator").await;
    let path = publish_idea(&owner, "No investor remixes", "showcase").await;

    let investor = client();
    sign_up_with_role(&investor, "investor").await;

    let resp = investor
        .post(format!("{base_url}{path}/remix"))
        .form(&[
            ("title", "Stolen"),
            ("changes", "Nothing."),
            ("tags", ""),
            ("ownership_mode", "forsale"),
        ])
        .send()
        .await
        .expect("Failed to submit remix");

    assert_eq!(location(&resp), format!("{path}?error=creators_only"));
}
