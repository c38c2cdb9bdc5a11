//! Integration tests for Idea-HUB.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! docker compose up -d db
//! cargo run -p idea-hub-cli -- migrate
//!
//! # Start both servers
//! cargo run -p idea-hub-web &
//! cargo run -p idea-hub-payments &
//!
//! # Run the ignored integration tests
//! cargo test -p idea-hub-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `WEB_BASE_URL` - Marketplace site (default `http://localhost:3000`)
//! - `PAYMENTS_BASE_URL` - Payments service (default `http://localhost:3001`)
//!
//! # Test Categories
//!
//! - `web_auth` - Sign-up, login, role selection, session handling
//! - `web_ideas` - Upload, feed, upvotes, comments, remixing
//! - `web_partnership_wallet` - Partnership wizard gating, wallet, pricing
//! - `payments_service` - Health checks, bearer auth, webhook signatures
//! - `web_content_store` - Markdown content loading (no server required)
//! - `web_feed_filters` - Feed query parsing (no server required)
//!
//! Tests that talk to a server are `#[ignore]`d so `cargo test` stays green
//! without one; sign-up based tests create throwaway accounts with random
//! emails and leave them behind.

#![cfg_attr(not(test), forbid(unsafe_code))]
