//! HTTP middleware for the payments service.
//!
//! Much smaller than the web process: no sessions, no CSP, no rate
//! limiting. The function endpoints are server-to-server only and are
//! guarded by a bearer service key; the webhook endpoint authenticates
//! by signature instead and stays outside this middleware.

pub mod auth;

pub use auth::require_service_key;
