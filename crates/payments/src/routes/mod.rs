//! Route handlers for the payments service.
//!
//! Two surfaces, two authentication schemes:
//! - `/functions/*` - JSON endpoints for the web process, behind the
//!   service key
//! - `/webhooks/stripe` - Stripe deliveries, verified by signature

use axum::{Router, middleware::from_fn_with_state, routing::post};

use crate::middleware::require_service_key;
use crate::state::AppState;

pub mod functions;
pub mod webhooks;

/// Create the function routes router (service key required).
pub fn function_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/create-checkout", post(functions::create_checkout))
        .route(
            "/create-wallet-purchase",
            post(functions::create_wallet_purchase),
        )
        .route(
            "/create-partnership-payment",
            post(functions::create_partnership_payment),
        )
        .route(
            "/create-payout-session",
            post(functions::create_payout_session),
        )
        .layer(from_fn_with_state(state.clone(), require_service_key))
}

/// Create all routes for the payments process.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/functions", function_routes(state))
        .route("/webhooks/stripe", post(webhooks::stripe_webhook))
}
