//! HTTP route handlers for the marketplace.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Idea feed
//! GET  /health                 - Health check
//!
//! # Ideas
//! GET  /upload                 - Upload form
//! POST /upload                 - Publish an idea
//! GET  /ideas/{id}             - Idea detail
//! POST /ideas/{id}/upvote      - Toggle upvote
//! POST /ideas/{id}/comments    - Add a comment
//! GET  /ideas/{id}/edit        - Edit form
//! POST /ideas/{id}/edit        - Update idea
//! POST /ideas/{id}/delete      - Delete idea
//! GET  /ideas/{id}/remix       - Remix form
//! POST /ideas/{id}/remix       - Publish remix
//! POST /ideas/{id}/buy         - Start an idea purchase checkout
//!
//! # Partnership wizard
//! GET  /ideas/{id}/partner         - NDA step
//! POST /ideas/{id}/partner/nda     - Sign the NDA
//! GET  /ideas/{id}/partner/payment - Access fee step
//! GET  /ideas/{id}/partner/message - Message step
//! POST /ideas/{id}/partner/message - Submit the request
//!
//! # Auth
//! GET  /auth                   - Login / sign-up page
//! POST /auth/signup            - Create account
//! POST /auth/login             - Login action
//! POST /auth/logout            - Logout action
//! GET  /auth/role              - Role picker
//! POST /auth/role              - Set role
//!
//! # Profile
//! GET  /profile                - Own profile
//! POST /profile                - Update bio and wallet address
//! POST /profile/avatar         - Upload avatar
//! GET  /profile/status         - Premium and minted state (JSON)
//!
//! # Dashboards
//! GET  /dashboard/creator      - Creator dashboard
//! GET  /dashboard/investor     - Investor dashboard
//!
//! # Wallet (creators only)
//! GET  /wallet                 - Balance and history
//! POST /wallet/withdraw        - Request a withdrawal
//! POST /wallet/payout-setup    - Start Stripe Connect payouts
//!
//! # Pricing
//! GET  /pricing                - Premium plans
//! POST /pricing/checkout       - Start a plan checkout
//!
//! # Content
//! GET  /pages/{slug}           - Markdown content page
//! ```

pub mod auth;
pub mod dashboard;
pub mod home;
pub mod ideas;
pub mod pages;
pub mod partnership;
pub mod pricing;
pub mod profile;
pub mod wallet;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use idea_hub_core::Role;

use crate::db::UserRepository;
use crate::error::AppError;
use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::models::{CurrentUser, User};
use crate::state::AppState;

// =============================================================================
// Shared View Types
// =============================================================================

/// Viewer data for the shared page chrome (navbar, footer).
///
/// Role and premium status are resolved from the database per request so
/// webhook-driven changes (plan purchases, idea sales) show up without a
/// re-login.
#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub id: i32,
    pub username: String,
    pub avatar_url: Option<String>,
    pub role: Option<Role>,
    pub is_premium: bool,
}

impl ViewerContext {
    /// Whether the viewer has chosen the creator role.
    #[must_use]
    pub fn is_creator(&self) -> bool {
        self.role == Some(Role::Creator)
    }

    /// Whether the viewer has chosen the investor role.
    #[must_use]
    pub fn is_investor(&self) -> bool {
        self.role == Some(Role::Investor)
    }
}

impl From<&User> for ViewerContext {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.as_i32(),
            username: user.username.to_string(),
            avatar_url: user.avatar_url.clone(),
            role: user.role,
            is_premium: user.is_premium,
        }
    }
}

/// Resolve the viewer's chrome data from their session identity.
///
/// A stale session (user row deleted) resolves to a logged-out chrome
/// rather than an error.
pub async fn viewer_context(
    state: &AppState,
    current: Option<&CurrentUser>,
) -> Result<Option<ViewerContext>, AppError> {
    let Some(current) = current else {
        return Ok(None);
    };

    let users = UserRepository::new(state.pool());
    Ok(users.get_by_id(current.id).await?.map(|u| ViewerContext::from(&u)))
}

// =============================================================================
// Routers
// =============================================================================

/// Create the auth routes router.
///
/// The whole area sits behind the strict auth rate limiter.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::auth_page))
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/role", get(auth::role_page).post(auth::set_role))
        .layer(auth_rate_limiter())
}

/// Create the idea routes router (nested under `/ideas`).
pub fn idea_routes() -> Router<AppState> {
    // Interaction endpoints sit behind the API rate limiter; plain page
    // views do not.
    let interactions = Router::new()
        .route("/{id}/upvote", post(ideas::upvote))
        .route("/{id}/comments", post(ideas::add_comment))
        .route("/{id}/buy", post(ideas::buy))
        .layer(api_rate_limiter());

    Router::new()
        .route("/{id}", get(ideas::show))
        .route("/{id}/edit", get(ideas::edit_page).post(ideas::update))
        .route("/{id}/delete", post(ideas::delete))
        .route("/{id}/remix", get(ideas::remix_page).post(ideas::remix))
        .route("/{id}/partner", get(partnership::nda_page))
        .route("/{id}/partner/nda", post(partnership::sign_nda))
        .route("/{id}/partner/payment", get(partnership::payment_page))
        .route(
            "/{id}/partner/message",
            get(partnership::message_page).post(partnership::submit),
        )
        .merge(interactions)
}

/// Create the profile routes router.
///
/// The avatar route raises the body limit above axum's 2 MB default;
/// the media store enforces the real per-file cap.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show).post(profile::update))
        .route(
            "/avatar",
            post(profile::upload_avatar)
                .layer(DefaultBodyLimit::max(crate::services::storage::MAX_AVATAR_BYTES + 1024)),
        )
        .route("/status", get(profile::status))
}

/// Create the wallet routes router.
///
/// Withdrawal and payout actions sit behind the API rate limiter.
pub fn wallet_routes() -> Router<AppState> {
    let actions = Router::new()
        .route("/withdraw", post(wallet::withdraw))
        .route("/payout-setup", post(wallet::payout_setup))
        .layer(api_rate_limiter());

    Router::new().route("/", get(wallet::show)).merge(actions)
}

/// Create all routes for the web process.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Idea feed
        .route("/", get(home::feed))
        // Upload form
        .route("/upload", get(ideas::upload_page).post(ideas::upload))
        // Idea routes
        .nest("/ideas", idea_routes())
        // Auth routes
        .nest("/auth", auth_routes())
        // Profile routes
        .nest("/profile", profile_routes())
        // Dashboards
        .route("/dashboard/creator", get(dashboard::creator))
        .route("/dashboard/investor", get(dashboard::investor))
        // Wallet routes
        .nest("/wallet", wallet_routes())
        // Pricing
        .route("/pricing", get(pricing::index))
        .route(
            "/pricing/checkout",
            post(pricing::checkout).layer(api_rate_limiter()),
        )
        // Content pages
        .route("/pages/{slug}", get(pages::show))
}
