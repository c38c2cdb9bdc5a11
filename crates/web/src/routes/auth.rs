//! Authentication route handlers.
//!
//! One combined login / sign-up page, plus the role picker every new
//! account goes through before using the marketplace.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use idea_hub_core::Role;

use crate::db::UserRepository;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

use super::{ViewerContext, viewer_context};

// =============================================================================
// Form Types
// =============================================================================

/// Sign-up form data.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Role picker form data.
#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub role: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Combined login / sign-up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth.html")]
pub struct AuthTemplate {
    pub viewer: Option<ViewerContext>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Role picker page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/role.html")]
pub struct RoleTemplate {
    pub viewer: Option<ViewerContext>,
    pub error: Option<String>,
}

// =============================================================================
// Login / Sign-up Routes
// =============================================================================

/// Display the combined login / sign-up page.
#[instrument(skip(state, current, query))]
pub async fn auth_page(
    State(state): State<AppState>,
    OptionalAuth(current): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Result<AuthTemplate> {
    let viewer = viewer_context(&state, current.as_ref()).await?;

    Ok(AuthTemplate {
        viewer,
        error: query.error,
        success: query.success,
    })
}

/// Handle sign-up form submission.
///
/// Creates the account, logs the user in, and sends them to the role
/// picker.
#[instrument(skip(state, session, form))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Response {
    let auth = AuthService::new(state.pool());

    match auth.register(&form.email, &form.username, &form.password).await {
        Ok(user) => {
            let current = CurrentUser {
                id: user.id,
                email: user.email.clone(),
                username: user.username.clone(),
            };

            if let Err(e) = set_current_user(&session, &current).await {
                tracing::error!("Failed to set session after sign-up: {}", e);
                return Redirect::to("/auth?error=session").into_response();
            }

            set_sentry_user(&user.id, Some(user.email.as_str()));
            Redirect::to("/auth/role").into_response()
        }
        Err(e) => {
            tracing::warn!("Sign-up failed: {}", e);
            let slug = match e {
                AuthError::UserAlreadyExists => "email_taken",
                AuthError::UsernameTaken => "username_taken",
                AuthError::WeakPassword(_) => "weak_password",
                AuthError::InvalidEmail(_) => "invalid_email",
                AuthError::InvalidUsername(_) => "invalid_username",
                _ => "signup_failed",
            };
            Redirect::to(&format!("/auth?error={slug}")).into_response()
        }
    }
}

/// Handle login form submission.
///
/// Accounts that never picked a role get sent back to the role picker.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let auth = AuthService::new(state.pool());

    match auth.login(&form.email, &form.password).await {
        Ok(user) => {
            let current = CurrentUser {
                id: user.id,
                email: user.email.clone(),
                username: user.username.clone(),
            };

            if let Err(e) = set_current_user(&session, &current).await {
                tracing::error!("Failed to set session after login: {}", e);
                return Redirect::to("/auth?error=session").into_response();
            }

            set_sentry_user(&user.id, Some(user.email.as_str()));

            if user.role.is_none() {
                Redirect::to("/auth/role").into_response()
            } else {
                Redirect::to("/").into_response()
            }
        }
        Err(e) => {
            tracing::warn!("Login failed: {}", e);
            Redirect::to("/auth?error=credentials").into_response()
        }
    }
}

// =============================================================================
// Role Picker Routes
// =============================================================================

/// Display the role picker.
#[instrument(skip(state, current, query))]
pub async fn role_page(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> Result<RoleTemplate> {
    let viewer = viewer_context(&state, Some(&current)).await?;

    Ok(RoleTemplate {
        viewer,
        error: query.error,
    })
}

/// Handle role selection.
///
/// Creators land on their dashboard, investors on the feed.
#[instrument(skip(state, current, form))]
pub async fn set_role(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Form(form): Form<RoleForm>,
) -> Response {
    let Ok(role) = form.role.parse::<Role>() else {
        tracing::warn!("Invalid role submitted: {}", form.role);
        return Redirect::to("/auth/role?error=invalid_role").into_response();
    };

    let users = UserRepository::new(state.pool());
    match users.set_role(current.id, role).await {
        Ok(_) => match role {
            Role::Creator => Redirect::to("/dashboard/creator").into_response(),
            Role::Investor => Redirect::to("/").into_response(),
        },
        Err(e) => {
            tracing::error!("Failed to set role: {}", e);
            Redirect::to("/auth/role?error=role_failed").into_response()
        }
    }
}

// =============================================================================
// Logout Route
// =============================================================================

/// Handle logout.
///
/// Clears the session and the Sentry user association.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }

    // Also destroy the entire session
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
    }

    clear_sentry_user();
    Redirect::to("/").into_response()
}
