//! Profile route handlers.
//!
//! Profile display and editing, avatar upload, and the lightweight JSON
//! status endpoint the client polls after returning from checkout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Multipart, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{CspNonce, RequireAuth};
use crate::models::ProfileStats;
use crate::services::MediaError;
use crate::state::AppState;

use super::ViewerContext;
use super::auth::MessageQuery;

// =============================================================================
// Form Types
// =============================================================================

/// Profile edit form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub bio: Option<String>,
    pub wallet_address: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Profile page template.
///
/// Carries the CSP nonce for the premium status polling script shown
/// after a plan checkout.
#[derive(Template, WebTemplate)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub viewer: Option<ViewerContext>,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub wallet_address: String,
    pub avatar_url: Option<String>,
    pub is_premium: bool,
    pub member_since: DateTime<Utc>,
    pub stats: ProfileStats,
    pub csp_nonce: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// JSON Types
// =============================================================================

/// Premium and ownership state, polled after checkout redirects.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub is_premium: bool,
    pub minted: Vec<i32>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the logged-in user's profile.
#[instrument(skip(state, current, query, nonce))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    nonce: CspNonce,
    Query(query): Query<MessageQuery>,
) -> Result<Response> {
    let users = UserRepository::new(state.pool());
    let (user, stats) = tokio::join!(users.get_by_id(current.id), users.profile_stats(current.id));
    let Some(user) = user? else {
        return Ok(Redirect::to("/auth").into_response());
    };
    let stats = stats?;

    Ok(ProfileTemplate {
        viewer: Some(ViewerContext::from(&user)),
        username: user.username.to_string(),
        email: user.email.to_string(),
        bio: user.bio.unwrap_or_default(),
        wallet_address: user.wallet_address.unwrap_or_default(),
        avatar_url: user.avatar_url,
        is_premium: user.is_premium,
        member_since: user.created_at,
        stats,
        csp_nonce: nonce.0,
        error: query.error,
        success: query.success,
    }
    .into_response())
}

/// Handle the profile edit form submission.
#[instrument(skip(state, current, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let bio = form
        .bio
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let wallet_address = form
        .wallet_address
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    UserRepository::new(state.pool())
        .update_profile(current.id, bio.as_deref(), wallet_address.as_deref())
        .await?;

    Ok(Redirect::to("/profile?success=profile_updated").into_response())
}

/// Handle an avatar upload.
///
/// Expects a multipart form with an `avatar` file field. Type and size
/// limits are enforced by the media store.
#[instrument(skip(state, current, multipart))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    mut multipart: Multipart,
) -> Result<Response> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("avatar") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if data.is_empty() {
            break;
        }

        return match state.media().save_avatar(current.id, &content_type, &data).await {
            Ok(url) => {
                UserRepository::new(state.pool())
                    .set_avatar(current.id, &url)
                    .await?;
                Ok(Redirect::to("/profile?success=avatar_updated").into_response())
            }
            Err(MediaError::UnsupportedType(t)) => {
                tracing::warn!("Rejected avatar with content type {t}");
                Ok(Redirect::to("/profile?error=unsupported_type").into_response())
            }
            Err(MediaError::TooLarge { .. }) => {
                Ok(Redirect::to("/profile?error=file_too_large").into_response())
            }
            Err(e) => {
                tracing::error!("Avatar upload failed: {}", e);
                Err(AppError::Internal("avatar upload failed".to_string()))
            }
        };
    }

    Ok(Redirect::to("/profile?error=no_file").into_response())
}

/// Premium and minted-idea state for the logged-in user.
///
/// Checkout success pages poll this to learn when the webhook has landed,
/// since Stripe redirects the browser back before the webhook fires.
#[instrument(skip(state, current))]
pub async fn status(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<StatusResponse>> {
    let users = UserRepository::new(state.pool());
    let (user, minted) = tokio::join!(users.get_by_id(current.id), users.minted_idea_ids(current.id));
    let user = user?.ok_or_else(|| AppError::NotFound("user".to_string()))?;

    Ok(Json(StatusResponse {
        is_premium: user.is_premium,
        minted: minted?.into_iter().map(|id| id.as_i32()).collect(),
    }))
}
