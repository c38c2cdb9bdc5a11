//! Static content page route handlers.
//!
//! Serves the markdown pages loaded into the content store at startup
//! (how-it-works, terms, privacy).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

use super::{ViewerContext, viewer_context};

// =============================================================================
// Templates
// =============================================================================

/// Content page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/show.html")]
pub struct PageTemplate {
    pub viewer: Option<ViewerContext>,
    pub title: String,
    pub description: Option<String>,
    pub updated_at: Option<NaiveDate>,
    pub content_html: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display a content page by slug.
#[instrument(skip(state, current))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(current): OptionalAuth,
    Path(slug): Path<String>,
) -> Result<Response> {
    let viewer = viewer_context(&state, current.as_ref()).await?;

    let page = state
        .content()
        .get_page(&slug)
        .ok_or_else(|| AppError::NotFound(format!("page {slug}")))?;

    Ok(PageTemplate {
        viewer,
        title: page.meta.title.clone(),
        description: page.meta.description.clone(),
        updated_at: page.meta.updated_at,
        content_html: page.content_html.clone(),
    }
    .into_response())
}
