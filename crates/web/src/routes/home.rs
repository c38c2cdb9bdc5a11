//! Idea feed route handler.
//!
//! The feed is the landing page: every published idea, newest first by
//! default, with sort, mint-state, and tag filters driven by query
//! parameters.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::instrument;

use crate::db::{FeedFilter, IdeaRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

use super::ideas::IdeaCardView;
use super::{ViewerContext, viewer_context};

// =============================================================================
// Query Types
// =============================================================================

/// Feed query parameters.
///
/// Unknown values fall back to the defaults rather than erroring, so stale
/// bookmarks keep working.
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub sort: Option<String>,
    pub status: Option<String>,
    pub tag: Option<String>,
    /// Set to `canceled` when Stripe bounces an abandoned purchase back.
    pub purchase: Option<String>,
    /// Error slug from a redirect, rendered as a banner.
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Feed page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct FeedTemplate {
    pub viewer: Option<ViewerContext>,
    pub ideas: Vec<IdeaCardView>,
    pub tags: Vec<String>,
    pub selected_tag: Option<String>,
    pub sort: String,
    pub status: String,
    pub purchase_canceled: bool,
    pub error: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the idea feed.
#[instrument(skip(state, current))]
pub async fn feed(
    State(state): State<AppState>,
    OptionalAuth(current): OptionalAuth,
    Query(query): Query<FeedQuery>,
) -> Result<FeedTemplate> {
    let viewer = viewer_context(&state, current.as_ref()).await?;
    let viewer_id = current.as_ref().map(|u| u.id);

    let filter = FeedFilter {
        sort: query
            .sort
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default(),
        status: query
            .status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default(),
        tag: query.tag.filter(|t| !t.is_empty()),
    };

    let ideas_repo = IdeaRepository::new(state.pool());
    let (summaries, tags) = tokio::join!(ideas_repo.list(viewer_id, &filter), ideas_repo.distinct_tags());
    let (summaries, tags) = (summaries?, tags?);

    let ideas = summaries
        .iter()
        .map(|s| IdeaCardView::from_summary(s, viewer_id))
        .collect();

    Ok(FeedTemplate {
        viewer,
        ideas,
        tags,
        selected_tag: filter.tag,
        sort: filter.sort.to_string(),
        status: filter.status.to_string(),
        purchase_canceled: query.purchase.as_deref() == Some("canceled"),
        error: query.error,
    })
}
