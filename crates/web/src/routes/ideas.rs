//! Idea route handlers.
//!
//! Upload, detail, editing, upvotes, comments, remixing, and the buy
//! action that hands off to Stripe checkout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use idea_hub_core::{IDEA_PRICE, IdeaId, OwnershipMode, UserId};

use crate::db::{IdeaRepository, NewIdea};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{Comment, IdeaSummary};
use crate::state::AppState;

use super::auth::MessageQuery;
use super::{ViewerContext, viewer_context};

// =============================================================================
// View Types
// =============================================================================

/// Idea display data for feed and dashboard cards.
#[derive(Debug, Clone)]
pub struct IdeaCardView {
    pub id: i32,
    pub title: String,
    pub author: String,
    /// `None` when the description is blur-protected from this viewer.
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub upvotes: i64,
    pub comments: i64,
    pub upvoted_by_viewer: bool,
    pub is_for_sale: bool,
    pub is_partnership: bool,
    pub is_minted: bool,
    pub minted_attribution: Option<String>,
    pub posted_at: DateTime<Utc>,
}

impl IdeaCardView {
    /// Build the card as seen by `viewer`.
    #[must_use]
    pub fn from_summary(summary: &IdeaSummary, viewer: Option<UserId>) -> Self {
        let idea = &summary.idea;
        Self {
            id: idea.id.as_i32(),
            title: idea.title.clone(),
            author: summary.author_username.to_string(),
            description: idea
                .content_visible_to(viewer)
                .then(|| idea.description.clone()),
            tags: idea.tags.clone(),
            image_url: idea.image_url.clone(),
            upvotes: summary.upvotes,
            comments: summary.comments,
            upvoted_by_viewer: summary.upvoted_by_viewer,
            is_for_sale: idea.ownership_mode == OwnershipMode::ForSale,
            is_partnership: idea.ownership_mode == OwnershipMode::Partnership,
            is_minted: idea.is_minted(),
            minted_attribution: summary.minted_attribution(),
            posted_at: idea.created_at,
        }
    }
}

/// Comment display data.
#[derive(Debug, Clone)]
pub struct CommentView {
    pub author: String,
    pub content: String,
    pub posted_at: DateTime<Utc>,
}

impl From<&Comment> for CommentView {
    fn from(comment: &Comment) -> Self {
        Self {
            author: comment.author_username.to_string(),
            content: comment.content.clone(),
            posted_at: comment.created_at,
        }
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Upload form data.
#[derive(Debug, Deserialize)]
pub struct UploadForm {
    pub title: String,
    pub description: String,
    /// Comma-separated tag list.
    pub tags: String,
    pub image_url: Option<String>,
    pub ownership_mode: String,
    /// Checkbox; present when checked.
    pub is_blurred: Option<String>,
    /// Checkbox; present when checked.
    pub mint_to_self: Option<String>,
}

/// Edit form data.
///
/// Ownership mode is fixed at upload time and cannot be edited.
#[derive(Debug, Deserialize)]
pub struct EditForm {
    pub title: String,
    pub description: String,
    pub tags: String,
    pub image_url: Option<String>,
    pub is_blurred: Option<String>,
}

/// Remix form data.
#[derive(Debug, Deserialize)]
pub struct RemixForm {
    pub title: String,
    /// What the remixer changed; appended to the inherited description.
    pub changes: String,
    pub tags: String,
    pub ownership_mode: String,
    pub is_blurred: Option<String>,
}

/// Comment form data.
#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub content: String,
}

/// Upvote form data.
#[derive(Debug, Deserialize)]
pub struct UpvoteForm {
    /// Page to bounce back to; must be a local path.
    pub next: Option<String>,
}

/// Parse a comma-separated tag field into trimmed, non-empty tags.
fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalize an optional URL field: empty input becomes `None`.
fn normalize_url(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Only allow local redirect targets from form input.
fn safe_next(next: Option<&str>, fallback: String) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => fallback,
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Upload page template.
#[derive(Template, WebTemplate)]
#[template(path = "ideas/upload.html")]
pub struct UploadTemplate {
    pub viewer: Option<ViewerContext>,
    /// Whether the partnership ownership mode is offered (premium only).
    pub can_partner: bool,
    pub existing_tags: Vec<String>,
    pub error: Option<String>,
}

/// Idea detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "ideas/show.html")]
pub struct IdeaShowTemplate {
    pub viewer: Option<ViewerContext>,
    pub idea: IdeaCardView,
    pub is_own: bool,
    pub purchasable: bool,
    pub partner_available: bool,
    pub price: String,
    pub comments: Vec<CommentView>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Edit page template.
#[derive(Template, WebTemplate)]
#[template(path = "ideas/edit.html")]
pub struct EditTemplate {
    pub viewer: Option<ViewerContext>,
    pub id: i32,
    pub title: String,
    pub description: String,
    pub tags: String,
    pub image_url: String,
    pub is_blurred: bool,
    pub error: Option<String>,
}

/// Remix page template.
#[derive(Template, WebTemplate)]
#[template(path = "ideas/remix.html")]
pub struct RemixTemplate {
    pub viewer: Option<ViewerContext>,
    pub source_id: i32,
    pub source_title: String,
    pub title: String,
    pub inherited_description: String,
    pub tags: String,
    pub can_partner: bool,
    pub error: Option<String>,
}

// =============================================================================
// Upload Routes
// =============================================================================

/// Display the upload form.
///
/// Creators only; the partnership mode option is shown to premium
/// creators.
#[instrument(skip(state, current, query))]
pub async fn upload_page(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> Result<Response> {
    let Some(viewer) = viewer_context(&state, Some(&current)).await? else {
        return Ok(Redirect::to("/auth").into_response());
    };
    if !viewer.is_creator() {
        return Ok(Redirect::to("/?error=creators_only").into_response());
    }

    let existing_tags = IdeaRepository::new(state.pool()).distinct_tags().await?;
    let can_partner = viewer.is_premium;

    Ok(UploadTemplate {
        viewer: Some(viewer),
        can_partner,
        existing_tags,
        error: query.error,
    }
    .into_response())
}

/// Handle the upload form submission.
#[instrument(skip(state, current, form))]
pub async fn upload(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Form(form): Form<UploadForm>,
) -> Result<Response> {
    let Some(viewer) = viewer_context(&state, Some(&current)).await? else {
        return Ok(Redirect::to("/auth").into_response());
    };
    if !viewer.is_creator() {
        return Ok(Redirect::to("/?error=creators_only").into_response());
    }

    let title = form.title.trim();
    let description = form.description.trim();
    if title.is_empty() || description.is_empty() {
        return Ok(Redirect::to("/upload?error=missing_fields").into_response());
    }

    let Ok(ownership_mode) = form.ownership_mode.parse::<OwnershipMode>() else {
        tracing::warn!("Invalid ownership mode submitted: {}", form.ownership_mode);
        return Ok(Redirect::to("/upload?error=invalid_mode").into_response());
    };
    if ownership_mode == OwnershipMode::Partnership && !viewer.is_premium {
        return Ok(Redirect::to("/upload?error=premium_required").into_response());
    }

    let new_idea = NewIdea {
        title: title.to_string(),
        description: description.to_string(),
        tags: parse_tags(&form.tags),
        image_url: normalize_url(form.image_url),
        is_blurred: form.is_blurred.is_some(),
        ownership_mode,
        remix_of: None,
        mint_to_self: form.mint_to_self.is_some(),
    };

    let idea = IdeaRepository::new(state.pool())
        .create(current.id, &new_idea)
        .await?;

    tracing::info!(idea_id = idea.id.as_i32(), "Idea published");
    Ok(Redirect::to(&format!("/ideas/{}?success=published", idea.id)).into_response())
}

// =============================================================================
// Detail Routes
// =============================================================================

/// Display an idea's detail page.
#[instrument(skip(state, current, query))]
pub async fn show(
    State(state): State<AppState>,
    crate::middleware::OptionalAuth(current): crate::middleware::OptionalAuth,
    Path(id): Path<i32>,
    Query(query): Query<MessageQuery>,
) -> Result<Response> {
    let viewer = viewer_context(&state, current.as_ref()).await?;
    let viewer_id = current.as_ref().map(|u| u.id);
    let idea_id = IdeaId::new(id);

    let ideas_repo = IdeaRepository::new(state.pool());
    let summary = ideas_repo
        .get_summary(idea_id, viewer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("idea {id}")))?;
    let comments = ideas_repo.comments_for(idea_id).await?;

    let is_own = viewer_id == Some(summary.idea.created_by);
    let purchasable = summary.idea.purchasable_by(viewer_id);
    let partner_available = summary.idea.ownership_mode == OwnershipMode::Partnership
        && viewer_id.is_some()
        && !is_own
        && !summary.idea.is_minted();

    Ok(IdeaShowTemplate {
        viewer,
        idea: IdeaCardView::from_summary(&summary, viewer_id),
        is_own,
        purchasable,
        partner_available,
        price: IDEA_PRICE.to_string(),
        comments: comments.iter().map(CommentView::from).collect(),
        error: query.error,
        success: query.success,
    }
    .into_response())
}

// =============================================================================
// Interaction Routes
// =============================================================================

/// Toggle an upvote and bounce back.
#[instrument(skip(state, current, form))]
pub async fn upvote(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i32>,
    Form(form): Form<UpvoteForm>,
) -> Result<Response> {
    let idea_id = IdeaId::new(id);
    let ideas_repo = IdeaRepository::new(state.pool());

    if ideas_repo.get(idea_id).await?.is_none() {
        return Err(AppError::NotFound(format!("idea {id}")));
    }
    ideas_repo.toggle_upvote(idea_id, current.id).await?;

    let target = safe_next(form.next.as_deref(), format!("/ideas/{id}"));
    Ok(Redirect::to(&target).into_response())
}

/// Add a comment.
#[instrument(skip(state, current, form))]
pub async fn add_comment(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i32>,
    Form(form): Form<CommentForm>,
) -> Result<Response> {
    let content = form.content.trim();
    if content.is_empty() {
        return Ok(Redirect::to(&format!("/ideas/{id}?error=empty_comment")).into_response());
    }

    let idea_id = IdeaId::new(id);
    let ideas_repo = IdeaRepository::new(state.pool());

    if ideas_repo.get(idea_id).await?.is_none() {
        return Err(AppError::NotFound(format!("idea {id}")));
    }
    ideas_repo
        .add_comment(idea_id, current.id, &current.username, content)
        .await?;

    Ok(Redirect::to(&format!("/ideas/{id}#comments")).into_response())
}

// =============================================================================
// Edit Routes
// =============================================================================

/// Display the edit form. Creator only.
#[instrument(skip(state, current, query))]
pub async fn edit_page(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i32>,
    Query(query): Query<MessageQuery>,
) -> Result<Response> {
    let viewer = viewer_context(&state, Some(&current)).await?;
    let idea = IdeaRepository::new(state.pool())
        .get(IdeaId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("idea {id}")))?;

    if idea.created_by != current.id {
        return Err(AppError::Forbidden("you can only edit your own ideas".to_string()));
    }

    Ok(EditTemplate {
        viewer,
        id,
        title: idea.title,
        description: idea.description,
        tags: idea.tags.join(", "),
        image_url: idea.image_url.unwrap_or_default(),
        is_blurred: idea.is_blurred,
        error: query.error,
    }
    .into_response())
}

/// Handle the edit form submission.
#[instrument(skip(state, current, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i32>,
    Form(form): Form<EditForm>,
) -> Result<Response> {
    let title = form.title.trim();
    let description = form.description.trim();
    if title.is_empty() || description.is_empty() {
        return Ok(Redirect::to(&format!("/ideas/{id}/edit?error=missing_fields")).into_response());
    }

    let image_url = normalize_url(form.image_url);
    IdeaRepository::new(state.pool())
        .update(
            IdeaId::new(id),
            current.id,
            title,
            description,
            &parse_tags(&form.tags),
            image_url.as_deref(),
            form.is_blurred.is_some(),
        )
        .await?;

    Ok(Redirect::to(&format!("/ideas/{id}?success=updated")).into_response())
}

/// Delete an idea. Creator only; comments and upvotes cascade.
#[instrument(skip(state, current))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    IdeaRepository::new(state.pool())
        .delete(IdeaId::new(id), current.id)
        .await?;

    tracing::info!(idea_id = id, "Idea deleted");
    Ok(Redirect::to("/dashboard/creator?success=idea_deleted").into_response())
}

// =============================================================================
// Remix Routes
// =============================================================================

/// Display the remix form.
///
/// Remixing requires the creator role and a readable description; blurred
/// ideas can only be remixed by people who can already see them.
#[instrument(skip(state, current, query))]
pub async fn remix_page(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i32>,
    Query(query): Query<MessageQuery>,
) -> Result<Response> {
    let Some(viewer) = viewer_context(&state, Some(&current)).await? else {
        return Ok(Redirect::to("/auth").into_response());
    };
    if !viewer.is_creator() {
        return Ok(Redirect::to(&format!("/ideas/{id}?error=creators_only")).into_response());
    }

    let source = IdeaRepository::new(state.pool())
        .get(IdeaId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("idea {id}")))?;

    if !source.content_visible_to(Some(current.id)) {
        return Ok(Redirect::to(&format!("/ideas/{id}?error=remix_protected")).into_response());
    }

    Ok(RemixTemplate {
        can_partner: viewer.is_premium,
        viewer: Some(viewer),
        source_id: id,
        source_title: source.title.clone(),
        title: format!("Remix: {}", source.title),
        inherited_description: source.description,
        tags: source.tags.join(", "),
        error: query.error,
    }
    .into_response())
}

/// Handle the remix form submission.
///
/// The new idea carries the source description plus a changes section and
/// records its lineage in `remix_of`.
#[instrument(skip(state, current, form))]
pub async fn remix(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i32>,
    Form(form): Form<RemixForm>,
) -> Result<Response> {
    let Some(viewer) = viewer_context(&state, Some(&current)).await? else {
        return Ok(Redirect::to("/auth").into_response());
    };
    if !viewer.is_creator() {
        return Ok(Redirect::to(&format!("/ideas/{id}?error=creators_only")).into_response());
    }

    let source = IdeaRepository::new(state.pool())
        .get(IdeaId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("idea {id}")))?;

    if !source.content_visible_to(Some(current.id)) {
        return Ok(Redirect::to(&format!("/ideas/{id}?error=remix_protected")).into_response());
    }

    let title = form.title.trim();
    let changes = form.changes.trim();
    if title.is_empty() || changes.is_empty() {
        return Ok(Redirect::to(&format!("/ideas/{id}/remix?error=missing_fields")).into_response());
    }

    let Ok(ownership_mode) = form.ownership_mode.parse::<OwnershipMode>() else {
        return Ok(Redirect::to(&format!("/ideas/{id}/remix?error=invalid_mode")).into_response());
    };
    if ownership_mode == OwnershipMode::Partnership && !viewer.is_premium {
        return Ok(
            Redirect::to(&format!("/ideas/{id}/remix?error=premium_required")).into_response(),
        );
    }

    let new_idea = NewIdea {
        title: title.to_string(),
        description: format!(
            "{}\n\n--- REMIX CHANGES ---\n{changes}",
            source.description
        ),
        tags: parse_tags(&form.tags),
        image_url: source.image_url.clone(),
        is_blurred: form.is_blurred.is_some(),
        ownership_mode,
        remix_of: Some(source.id),
        mint_to_self: false,
    };

    let idea = IdeaRepository::new(state.pool())
        .create(current.id, &new_idea)
        .await?;

    tracing::info!(
        idea_id = idea.id.as_i32(),
        remix_of = id,
        "Remix published"
    );
    Ok(Redirect::to(&format!("/ideas/{}?success=published", idea.id)).into_response())
}

// =============================================================================
// Purchase Route
// =============================================================================

/// Start a Stripe checkout to buy the idea.
///
/// The payments service re-validates purchasability before creating the
/// session; the check here just produces a friendlier bounce.
#[instrument(skip(state, current))]
pub async fn buy(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    let idea_id = IdeaId::new(id);
    let idea = IdeaRepository::new(state.pool())
        .get(idea_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("idea {id}")))?;

    if !idea.purchasable_by(Some(current.id)) {
        return Ok(Redirect::to(&format!("/ideas/{id}?error=not_purchasable")).into_response());
    }

    add_breadcrumb(
        "checkout",
        "Started idea purchase",
        Some(&[("idea_id", &id.to_string())]),
    );

    match state
        .payments()
        .create_idea_checkout(idea_id, current.id, &current.email)
        .await
    {
        Ok(url) => Ok(Redirect::to(&url).into_response()),
        Err(e) => {
            tracing::error!("Failed to create purchase checkout: {}", e);
            Ok(Redirect::to(&format!("/ideas/{id}?error=checkout_failed")).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags_trims_and_drops_empties() {
        assert_eq!(
            parse_tags(" saas, hardware ,, ai "),
            vec!["saas".to_string(), "hardware".to_string(), "ai".to_string()]
        );
        assert!(parse_tags("").is_empty());
        assert!(parse_tags(" , ,").is_empty());
    }

    #[test]
    fn test_normalize_url_drops_blank_input() {
        assert_eq!(normalize_url(Some("  ".to_string())), None);
        assert_eq!(normalize_url(None), None);
        assert_eq!(
            normalize_url(Some(" https://cdn.example/img.png ".to_string())),
            Some("https://cdn.example/img.png".to_string())
        );
    }

    #[test]
    fn test_safe_next_rejects_external_targets() {
        assert_eq!(
            safe_next(Some("/ideas/7"), "/fallback".to_string()),
            "/ideas/7"
        );
        assert_eq!(
            safe_next(Some("https://evil.example"), "/fallback".to_string()),
            "/fallback"
        );
        assert_eq!(
            safe_next(Some("//evil.example"), "/fallback".to_string()),
            "/fallback"
        );
        assert_eq!(safe_next(None, "/fallback".to_string()), "/fallback");
    }
}
