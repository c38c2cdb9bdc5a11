//! Dashboard route handlers.
//!
//! Role-specific home bases: creators see their idea stats, pending
//! partnership requests, and wallet balance; investors see the ideas they
//! own and a trending list of unminted ideas.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use idea_hub_core::Role;

use crate::db::{CreatorTotals, IdeaRepository, PartnershipRepository, UserRepository, WalletRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::{CspNonce, RequireAuth};
use crate::models::PartnershipRequest;
use crate::state::AppState;

use super::ViewerContext;
use super::auth::MessageQuery;
use super::ideas::IdeaCardView;

/// How many ideas the creator dashboard lists.
const RECENT_IDEAS: i64 = 5;

/// How many ideas the investor trending list shows.
const TRENDING_IDEAS: i64 = 10;

// =============================================================================
// Query Types
// =============================================================================

/// Investor dashboard query parameters.
#[derive(Debug, Deserialize)]
pub struct InvestorQuery {
    /// Set to `success` when Stripe redirects back after an idea purchase.
    pub purchase: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// View Types
// =============================================================================

/// A pending partnership request as shown to the creator.
#[derive(Debug)]
pub struct PendingRequestView {
    pub idea_title: String,
    pub investor_name: String,
    pub investor_email: String,
    pub message: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl From<(PartnershipRequest, String)> for PendingRequestView {
    fn from((request, idea_title): (PartnershipRequest, String)) -> Self {
        Self {
            idea_title,
            investor_name: request.investor_name,
            investor_email: request.investor_email,
            message: request.message,
            received_at: request.created_at,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Creator dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/creator.html")]
pub struct CreatorDashboardTemplate {
    pub viewer: Option<ViewerContext>,
    pub totals: CreatorTotals,
    pub recent: Vec<IdeaCardView>,
    pub pending: Vec<PendingRequestView>,
    pub balance: String,
    pub total_earned: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Investor dashboard template.
///
/// Carries the CSP nonce for the mint status polling script shown while
/// a purchase webhook is still in flight.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/investor.html")]
pub struct InvestorDashboardTemplate {
    pub viewer: Option<ViewerContext>,
    pub owned: Vec<IdeaCardView>,
    pub trending: Vec<IdeaCardView>,
    pub purchase_pending: bool,
    pub csp_nonce: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the creator dashboard.
#[instrument(skip(state, current, query))]
pub async fn creator(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> Result<Response> {
    let users = UserRepository::new(state.pool());
    let Some(user) = users.get_by_id(current.id).await? else {
        return Ok(Redirect::to("/auth").into_response());
    };
    match user.role {
        Some(Role::Creator) => {}
        Some(Role::Investor) => return Ok(Redirect::to("/dashboard/investor").into_response()),
        None => return Ok(Redirect::to("/auth/role").into_response()),
    }

    let ideas = IdeaRepository::new(state.pool());
    let partnerships = PartnershipRepository::new(state.pool());
    let wallets = WalletRepository::new(state.pool());

    let (totals, recent, pending, wallet) = tokio::join!(
        ideas.creator_totals(current.id),
        ideas.recent_by_creator(current.id, RECENT_IDEAS),
        partnerships.pending_for_creator(current.id),
        wallets.get_or_create(current.id),
    );
    let wallet = wallet?;

    Ok(CreatorDashboardTemplate {
        viewer: Some(ViewerContext::from(&user)),
        totals: totals?,
        recent: recent?
            .iter()
            .map(|s| IdeaCardView::from_summary(s, Some(current.id)))
            .collect(),
        pending: pending?.into_iter().map(PendingRequestView::from).collect(),
        balance: wallet.balance.to_string(),
        total_earned: wallet.total_earned.to_string(),
        error: query.error,
        success: query.success,
    }
    .into_response())
}

/// Display the investor dashboard.
#[instrument(skip(state, current, query, nonce))]
pub async fn investor(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    nonce: CspNonce,
    Query(query): Query<InvestorQuery>,
) -> Result<Response> {
    let users = UserRepository::new(state.pool());
    let Some(user) = users.get_by_id(current.id).await? else {
        return Ok(Redirect::to("/auth").into_response());
    };
    match user.role {
        Some(Role::Investor) => {}
        Some(Role::Creator) => return Ok(Redirect::to("/dashboard/creator").into_response()),
        None => return Ok(Redirect::to("/auth/role").into_response()),
    }

    let ideas = IdeaRepository::new(state.pool());
    let owned = ideas.owned_by(current.id).await?;

    // Check cache
    let trending = match state.trending_cache().get(&current.id).await {
        Some(cached) => {
            tracing::debug!("Cache hit for trending ideas");
            cached
        }
        None => {
            let fresh = Arc::new(ideas.trending(current.id, TRENDING_IDEAS).await?);
            state
                .trending_cache()
                .insert(current.id, Arc::clone(&fresh))
                .await;
            fresh
        }
    };

    Ok(InvestorDashboardTemplate {
        viewer: Some(ViewerContext::from(&user)),
        owned: owned
            .iter()
            .map(|s| IdeaCardView::from_summary(s, Some(current.id)))
            .collect(),
        trending: trending
            .iter()
            .map(|s| IdeaCardView::from_summary(s, Some(current.id)))
            .collect(),
        purchase_pending: query.purchase.as_deref() == Some("success"),
        csp_nonce: nonce.0,
        error: query.error,
        success: query.success,
    }
    .into_response())
}
