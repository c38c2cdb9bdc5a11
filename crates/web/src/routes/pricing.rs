//! Premium plan pricing route handlers.
//!
//! Premium unlocks partnership-mode uploads for creators. Plans are
//! fixed tiers; checkout happens on Stripe via the payments service.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use idea_hub_core::PlanType;

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::state::AppState;

use super::auth::MessageQuery;
use super::{ViewerContext, viewer_context};

/// Display order of the plan tiers.
const PLANS: [PlanType; 3] = [PlanType::Monthly, PlanType::Quarterly, PlanType::Lifetime];

// =============================================================================
// Form Types
// =============================================================================

/// Plan selection form data.
#[derive(Debug, Deserialize)]
pub struct PlanForm {
    pub plan: String,
}

// =============================================================================
// View Types
// =============================================================================

/// A plan tier as shown on the pricing page.
#[derive(Debug)]
pub struct PlanView {
    pub slug: String,
    pub name: String,
    pub price: String,
    pub term: String,
}

impl From<PlanType> for PlanView {
    fn from(plan: PlanType) -> Self {
        let name = match plan {
            PlanType::Monthly => "Monthly",
            PlanType::Quarterly => "Quarterly",
            PlanType::Lifetime => "Lifetime",
        };
        Self {
            slug: plan.to_string(),
            name: name.to_string(),
            price: plan.price().to_string(),
            term: plan.term().to_string(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Pricing page template.
#[derive(Template, WebTemplate)]
#[template(path = "pricing.html")]
pub struct PricingTemplate {
    pub viewer: Option<ViewerContext>,
    pub plans: Vec<PlanView>,
    pub already_premium: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the pricing page.
#[instrument(skip(state, current, query))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(current): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Result<PricingTemplate> {
    let viewer = viewer_context(&state, current.as_ref()).await?;
    let already_premium = viewer.as_ref().is_some_and(|v| v.is_premium);

    Ok(PricingTemplate {
        viewer,
        plans: PLANS.into_iter().map(PlanView::from).collect(),
        already_premium,
        error: query.error,
        success: query.success,
    })
}

/// Start a premium plan checkout.
#[instrument(skip(state, current, form))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Form(form): Form<PlanForm>,
) -> Response {
    let Ok(plan) = form.plan.parse::<PlanType>() else {
        return Redirect::to("/pricing?error=invalid_plan").into_response();
    };

    add_breadcrumb(
        "checkout",
        "Started premium plan checkout",
        Some(&[("plan", &plan.to_string())]),
    );

    match state
        .payments()
        .create_plan_checkout(current.id, &current.email, plan)
        .await
    {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(e) => {
            tracing::error!("Failed to create plan checkout: {}", e);
            Redirect::to("/pricing?error=checkout_failed").into_response()
        }
    }
}
