//! Partnership request wizard route handlers.
//!
//! Three steps, carried across requests in the session: sign the NDA,
//! pay the access fee through Stripe, then write a message to the
//! creator. The request row is only persisted at the end of step three.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use idea_hub_core::{Email, IdeaId, OwnershipMode, PARTNERSHIP_FEE, UserId};

use crate::db::{IdeaRepository, PartnershipRepository, UserRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{Idea, PartnerFlow, session_keys};
use crate::services::PartnershipNotification;
use crate::state::AppState;

use super::auth::MessageQuery;
use super::{ViewerContext, viewer_context};

// =============================================================================
// Form Types
// =============================================================================

/// NDA step form data.
#[derive(Debug, Deserialize)]
pub struct NdaForm {
    pub full_name: String,
    pub email: String,
    /// Typed signature; the investor types their full name to sign.
    pub signature: String,
}

/// Message step form data.
#[derive(Debug, Deserialize)]
pub struct MessageForm {
    pub message: String,
}

// =============================================================================
// Templates
// =============================================================================

/// NDA step template.
#[derive(Template, WebTemplate)]
#[template(path = "partner/nda.html")]
pub struct NdaTemplate {
    pub viewer: Option<ViewerContext>,
    pub idea_id: i32,
    pub idea_title: String,
    pub nda_html: String,
    pub fee: String,
    pub error: Option<String>,
}

/// Access fee step template.
#[derive(Template, WebTemplate)]
#[template(path = "partner/payment.html")]
pub struct PaymentTemplate {
    pub viewer: Option<ViewerContext>,
    pub idea_id: i32,
    pub idea_title: String,
    pub fee: String,
    pub checkout_url: String,
}

/// Message step template.
#[derive(Template, WebTemplate)]
#[template(path = "partner/message.html")]
pub struct MessageTemplate {
    pub viewer: Option<ViewerContext>,
    pub idea_id: i32,
    pub idea_title: String,
    pub investor_name: String,
    pub error: Option<String>,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the in-progress partnership flow from the session.
async fn get_partner_flow(session: &Session) -> Option<PartnerFlow> {
    session
        .get::<PartnerFlow>(session_keys::PARTNER_FLOW)
        .await
        .ok()
        .flatten()
}

/// Store the in-progress partnership flow in the session.
async fn set_partner_flow(
    session: &Session,
    flow: &PartnerFlow,
) -> std::result::Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::PARTNER_FLOW, flow).await
}

/// Drop the partnership flow from the session.
async fn clear_partner_flow(session: &Session) {
    if let Err(e) = session.remove::<PartnerFlow>(session_keys::PARTNER_FLOW).await {
        tracing::warn!("Failed to clear partnership flow: {}", e);
    }
}

/// Load the idea behind a wizard step and enforce the entry rules.
///
/// The idea must exist, be open for partnership, and not belong to the
/// requester.
async fn load_partnership_idea(
    state: &AppState,
    id: i32,
    requester: UserId,
) -> Result<std::result::Result<Idea, Response>> {
    let idea = IdeaRepository::new(state.pool())
        .get(IdeaId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("idea {id}")))?;

    if idea.ownership_mode != OwnershipMode::Partnership {
        return Ok(Err(
            Redirect::to(&format!("/ideas/{id}?error=not_partnership")).into_response(),
        ));
    }
    if idea.created_by == requester {
        return Ok(Err(
            Redirect::to(&format!("/ideas/{id}?error=own_idea")).into_response(),
        ));
    }

    Ok(Ok(idea))
}

// =============================================================================
// Wizard Steps
// =============================================================================

/// Step 1: display the NDA with the idea title substituted in.
#[instrument(skip(state, current, query))]
pub async fn nda_page(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i32>,
    Query(query): Query<MessageQuery>,
) -> Result<Response> {
    let viewer = viewer_context(&state, Some(&current)).await?;
    let idea = match load_partnership_idea(&state, id, current.id).await? {
        Ok(idea) => idea,
        Err(redirect) => return Ok(redirect),
    };

    let nda_html = state.content().nda_html(&idea.title);

    Ok(NdaTemplate {
        viewer,
        idea_id: id,
        idea_title: idea.title,
        nda_html,
        fee: PARTNERSHIP_FEE.to_string(),
        error: query.error,
    }
    .into_response())
}

/// Step 1 submit: record the signed NDA in the session.
#[instrument(skip(state, current, session, form))]
pub async fn sign_nda(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i32>,
    session: Session,
    Form(form): Form<NdaForm>,
) -> Result<Response> {
    if let Err(redirect) = load_partnership_idea(&state, id, current.id).await? {
        return Ok(redirect);
    }

    let full_name = form.full_name.trim();
    let signature = form.signature.trim();
    let email = form.email.trim();
    if full_name.is_empty() || signature.is_empty() {
        return Ok(Redirect::to(&format!("/ideas/{id}/partner?error=missing_fields")).into_response());
    }
    if email.parse::<Email>().is_err() {
        return Ok(Redirect::to(&format!("/ideas/{id}/partner?error=invalid_email")).into_response());
    }

    let flow = PartnerFlow {
        idea_id: IdeaId::new(id),
        nda_signature: signature.to_string(),
        investor_name: full_name.to_string(),
        investor_email: email.to_string(),
        payment_acknowledged: false,
    };

    if let Err(e) = set_partner_flow(&session, &flow).await {
        tracing::error!("Failed to store partnership flow: {}", e);
        return Ok(Redirect::to(&format!("/ideas/{id}/partner?error=session")).into_response());
    }

    Ok(Redirect::to(&format!("/ideas/{id}/partner/payment")).into_response())
}

/// Step 2: show the access fee and hand off to Stripe checkout.
#[instrument(skip(state, current, session))]
pub async fn payment_page(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i32>,
    session: Session,
) -> Result<Response> {
    let viewer = viewer_context(&state, Some(&current)).await?;
    let idea = match load_partnership_idea(&state, id, current.id).await? {
        Ok(idea) => idea,
        Err(redirect) => return Ok(redirect),
    };

    let Some(flow) = get_partner_flow(&session).await else {
        return Ok(Redirect::to(&format!("/ideas/{id}/partner?error=start_over")).into_response());
    };
    if flow.idea_id != idea.id {
        return Ok(Redirect::to(&format!("/ideas/{id}/partner?error=start_over")).into_response());
    }

    add_breadcrumb(
        "checkout",
        "Started partnership fee checkout",
        Some(&[("idea_id", &id.to_string())]),
    );

    let checkout_url = match state
        .payments()
        .create_partnership_checkout(
            idea.id,
            current.id,
            &flow.investor_name,
            &flow.investor_email,
            &flow.nda_signature,
        )
        .await
    {
        Ok(url) => url,
        Err(e) => {
            tracing::error!("Failed to create partnership checkout: {}", e);
            return Ok(Redirect::to(&format!("/ideas/{id}?error=checkout_failed")).into_response());
        }
    };

    Ok(PaymentTemplate {
        viewer,
        idea_id: id,
        idea_title: idea.title,
        fee: PARTNERSHIP_FEE.to_string(),
        checkout_url,
    }
    .into_response())
}

/// Step 3: write a message to the creator.
///
/// Stripe's success URL lands here, so reaching this step marks the fee
/// as acknowledged in the flow. The authoritative payment record is
/// written by the payments service webhook.
#[instrument(skip(state, current, session, query))]
pub async fn message_page(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i32>,
    session: Session,
    Query(query): Query<MessageQuery>,
) -> Result<Response> {
    let viewer = viewer_context(&state, Some(&current)).await?;
    let idea = match load_partnership_idea(&state, id, current.id).await? {
        Ok(idea) => idea,
        Err(redirect) => return Ok(redirect),
    };

    let Some(mut flow) = get_partner_flow(&session).await else {
        return Ok(Redirect::to(&format!("/ideas/{id}/partner?error=start_over")).into_response());
    };
    if flow.idea_id != idea.id {
        return Ok(Redirect::to(&format!("/ideas/{id}/partner?error=start_over")).into_response());
    }

    if !flow.payment_acknowledged {
        flow.payment_acknowledged = true;
        if let Err(e) = set_partner_flow(&session, &flow).await {
            tracing::error!("Failed to update partnership flow: {}", e);
        }
    }

    Ok(MessageTemplate {
        viewer,
        idea_id: id,
        idea_title: idea.title,
        investor_name: flow.investor_name,
        error: query.error,
    }
    .into_response())
}

/// Step 3 submit: persist the request and notify the creator.
#[instrument(skip(state, current, session, form))]
pub async fn submit(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i32>,
    session: Session,
    Form(form): Form<MessageForm>,
) -> Result<Response> {
    let idea = match load_partnership_idea(&state, id, current.id).await? {
        Ok(idea) => idea,
        Err(redirect) => return Ok(redirect),
    };

    let Some(flow) = get_partner_flow(&session).await else {
        return Ok(Redirect::to(&format!("/ideas/{id}/partner?error=start_over")).into_response());
    };
    if flow.idea_id != idea.id {
        return Ok(Redirect::to(&format!("/ideas/{id}/partner?error=start_over")).into_response());
    }
    if !flow.payment_acknowledged {
        return Ok(Redirect::to(&format!("/ideas/{id}/partner/payment")).into_response());
    }

    let message = form.message.trim();
    let message = (!message.is_empty()).then_some(message);

    let request = PartnershipRepository::new(state.pool())
        .create(
            idea.id,
            current.id,
            &flow.investor_name,
            &flow.investor_email,
            &flow.nda_signature,
            message,
        )
        .await?;

    tracing::info!(
        request_id = request.id.as_i32(),
        idea_id = id,
        "Partnership request submitted"
    );

    notify_creator(&state, &idea, &flow, message).await;
    clear_partner_flow(&session).await;

    Ok(Redirect::to(&format!("/ideas/{id}?success=partnership_sent")).into_response())
}

/// Email the idea's creator about a new request. Best effort; failures
/// are logged and never block the wizard.
async fn notify_creator(state: &AppState, idea: &Idea, flow: &PartnerFlow, message: Option<&str>) {
    let Some(email_service) = state.email() else {
        return;
    };

    let creator = match UserRepository::new(state.pool()).get_by_id(idea.created_by).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!("Creator {} not found for notification", idea.created_by);
            return;
        }
        Err(e) => {
            tracing::warn!("Failed to load creator for notification: {}", e);
            return;
        }
    };

    let dashboard_url = format!(
        "{}/dashboard/creator",
        state.config().base_url.trim_end_matches('/')
    );
    let notification = PartnershipNotification {
        creator_name: creator.username.as_str(),
        creator_email: creator.email.as_str(),
        idea_title: &idea.title,
        investor_name: &flow.investor_name,
        investor_email: &flow.investor_email,
        message: message.unwrap_or(""),
        dashboard_url: &dashboard_url,
    };

    if let Err(e) = email_service.send_partnership_request(&notification).await {
        tracing::warn!("Failed to send partnership notification: {}", e);
    }
}
