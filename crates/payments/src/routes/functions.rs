//! Checkout session function endpoints.
//!
//! Called server-to-server by the web process (never by browsers), so
//! every handler speaks JSON and trusts the caller's user ids. Each
//! checkout records a pending order keyed by the Stripe session before
//! the redirect URL is returned; the webhook resolves it later.
//!
//! Validation that gates money movement (is the idea for sale, already
//! sold, the buyer's own) happens here so a stale button click fails
//! before Stripe is involved.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use idea_hub_core::{
    IDEA_PRICE, IdeaId, OrderKind, OwnershipMode, PARTNERSHIP_FEE, PlanType, UserId,
};

use crate::db::{
    CustomerRepository, IdeaRepository, NewOrder, OrderRepository, PayoutAccountRepository,
};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;
use crate::stripe::{CheckoutMode, CheckoutSessionParams, metadata};

// =============================================================================
// Request / Response Types
// =============================================================================

/// Premium plan checkout request.
#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    pub user_id: UserId,
    pub email: String,
    pub plan: PlanType,
}

/// Idea purchase checkout request.
#[derive(Debug, Deserialize)]
pub struct CreateWalletPurchaseRequest {
    pub idea_id: IdeaId,
    pub investor_id: UserId,
    pub email: String,
}

/// Partnership access fee checkout request.
#[derive(Debug, Deserialize)]
pub struct CreatePartnershipPaymentRequest {
    pub idea_id: IdeaId,
    pub investor_id: UserId,
    pub investor_name: String,
    pub investor_email: String,
    pub nda_signature: String,
}

/// Payout session request.
#[derive(Debug, Deserialize)]
pub struct CreatePayoutSessionRequest {
    pub user_id: UserId,
    pub email: String,
}

/// Checkout session response.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

/// Payout session response.
///
/// Either an onboarding link for creators without a completed Connect
/// account, or an Express dashboard login link for those with one.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutSessionResponse {
    pub requires_onboarding: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /functions/create-checkout
///
/// Create a checkout session for a premium plan.
#[instrument(skip(state, req), fields(user_id = req.user_id.as_i32(), plan = %req.plan))]
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(req): Json<CreateCheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    add_breadcrumb(
        "checkout",
        "Plan checkout requested",
        Some(&[("plan", &req.plan.to_string())]),
    );

    let customer = get_or_create_customer(&state, req.user_id, &req.email).await?;

    let amount = req.plan.price();
    let checkout_metadata = [
        (metadata::KIND, OrderKind::Plan.to_string()),
        (metadata::USER_ID, req.user_id.to_string()),
        (metadata::PLAN_TYPE, req.plan.to_string()),
    ];
    let params = CheckoutSessionParams {
        mode: checkout_mode(req.plan),
        product_name: format!("Idea-HUB Premium ({})", req.plan),
        amount,
        success_url: state
            .config()
            .marketplace_url("/profile?success=plan_purchased"),
        cancel_url: state
            .config()
            .marketplace_url("/pricing?error=checkout_canceled"),
        customer: Some(&customer),
        customer_email: None,
        metadata: &checkout_metadata,
    };

    let session = state.stripe().create_checkout_session(&params).await?;
    let url = checkout_url(&session)?;

    OrderRepository::new(state.pool())
        .create(&NewOrder {
            stripe_session_id: &session.id,
            user_id: req.user_id,
            kind: OrderKind::Plan,
            idea_id: None,
            plan: Some(req.plan),
            amount,
        })
        .await?;

    Ok(Json(CheckoutResponse { url }))
}

/// POST /functions/create-wallet-purchase
///
/// Create a checkout session to buy an idea outright.
#[instrument(
    skip(state, req),
    fields(idea_id = req.idea_id.as_i32(), investor_id = req.investor_id.as_i32())
)]
pub async fn create_wallet_purchase(
    State(state): State<AppState>,
    Json(req): Json<CreateWalletPurchaseRequest>,
) -> Result<Json<CheckoutResponse>> {
    add_breadcrumb(
        "checkout",
        "Idea purchase requested",
        Some(&[("idea_id", &req.idea_id.to_string())]),
    );

    let idea = IdeaRepository::new(state.pool())
        .get(req.idea_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Idea not found".to_string()))?;

    if idea.ownership_mode != OwnershipMode::ForSale {
        return Err(AppError::BadRequest("Idea is not for sale".to_string()));
    }
    if idea.is_minted() {
        return Err(AppError::Conflict("Idea has already been sold".to_string()));
    }
    if idea.created_by == req.investor_id {
        return Err(AppError::BadRequest(
            "You cannot buy your own idea".to_string(),
        ));
    }

    let customer = get_or_create_customer(&state, req.investor_id, &req.email).await?;

    let checkout_metadata = [
        (metadata::KIND, OrderKind::IdeaPurchase.to_string()),
        (metadata::INVESTOR_ID, req.investor_id.to_string()),
        (metadata::IDEA_ID, idea.id.to_string()),
    ];
    let params = CheckoutSessionParams {
        mode: CheckoutMode::Payment,
        product_name: format!("Idea: {}", idea.title),
        amount: IDEA_PRICE,
        success_url: state
            .config()
            .marketplace_url("/dashboard/investor?purchase=success"),
        cancel_url: state
            .config()
            .marketplace_url(&format!("/ideas/{}?error=checkout_canceled", idea.id)),
        customer: Some(&customer),
        customer_email: None,
        metadata: &checkout_metadata,
    };

    let session = state.stripe().create_checkout_session(&params).await?;
    let url = checkout_url(&session)?;

    OrderRepository::new(state.pool())
        .create(&NewOrder {
            stripe_session_id: &session.id,
            user_id: req.investor_id,
            kind: OrderKind::IdeaPurchase,
            idea_id: Some(idea.id),
            plan: None,
            amount: IDEA_PRICE,
        })
        .await?;

    Ok(Json(CheckoutResponse { url }))
}

/// POST /functions/create-partnership-payment
///
/// Create a checkout session for the partnership access fee. The NDA
/// signature travels in the session metadata so the payment can be tied
/// back to the signed agreement.
#[instrument(
    skip(state, req),
    fields(idea_id = req.idea_id.as_i32(), investor_id = req.investor_id.as_i32())
)]
pub async fn create_partnership_payment(
    State(state): State<AppState>,
    Json(req): Json<CreatePartnershipPaymentRequest>,
) -> Result<Json<CheckoutResponse>> {
    add_breadcrumb(
        "checkout",
        "Partnership payment requested",
        Some(&[("idea_id", &req.idea_id.to_string())]),
    );

    let idea = IdeaRepository::new(state.pool())
        .get(req.idea_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Idea not found".to_string()))?;

    if idea.ownership_mode != OwnershipMode::Partnership {
        return Err(AppError::BadRequest(
            "Idea is not open for partnership".to_string(),
        ));
    }
    if idea.created_by == req.investor_id {
        return Err(AppError::BadRequest(
            "You cannot partner on your own idea".to_string(),
        ));
    }

    let checkout_metadata = [
        (metadata::KIND, OrderKind::Partnership.to_string()),
        (metadata::INVESTOR_ID, req.investor_id.to_string()),
        (metadata::IDEA_ID, idea.id.to_string()),
        (metadata::INVESTOR_NAME, req.investor_name.clone()),
        (metadata::INVESTOR_EMAIL, req.investor_email.clone()),
        (metadata::NDA_SIGNATURE, req.nda_signature.clone()),
    ];
    // No customer object here: the NDA contact email may differ from the
    // investor's account email, and partnership fees should follow the
    // contact they gave on the agreement.
    let params = CheckoutSessionParams {
        mode: CheckoutMode::Payment,
        product_name: format!("Partnership access: {}", idea.title),
        amount: PARTNERSHIP_FEE,
        success_url: state
            .config()
            .marketplace_url(&format!("/ideas/{}/partner/message", idea.id)),
        cancel_url: state
            .config()
            .marketplace_url(&format!("/ideas/{}/partner/payment", idea.id)),
        customer: None,
        customer_email: Some(&req.investor_email),
        metadata: &checkout_metadata,
    };

    let session = state.stripe().create_checkout_session(&params).await?;
    let url = checkout_url(&session)?;

    OrderRepository::new(state.pool())
        .create(&NewOrder {
            stripe_session_id: &session.id,
            user_id: req.investor_id,
            kind: OrderKind::Partnership,
            idea_id: Some(idea.id),
            plan: None,
            amount: PARTNERSHIP_FEE,
        })
        .await?;

    Ok(Json(CheckoutResponse { url }))
}

/// POST /functions/create-payout-session
///
/// Start or continue Stripe Connect payout onboarding for a creator.
#[instrument(skip(state, req), fields(user_id = req.user_id.as_i32()))]
pub async fn create_payout_session(
    State(state): State<AppState>,
    Json(req): Json<CreatePayoutSessionRequest>,
) -> Result<Json<PayoutSessionResponse>> {
    if !state.config().stripe.connect_enabled {
        return Err(AppError::ServiceUnavailable {
            code: "STRIPE_CONNECT_NOT_ENABLED",
            message: "Payout onboarding is not enabled on this deployment".to_string(),
        });
    }

    add_breadcrumb("payouts", "Payout session requested", None);

    let accounts = PayoutAccountRepository::new(state.pool());

    let account = match accounts.get(req.user_id).await? {
        Some(account) => account,
        None => {
            let created = state.stripe().create_account(&req.email, req.user_id).await?;
            accounts.insert(req.user_id, &created.id).await?
        }
    };

    let mut onboarded = account.onboarding_complete;
    if !onboarded {
        // Re-check with Stripe: the account.updated webhook can lag the
        // creator's redirect back from onboarding
        let live = state
            .stripe()
            .retrieve_account(&account.stripe_account_id)
            .await?;
        if live.details_submitted {
            accounts.set_onboarding_complete(req.user_id, true).await?;
            onboarded = true;
        }
    }

    if onboarded {
        let login = state
            .stripe()
            .create_login_link(&account.stripe_account_id)
            .await?;
        return Ok(Json(PayoutSessionResponse {
            requires_onboarding: false,
            onboarding_url: None,
            url: Some(login.url),
        }));
    }

    let link = state
        .stripe()
        .create_account_link(
            &account.stripe_account_id,
            &state.config().marketplace_url("/wallet"),
            &state.config().marketplace_url("/wallet?success=payout_setup"),
        )
        .await?;

    Ok(Json(PayoutSessionResponse {
        requires_onboarding: true,
        onboarding_url: Some(link.url),
        url: None,
    }))
}

// =============================================================================
// Helpers
// =============================================================================

/// Map a plan to its checkout billing mode.
const fn checkout_mode(plan: PlanType) -> CheckoutMode {
    match plan {
        PlanType::Monthly => CheckoutMode::Subscription { interval_months: 1 },
        PlanType::Quarterly => CheckoutMode::Subscription { interval_months: 3 },
        PlanType::Lifetime => CheckoutMode::Payment,
    }
}

/// Pull the redirect URL out of a created session.
fn checkout_url(session: &crate::stripe::CheckoutSession) -> Result<String> {
    session
        .url
        .clone()
        .ok_or_else(|| AppError::Internal("checkout session missing redirect URL".to_string()))
}

/// Reuse the user's Stripe customer, creating one on first checkout.
async fn get_or_create_customer(
    state: &AppState,
    user_id: UserId,
    email: &str,
) -> Result<String> {
    let customers = CustomerRepository::new(state.pool());

    if let Some(existing) = customers.get(user_id).await? {
        return Ok(existing.stripe_customer_id);
    }

    let created = state.stripe().create_customer(email, user_id).await?;
    let stored = customers.upsert(user_id, &created.id, email).await?;
    Ok(stored.stripe_customer_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_mode_per_plan() {
        assert_eq!(
            checkout_mode(PlanType::Monthly),
            CheckoutMode::Subscription { interval_months: 1 }
        );
        assert_eq!(
            checkout_mode(PlanType::Quarterly),
            CheckoutMode::Subscription { interval_months: 3 }
        );
        assert_eq!(checkout_mode(PlanType::Lifetime), CheckoutMode::Payment);
    }

    #[test]
    fn test_payout_response_skips_absent_urls() {
        let response = PayoutSessionResponse {
            requires_onboarding: true,
            onboarding_url: Some("https://connect.stripe.com/setup/x".to_string()),
            url: None,
        };
        let json = serde_json::to_string(&response).unwrap_or_default();

        assert!(json.contains("\"requiresOnboarding\":true"));
        assert!(json.contains("\"onboardingUrl\""));
        assert!(!json.contains("\"url\""));
    }

    #[test]
    fn test_request_shapes_match_the_web_client() {
        let req: CreateCheckoutRequest = serde_json::from_str(
            r#"{"user_id": 7, "email": "kay@example.com", "plan": "quarterly"}"#,
        )
        .unwrap_or_else(|e| panic!("plan checkout request failed to parse: {e}"));
        assert_eq!(req.user_id.as_i32(), 7);
        assert_eq!(req.plan, PlanType::Quarterly);

        let req: CreatePartnershipPaymentRequest = serde_json::from_str(
            r#"{
                "idea_id": 3,
                "investor_id": 9,
                "investor_name": "Kay Chen",
                "investor_email": "kay@fund.example",
                "nda_signature": "Kay Chen"
            }"#,
        )
        .unwrap_or_else(|e| panic!("partnership request failed to parse: {e}"));
        assert_eq!(req.idea_id.as_i32(), 3);
        assert_eq!(req.nda_signature, "Kay Chen");
    }
}
