//! Stripe webhook endpoint.
//!
//! Deliveries are authenticated by signature, never by service key.
//! Handlers are safe to replay: fulfillment runs first against the
//! still-pending order and only then flips it, so an error anywhere
//! returns non-2xx and Stripe's retry repeats the idempotent writes.
//!
//! Events handled:
//! - `checkout.session.completed` / `.async_payment_succeeded` - apply
//!   fulfillment for the order once the session reads paid
//! - `checkout.session.expired` - expire the pending order
//! - `customer.subscription.created` / `.updated` / `.deleted` - track
//!   plan lifecycle and flip premium with it
//! - `invoice.payment_succeeded` / `.payment_failed` - billing renewals
//! - `account.updated` - track Connect onboarding state
//! - `payment_intent.succeeded` - logged only; orders are resolved at
//!   session completion

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chrono::{DateTime, Utc};
use tracing::instrument;

use idea_hub_core::OrderKind;

use crate::db::{
    FulfillmentRepository, MintOutcome, Order, OrderRepository, OrderStatus,
    PayoutAccountRepository, SubscriptionRepository, SubscriptionStatus,
};
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::stripe::{
    Account, CheckoutSession, Event, Invoice, Subscription as StripeSubscription, construct_event,
};

/// POST /webhooks/stripe
#[instrument(skip(state, headers, body))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing Stripe-Signature header".to_string()))?;

    let event = construct_event(&body, signature, &state.config().stripe.webhook_secret)
        .map_err(|e| {
            tracing::warn!(error = %e, "rejected webhook delivery");
            AppError::BadRequest("Invalid webhook signature".to_string())
        })?;

    let Event {
        id,
        event_type,
        data,
    } = event;
    tracing::debug!(event_id = %id, event_type = %event_type, "webhook received");

    match event_type.as_str() {
        "checkout.session.completed" | "checkout.session.async_payment_succeeded" => {
            handle_checkout_completed(&state, data.object).await?;
        }
        "checkout.session.expired" => handle_checkout_expired(&state, data.object).await?,
        "customer.subscription.created"
        | "customer.subscription.updated"
        | "customer.subscription.deleted" => {
            handle_subscription_change(&state, data.object).await?;
        }
        "invoice.payment_succeeded" => handle_invoice_paid(&state, data.object).await?,
        "invoice.payment_failed" => {
            let invoice: Invoice = parse_object(data.object)?;
            // Stripe's dunning owns the grace period; the subscription
            // lifecycle events carry any resulting status change
            tracing::warn!(invoice_id = %invoice.id, "invoice payment failed");
        }
        "account.updated" => handle_account_updated(&state, data.object).await?,
        "payment_intent.succeeded" => {
            tracing::debug!(event_id = %id, "payment intent succeeded");
        }
        other => {
            tracing::debug!(event_type = %other, "ignoring unhandled webhook event");
        }
    }

    Ok(StatusCode::OK)
}

// =============================================================================
// Event Handlers
// =============================================================================

async fn handle_checkout_completed(state: &AppState, object: serde_json::Value) -> Result<()> {
    let session: CheckoutSession = parse_object(object)?;

    // Asynchronous payment methods complete the session before the
    // money moves. Leave the order pending; the
    // `async_payment_succeeded` delivery comes back through here once
    // the session reads paid.
    if !session_is_paid(&session) {
        tracing::info!(
            session_id = %session.id,
            payment_status = session.payment_status.as_deref().unwrap_or("unknown"),
            "session completed but not paid; order stays pending"
        );
        return Ok(());
    }

    let orders = OrderRepository::new(state.pool());
    let Some(order) = orders.get_by_session(&session.id).await? else {
        tracing::warn!(session_id = %session.id, "completed session has no order; ignoring");
        return Ok(());
    };
    if order.status != OrderStatus::Pending {
        tracing::info!(
            session_id = %session.id,
            status = %order.status,
            "order already resolved; ignoring re-delivery"
        );
        return Ok(());
    }

    match order.kind {
        OrderKind::Plan => fulfill_plan(state, &order, &session).await?,
        OrderKind::IdeaPurchase => fulfill_idea_purchase(state, &order).await?,
        OrderKind::Partnership => fulfill_partnership(state, &order).await?,
    }

    orders.mark_completed(&session.id).await?;
    tracing::info!(
        order_id = order.id.as_i32(),
        kind = %order.kind,
        amount = %order.amount,
        "order completed"
    );

    Ok(())
}

async fn fulfill_plan(state: &AppState, order: &Order, session: &CheckoutSession) -> Result<()> {
    let Some(plan) = order.plan else {
        return Err(AppError::Internal(format!(
            "plan order {} has no plan recorded",
            order.id.as_i32()
        )));
    };

    // The session only carries the subscription id; pull the first
    // billing period end from the subscription itself
    let current_period_end = match session.subscription.as_deref() {
        Some(subscription_id) => {
            let subscription = state.stripe().retrieve_subscription(subscription_id).await?;
            period_end(subscription.current_period_end)
        }
        None => None,
    };

    FulfillmentRepository::new(state.pool())
        .fulfill_plan_purchase(
            order.user_id,
            plan,
            session.subscription.as_deref(),
            current_period_end,
        )
        .await?;

    tracing::info!(
        user_id = order.user_id.as_i32(),
        plan = %plan,
        "premium plan fulfilled"
    );
    Ok(())
}

async fn fulfill_idea_purchase(state: &AppState, order: &Order) -> Result<()> {
    let Some(idea_id) = order.idea_id else {
        return Err(AppError::Internal(format!(
            "idea purchase order {} has no idea recorded",
            order.id.as_i32()
        )));
    };

    let outcome = FulfillmentRepository::new(state.pool())
        .fulfill_idea_purchase(&order.stripe_session_id, idea_id, order.user_id, order.amount)
        .await?;

    match outcome {
        MintOutcome::Minted { creator_id, net } => {
            tracing::info!(
                idea_id = idea_id.as_i32(),
                buyer_id = order.user_id.as_i32(),
                creator_id = creator_id.as_i32(),
                net = %net,
                "idea sale fulfilled"
            );
        }
        MintOutcome::AlreadyMinted => {
            // Payment went through but somebody else owns the idea.
            // Needs a manual refund, so make it loud.
            tracing::error!(
                session_id = %order.stripe_session_id,
                idea_id = idea_id.as_i32(),
                buyer_id = order.user_id.as_i32(),
                "paid idea purchase lost the mint race; refund required"
            );
            sentry::capture_message(
                &format!(
                    "Idea {} sold twice: session {} needs a refund",
                    idea_id.as_i32(),
                    order.stripe_session_id
                ),
                sentry::Level::Error,
            );
        }
    }

    Ok(())
}

async fn fulfill_partnership(state: &AppState, order: &Order) -> Result<()> {
    let Some(idea_id) = order.idea_id else {
        return Err(AppError::Internal(format!(
            "partnership order {} has no idea recorded",
            order.id.as_i32()
        )));
    };

    let credited = FulfillmentRepository::new(state.pool())
        .fulfill_partnership_fee(&order.stripe_session_id, idea_id, order.amount)
        .await?;

    if credited {
        tracing::info!(
            idea_id = idea_id.as_i32(),
            investor_id = order.user_id.as_i32(),
            "partnership fee credited"
        );
    } else {
        tracing::warn!(
            session_id = %order.stripe_session_id,
            idea_id = idea_id.as_i32(),
            "partnership fee not credited (idea gone or duplicate delivery)"
        );
    }

    Ok(())
}

async fn handle_checkout_expired(state: &AppState, object: serde_json::Value) -> Result<()> {
    let session: CheckoutSession = parse_object(object)?;

    let expired = OrderRepository::new(state.pool())
        .mark_expired(&session.id)
        .await?;

    if expired {
        tracing::info!(session_id = %session.id, "order expired without payment");
    } else {
        tracing::debug!(session_id = %session.id, "expired session has no pending order");
    }

    Ok(())
}

async fn handle_subscription_change(state: &AppState, object: serde_json::Value) -> Result<()> {
    let subscription: StripeSubscription = parse_object(object)?;

    let Some(status) = SubscriptionStatus::from_stripe(&subscription.status) else {
        tracing::debug!(
            subscription_id = %subscription.id,
            status = %subscription.status,
            "ignoring transient subscription status"
        );
        return Ok(());
    };

    let Some(record) = SubscriptionRepository::new(state.pool())
        .update_status_by_stripe_id(
            &subscription.id,
            status,
            period_end(subscription.current_period_end),
        )
        .await?
    else {
        tracing::debug!(
            subscription_id = %subscription.id,
            "subscription not recorded here; ignoring"
        );
        return Ok(());
    };

    tracing::info!(
        user_id = record.user_id.as_i32(),
        status = %status,
        "subscription status updated"
    );

    if status == SubscriptionStatus::Active {
        FulfillmentRepository::new(state.pool())
            .set_premium(record.user_id, true)
            .await?;
        return Ok(());
    }

    // Past-due keeps premium while Stripe retries the charge; only a
    // full cancellation can revoke, and lifetime owners and holders of
    // another active subscription keep their premium regardless
    if status == SubscriptionStatus::Canceled {
        let keeps_premium = OrderRepository::new(state.pool())
            .has_completed_lifetime(record.user_id)
            .await?
            || SubscriptionRepository::new(state.pool())
                .user_has_active(record.user_id)
                .await?;

        if !keeps_premium {
            FulfillmentRepository::new(state.pool())
                .set_premium(record.user_id, false)
                .await?;
            tracing::info!(
                user_id = record.user_id.as_i32(),
                "premium revoked after cancellation"
            );
        }
    }

    Ok(())
}

async fn handle_invoice_paid(state: &AppState, object: serde_json::Value) -> Result<()> {
    let invoice: Invoice = parse_object(object)?;

    // A paid renewal confirms the subscriber is in good standing, even
    // if the matching subscription.updated delivery is late or lost
    let Some(subscription_id) = invoice.subscription.as_deref() else {
        tracing::debug!(invoice_id = %invoice.id, "invoice has no subscription; ignoring");
        return Ok(());
    };

    let Some(record) = SubscriptionRepository::new(state.pool())
        .get_by_stripe_id(subscription_id)
        .await?
    else {
        tracing::debug!(
            subscription_id = %subscription_id,
            "invoice for a subscription not recorded here; ignoring"
        );
        return Ok(());
    };

    FulfillmentRepository::new(state.pool())
        .set_premium(record.user_id, true)
        .await?;
    tracing::info!(
        user_id = record.user_id.as_i32(),
        invoice_id = %invoice.id,
        "premium confirmed by paid invoice"
    );

    Ok(())
}

async fn handle_account_updated(state: &AppState, object: serde_json::Value) -> Result<()> {
    let account: Account = parse_object(object)?;

    let updated = PayoutAccountRepository::new(state.pool())
        .set_onboarding_complete_by_account(&account.id, account.details_submitted)
        .await?;

    if updated {
        tracing::info!(
            account_id = %account.id,
            complete = account.details_submitted,
            "payout onboarding state updated"
        );
    } else {
        tracing::debug!(account_id = %account.id, "account not recorded here; ignoring");
    }

    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

/// Deserialize the event's embedded object.
fn parse_object<T: serde::de::DeserializeOwned>(object: serde_json::Value) -> Result<T> {
    serde_json::from_value(object)
        .map_err(|e| AppError::BadRequest(format!("malformed event object: {e}")))
}

/// Whether a checkout session's payment has actually settled.
fn session_is_paid(session: &CheckoutSession) -> bool {
    matches!(
        session.payment_status.as_deref(),
        Some("paid" | "no_payment_required")
    )
}

/// Convert a Unix timestamp from Stripe to a `DateTime`.
fn period_end(timestamp: Option<i64>) -> Option<DateTime<Utc>> {
    timestamp.and_then(|secs| DateTime::from_timestamp(secs, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_end_conversion() {
        let converted = period_end(Some(1_735_689_600));
        assert_eq!(
            converted.map(|dt| dt.to_rfc3339()),
            Some("2025-01-01T00:00:00+00:00".to_string())
        );
        assert_eq!(period_end(None), None);
    }

    #[test]
    fn test_parse_object_checkout_session() {
        let object = serde_json::json!({
            "id": "cs_test_a1",
            "metadata": {"kind": "plan", "user_id": "7"}
        });
        let session: CheckoutSession =
            parse_object(object).unwrap_or_else(|e| panic!("session failed to parse: {e}"));
        assert_eq!(session.id, "cs_test_a1");
        assert_eq!(session.metadata.get("kind").map(String::as_str), Some("plan"));
    }

    #[test]
    fn test_session_paid_gate() {
        let paid: CheckoutSession = parse_object(serde_json::json!({
            "id": "cs_1", "payment_status": "paid", "metadata": {}
        }))
        .unwrap_or_else(|e| panic!("session failed to parse: {e}"));
        assert!(session_is_paid(&paid));

        let free: CheckoutSession = parse_object(serde_json::json!({
            "id": "cs_2", "payment_status": "no_payment_required", "metadata": {}
        }))
        .unwrap_or_else(|e| panic!("session failed to parse: {e}"));
        assert!(session_is_paid(&free));

        // A completed delivery for a delayed-settlement method still
        // reads unpaid; fulfillment must wait for the money.
        let unpaid: CheckoutSession = parse_object(serde_json::json!({
            "id": "cs_3", "payment_status": "unpaid", "metadata": {}
        }))
        .unwrap_or_else(|e| panic!("session failed to parse: {e}"));
        assert!(!session_is_paid(&unpaid));

        let missing: CheckoutSession = parse_object(serde_json::json!({
            "id": "cs_4", "metadata": {}
        }))
        .unwrap_or_else(|e| panic!("session failed to parse: {e}"));
        assert!(!session_is_paid(&missing));
    }

    #[test]
    fn test_parse_object_rejects_wrong_shape() {
        let object = serde_json::json!({"object": "balance"});
        let result: Result<CheckoutSession> = parse_object(object);
        assert!(result.is_err());
    }
}
