//! Stripe API object types.
//!
//! Only the fields this service reads are modeled; everything else in
//! Stripe's responses is ignored during deserialization.

use std::collections::HashMap;

use serde::Deserialize;

/// Keys used in checkout session metadata.
///
/// Metadata ties a Stripe payment back to marketplace entities and keeps
/// the signed NDA details on the payment record for auditing.
pub mod metadata {
    /// Order kind discriminator (`plan`, `idea_purchase`, `partnership`).
    pub const KIND: &str = "kind";
    /// Paying user's marketplace id.
    pub const USER_ID: &str = "user_id";
    /// Premium plan slug (`monthly`, `quarterly`, `lifetime`).
    pub const PLAN_TYPE: &str = "plan_type";
    /// Idea being bought or partnered on.
    pub const IDEA_ID: &str = "idea_id";
    /// Investor's marketplace id.
    pub const INVESTOR_ID: &str = "investor_id";
    /// Name the investor signed the NDA with.
    pub const INVESTOR_NAME: &str = "investor_name";
    /// Contact email the investor gave on the NDA.
    pub const INVESTOR_EMAIL: &str = "investor_email";
    /// The typed NDA signature.
    pub const NDA_SIGNATURE: &str = "nda_signature";
}

/// A checkout session, as returned at creation and inside webhook events.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted checkout URL. Present at creation, null once completed.
    #[serde(default)]
    pub url: Option<String>,
    /// Subscription created by the session (subscription mode only).
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    /// `paid`, `unpaid`, or `no_payment_required`. A completed session
    /// can still read `unpaid` for asynchronous payment methods.
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// A Stripe customer.
#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    pub id: String,
}

/// A Stripe Connect account, as returned by the API and inside
/// `account.updated` events.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub details_submitted: bool,
    #[serde(default)]
    pub payouts_enabled: bool,
}

/// An onboarding link for a Connect account. Single use, short lived.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountLink {
    pub url: String,
}

/// An Express dashboard login link for an onboarded Connect account.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginLink {
    pub url: String,
}

/// A subscription, as carried in `customer.subscription.*` events.
#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    pub id: String,
    /// Stripe's own status string (`active`, `past_due`, `canceled`, ...).
    pub status: String,
    /// End of the current billing period, as a Unix timestamp.
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

/// An invoice, as carried in `invoice.payment_*` events.
#[derive(Debug, Clone, Deserialize)]
pub struct Invoice {
    pub id: String,
    /// Subscription the invoice bills, when there is one.
    #[serde(default)]
    pub subscription: Option<String>,
}

/// A webhook event envelope.
///
/// `data.object` stays untyped here; handlers deserialize it into the
/// concrete object type once they have dispatched on `event_type`.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

/// The `data` member of a webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// Error envelope returned by the Stripe API on non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

/// The `error` member of an API error envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_session_at_creation() {
        let json = r#"{
            "id": "cs_test_a1",
            "object": "checkout.session",
            "url": "https://checkout.stripe.com/c/pay/cs_test_a1",
            "subscription": null,
            "payment_status": "unpaid",
            "metadata": {"kind": "idea_purchase", "idea_id": "7"}
        }"#;

        let session: CheckoutSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.id, "cs_test_a1");
        assert!(session.url.is_some());
        assert_eq!(session.payment_status.as_deref(), Some("unpaid"));
        assert_eq!(
            session.metadata.get(metadata::KIND).map(String::as_str),
            Some("idea_purchase")
        );
    }

    #[test]
    fn test_event_envelope() {
        let json = r#"{
            "id": "evt_1",
            "object": "event",
            "type": "checkout.session.completed",
            "data": {"object": {"id": "cs_test_a1", "metadata": {}}}
        }"#;

        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");

        let session: CheckoutSession = serde_json::from_value(event.data.object).unwrap();
        assert_eq!(session.id, "cs_test_a1");
        assert!(session.url.is_none());
    }

    #[test]
    fn test_subscription_event_object() {
        let json = r#"{
            "id": "sub_1",
            "status": "past_due",
            "current_period_end": 1767225600
        }"#;

        let sub: Subscription = serde_json::from_str(json).unwrap();
        assert_eq!(sub.status, "past_due");
        assert_eq!(sub.current_period_end, Some(1_767_225_600));
    }

    #[test]
    fn test_invoice_event_object() {
        let json = r#"{
            "id": "in_1",
            "object": "invoice",
            "subscription": "sub_1"
        }"#;

        let invoice: Invoice = serde_json::from_str(json).unwrap();
        assert_eq!(invoice.subscription.as_deref(), Some("sub_1"));

        let one_off: Invoice = serde_json::from_str(r#"{"id": "in_2"}"#).unwrap();
        assert!(one_off.subscription.is_none());
    }

    #[test]
    fn test_api_error_envelope() {
        let json = r#"{
            "error": {
                "message": "No such customer: cus_x",
                "type": "invalid_request_error"
            }
        }"#;

        let envelope: ApiErrorEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(
            envelope.error.message.as_deref(),
            Some("No such customer: cus_x")
        );
        assert_eq!(
            envelope.error.error_type.as_deref(),
            Some("invalid_request_error")
        );
    }
}
