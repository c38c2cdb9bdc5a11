//! Stripe REST API client.
//!
//! Covers the slice of the API this service uses: Checkout Sessions,
//! Customers, and Connect Express accounts. Requests are form-encoded
//! per Stripe's convention and pinned to a fixed API version.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;

use idea_hub_core::{Cents, UserId};

use super::error::StripeError;
use super::types::{
    Account, AccountLink, ApiErrorEnvelope, CheckoutSession, Customer, LoginLink, Subscription,
};

/// Stripe REST API base URL.
const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Pinned API version, sent on every request so Stripe-side account
/// upgrades cannot change response shapes under us.
const STRIPE_API_VERSION: &str = "2024-06-20";

/// Stripe API client.
///
/// Cheap to clone; the underlying `reqwest::Client` shares its
/// connection pool across clones.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    secret_key: SecretString,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("secret_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// How a checkout session bills the payer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutMode {
    /// One-time payment.
    Payment,
    /// Recurring subscription billed every `interval_months` months.
    Subscription { interval_months: u8 },
}

/// Parameters for creating a Checkout Session with a single inline
/// price. The marketplace never uses pre-created Stripe prices.
#[derive(Debug)]
pub struct CheckoutSessionParams<'a> {
    pub mode: CheckoutMode,
    /// Product name shown on the hosted checkout page.
    pub product_name: String,
    pub amount: Cents,
    pub success_url: String,
    pub cancel_url: String,
    /// Existing Stripe customer to attach the session to.
    pub customer: Option<&'a str>,
    /// Prefilled email for sessions without a customer object.
    pub customer_email: Option<&'a str>,
    /// Metadata echoed back on the webhook event.
    pub metadata: &'a [(&'static str, String)],
}

impl StripeClient {
    /// Create a new Stripe API client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created. This should never
    /// happen under normal circumstances as we use standard TLS
    /// configuration.
    #[must_use]
    pub fn new(secret_key: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, secret_key }
    }

    // =========================================================================
    // Checkout Sessions
    // =========================================================================

    /// Create a hosted Checkout Session.
    ///
    /// # Errors
    ///
    /// Returns `StripeError` on network failure or if Stripe rejects the
    /// parameters.
    #[instrument(skip(self, params), fields(mode = ?params.mode))]
    pub async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams<'_>,
    ) -> Result<CheckoutSession, StripeError> {
        let mut form = vec![
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                "usd".to_string(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                params.amount.as_i64().to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                params.product_name.clone(),
            ),
            ("success_url".to_string(), params.success_url.clone()),
            ("cancel_url".to_string(), params.cancel_url.clone()),
        ];

        match params.mode {
            CheckoutMode::Payment => {
                form.push(("mode".to_string(), "payment".to_string()));
            }
            CheckoutMode::Subscription { interval_months } => {
                form.push(("mode".to_string(), "subscription".to_string()));
                form.push((
                    "line_items[0][price_data][recurring][interval]".to_string(),
                    "month".to_string(),
                ));
                form.push((
                    "line_items[0][price_data][recurring][interval_count]".to_string(),
                    interval_months.to_string(),
                ));
            }
        }

        if let Some(customer) = params.customer {
            form.push(("customer".to_string(), customer.to_string()));
        }
        if let Some(email) = params.customer_email {
            form.push(("customer_email".to_string(), email.to_string()));
        }
        for (key, value) in params.metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }

        self.post_form("/checkout/sessions", &form).await
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Create a Stripe customer tagged with the marketplace user id.
    ///
    /// # Errors
    ///
    /// Returns `StripeError` on network failure or an API error.
    #[instrument(skip(self))]
    pub async fn create_customer(
        &self,
        email: &str,
        user_id: UserId,
    ) -> Result<Customer, StripeError> {
        let form = vec![
            ("email".to_string(), email.to_string()),
            ("metadata[user_id]".to_string(), user_id.to_string()),
        ];

        self.post_form("/customers", &form).await
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Fetch a subscription's current state.
    ///
    /// Used at plan fulfillment to record the first billing period end;
    /// the checkout session only carries the subscription id.
    ///
    /// # Errors
    ///
    /// Returns `StripeError` on network failure or an API error.
    #[instrument(skip(self))]
    pub async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Subscription, StripeError> {
        self.get_json(&format!("/subscriptions/{subscription_id}"))
            .await
    }

    // =========================================================================
    // Connect Express accounts
    // =========================================================================

    /// Create a Connect Express account for creator payouts.
    ///
    /// # Errors
    ///
    /// Returns `StripeError` on network failure or an API error, including
    /// when Connect is not enabled on the platform account.
    #[instrument(skip(self))]
    pub async fn create_account(
        &self,
        email: &str,
        user_id: UserId,
    ) -> Result<Account, StripeError> {
        let form = vec![
            ("type".to_string(), "express".to_string()),
            ("email".to_string(), email.to_string()),
            ("metadata[user_id]".to_string(), user_id.to_string()),
        ];

        self.post_form("/accounts", &form).await
    }

    /// Create a one-time onboarding link for an Express account.
    ///
    /// # Errors
    ///
    /// Returns `StripeError` on network failure or an API error.
    #[instrument(skip(self, refresh_url, return_url))]
    pub async fn create_account_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<AccountLink, StripeError> {
        let form = vec![
            ("account".to_string(), account_id.to_string()),
            ("refresh_url".to_string(), refresh_url.to_string()),
            ("return_url".to_string(), return_url.to_string()),
            ("type".to_string(), "account_onboarding".to_string()),
        ];

        self.post_form("/account_links", &form).await
    }

    /// Create a login link to the Express dashboard for an onboarded
    /// account.
    ///
    /// # Errors
    ///
    /// Returns `StripeError` on network failure or an API error.
    #[instrument(skip(self))]
    pub async fn create_login_link(&self, account_id: &str) -> Result<LoginLink, StripeError> {
        self.post_form(&format!("/accounts/{account_id}/login_links"), &[])
            .await
    }

    /// Fetch the current state of an Express account.
    ///
    /// # Errors
    ///
    /// Returns `StripeError` on network failure or an API error.
    #[instrument(skip(self))]
    pub async fn retrieve_account(&self, account_id: &str) -> Result<Account, StripeError> {
        self.get_json(&format!("/accounts/{account_id}")).await
    }

    // =========================================================================
    // Transport
    // =========================================================================

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, StripeError> {
        let response = self
            .client
            .post(format!("{STRIPE_API_BASE}{path}"))
            .bearer_auth(self.secret_key.expose_secret())
            .header("Stripe-Version", STRIPE_API_VERSION)
            .form(form)
            .send()
            .await
            .map_err(|e| StripeError::Request(e.to_string()))?;

        Self::read_response(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, StripeError> {
        let response = self
            .client
            .get(format!("{STRIPE_API_BASE}{path}"))
            .bearer_auth(self.secret_key.expose_secret())
            .header("Stripe-Version", STRIPE_API_VERSION)
            .send()
            .await
            .map_err(|e| StripeError::Request(e.to_string()))?;

        Self::read_response(response).await
    }

    async fn read_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StripeError::Request(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.error.message)
                .unwrap_or_else(|| body.clone());
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| StripeError::Response(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret_key() {
        let client = StripeClient::new(SecretString::from("sk_test_abc123".to_string()));
        let debug = format!("{client:?}");
        assert!(!debug.contains("sk_test_abc123"));
        assert!(debug.contains("[REDACTED]"));
    }
}
