//! HTTP client for the payments service.
//!
//! All checkout sessions are created by the payments service; this client
//! wraps its function endpoints. Requests carry the shared service key as
//! a bearer token.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use idea_hub_core::{Email, IdeaId, PlanType, UserId};

use crate::config::PaymentsServiceConfig;

/// Errors that can occur when calling the payments service.
#[derive(Debug, Error)]
pub enum PaymentsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The payments service returned an error response.
    #[error("payments service error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Stripe Connect is not enabled on the platform account.
    #[error("payout onboarding is not available")]
    ConnectNotEnabled,

    /// Failed to parse a response body.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Outcome of a payout session request.
///
/// First-time callers get an onboarding link; callers with a fully
/// onboarded Connect account get a checkout session.
#[derive(Debug)]
pub enum PayoutSession {
    /// The user must complete Stripe Connect onboarding first.
    Onboarding { url: String },
    /// Checkout session with the payout destination attached.
    Checkout { url: String },
}

/// Client for the payments service function endpoints.
#[derive(Clone)]
pub struct PaymentsClient {
    client: reqwest::Client,
    base_url: String,
}

impl PaymentsClient {
    /// Create a new payments service client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &PaymentsServiceConfig) -> Result<Self, PaymentsError> {
        let mut headers = HeaderMap::new();

        // Service key authorization
        let auth_value = format!("Bearer {}", config.service_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| PaymentsError::Parse(format!("Invalid service key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a premium plan checkout session.
    ///
    /// Returns the Stripe checkout URL to redirect the user to.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    pub async fn create_plan_checkout(
        &self,
        user_id: UserId,
        email: &Email,
        plan: PlanType,
    ) -> Result<String, PaymentsError> {
        let url = format!("{}/functions/create-checkout", self.base_url);

        let body = serde_json::json!({
            "user_id": user_id.as_i32(),
            "email": email.as_str(),
            "plan": plan,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CheckoutResponse = response
            .json()
            .await
            .map_err(|e| PaymentsError::Parse(e.to_string()))?;

        Ok(parsed.url)
    }

    /// Create a checkout session to buy an idea outright.
    ///
    /// Returns the Stripe checkout URL to redirect the buyer to. The
    /// payments service validates that the idea is for sale, unminted,
    /// and not being bought by its own creator.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the idea is not purchasable.
    pub async fn create_idea_checkout(
        &self,
        idea_id: IdeaId,
        buyer_id: UserId,
        buyer_email: &Email,
    ) -> Result<String, PaymentsError> {
        let url = format!("{}/functions/create-wallet-purchase", self.base_url);

        let body = serde_json::json!({
            "idea_id": idea_id.as_i32(),
            "investor_id": buyer_id.as_i32(),
            "email": buyer_email.as_str(),
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CheckoutResponse = response
            .json()
            .await
            .map_err(|e| PaymentsError::Parse(e.to_string()))?;

        Ok(parsed.url)
    }

    /// Create a partnership access fee checkout session.
    ///
    /// The NDA signature and investor contact details travel in the
    /// session metadata so the payment record can be tied back to the
    /// signed agreement. The request row itself is written by the web
    /// process once the investor finishes the wizard.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the idea is not open
    /// for partnership.
    pub async fn create_partnership_checkout(
        &self,
        idea_id: IdeaId,
        investor_id: UserId,
        investor_name: &str,
        investor_email: &str,
        nda_signature: &str,
    ) -> Result<String, PaymentsError> {
        let url = format!("{}/functions/create-partnership-payment", self.base_url);

        let body = serde_json::json!({
            "idea_id": idea_id.as_i32(),
            "investor_id": investor_id.as_i32(),
            "investor_name": investor_name,
            "investor_email": investor_email,
            "nda_signature": nda_signature,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CheckoutResponse = response
            .json()
            .await
            .map_err(|e| PaymentsError::Parse(e.to_string()))?;

        Ok(parsed.url)
    }

    /// Create or continue a Stripe Connect payout session.
    ///
    /// # Errors
    ///
    /// Returns `PaymentsError::ConnectNotEnabled` when the platform account
    /// has Connect disabled, or another error if the request fails.
    pub async fn create_payout_session(
        &self,
        user_id: UserId,
        email: &Email,
    ) -> Result<PayoutSession, PaymentsError> {
        let url = format!("{}/functions/create-payout-session", self.base_url);

        let body = serde_json::json!({
            "user_id": user_id.as_i32(),
            "email": email.as_str(),
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();

            // The service signals a disabled Connect platform with a
            // dedicated error code
            if status.as_u16() == 503
                && let Ok(err) = serde_json::from_str::<ErrorResponse>(&message)
                && err.code.as_deref() == Some("STRIPE_CONNECT_NOT_ENABLED")
            {
                return Err(PaymentsError::ConnectNotEnabled);
            }

            return Err(PaymentsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: PayoutSessionResponse = response
            .json()
            .await
            .map_err(|e| PaymentsError::Parse(e.to_string()))?;

        if parsed.requires_onboarding {
            let url = parsed.onboarding_url.ok_or_else(|| {
                PaymentsError::Parse("onboarding response missing onboardingUrl".to_string())
            })?;
            return Ok(PayoutSession::Onboarding { url });
        }

        let url = parsed
            .url
            .ok_or_else(|| PaymentsError::Parse("checkout response missing url".to_string()))?;
        Ok(PayoutSession::Checkout { url })
    }
}

/// Checkout session response.
#[derive(Debug, Deserialize)]
struct CheckoutResponse {
    url: String,
}

/// Payout session response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayoutSessionResponse {
    #[serde(default)]
    requires_onboarding: bool,
    onboarding_url: Option<String>,
    url: Option<String>,
}

/// Error body returned by the payments service.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[allow(dead_code)]
    error: Option<String>,
    code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payout_response_onboarding() {
        let json = r#"{"requiresOnboarding": true, "onboardingUrl": "https://connect.stripe.com/setup/x"}"#;
        let parsed: PayoutSessionResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.requires_onboarding);
        assert_eq!(
            parsed.onboarding_url.as_deref(),
            Some("https://connect.stripe.com/setup/x")
        );
    }

    #[test]
    fn test_payout_response_checkout() {
        let json = r#"{"url": "https://checkout.stripe.com/c/pay/x"}"#;
        let parsed: PayoutSessionResponse = serde_json::from_str(json).unwrap();
        assert!(!parsed.requires_onboarding);
        assert_eq!(parsed.url.as_deref(), Some("https://checkout.stripe.com/c/pay/x"));
    }

    #[test]
    fn test_error_response_code() {
        let json = r#"{"error": "Connect not enabled", "code": "STRIPE_CONNECT_NOT_ENABLED"}"#;
        let parsed: ErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.code.as_deref(), Some("STRIPE_CONNECT_NOT_ENABLED"));
    }
}
