//! Stripe-related errors.

use thiserror::Error;

/// Errors that can occur when interacting with the Stripe API.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("Stripe request failed: {0}")]
    Request(String),

    /// Failed to parse a response body.
    #[error("Stripe response error: {0}")]
    Response(String),

    /// Stripe API returned an error.
    #[error("Stripe API error ({status}): {message}")]
    Api { status: u16, message: String },
}

/// Errors that can occur when verifying a webhook delivery.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The `Stripe-Signature` header is missing pieces or unparseable.
    #[error("malformed signature header: {0}")]
    MalformedHeader(String),

    /// The delivery timestamp is outside the replay tolerance.
    #[error("signature timestamp outside tolerance")]
    StaleTimestamp,

    /// No candidate signature matched the payload.
    #[error("signature mismatch")]
    SignatureMismatch,

    /// The payload is not a valid event.
    #[error("invalid event payload: {0}")]
    Payload(String),
}
