//! Stripe integration.
//!
//! A thin client over the REST endpoints this service needs plus
//! webhook signature verification. The full Stripe surface is huge;
//! everything here is limited to Checkout, Customers, and Connect
//! Express payouts.

mod client;
mod error;
mod types;
mod webhook;

pub use client::{CheckoutMode, CheckoutSessionParams, StripeClient};
pub use error::{StripeError, WebhookError};
pub use types::{
    Account, AccountLink, CheckoutSession, Customer, Event, EventData, Invoice, LoginLink,
    Subscription, metadata,
};
pub use webhook::{construct_event, verify_signature};
