//! Database operations for the payments service.
//!
//! The service shares one `PostgreSQL` database with the marketplace
//! web process but owns a disjoint set of tables.
//!
//! # Tables owned by this service
//!
//! - `customers` - Marketplace user to Stripe customer mapping
//! - `orders` - One row per checkout session, keyed by session id
//! - `subscriptions` - Premium plan subscriptions and their Stripe status
//! - `payout_accounts` - Connect Express accounts for creator payouts
//!
//! Webhook fulfillment additionally writes marketplace tables (`users`,
//! `ideas`, `creator_wallets`, `wallet_transactions`) inside a single
//! transaction; see [`fulfillment`].
//!
//! # Migrations
//!
//! All tables live in the shared `crates/web/migrations/` directory and
//! run via:
//! ```bash
//! cargo run -p idea-hub-cli -- migrate
//! ```

pub mod customers;
pub mod fulfillment;
pub mod ideas;
pub mod orders;
pub mod payout_accounts;
pub mod subscriptions;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use customers::{CustomerRepository, StripeCustomer};
pub use fulfillment::{FulfillmentRepository, MintOutcome};
pub use ideas::{IdeaRepository, IdeaSnapshot};
pub use orders::{NewOrder, Order, OrderRepository, OrderStatus};
pub use payout_accounts::{PayoutAccount, PayoutAccountRepository};
pub use subscriptions::{Subscription, SubscriptionRepository, SubscriptionStatus};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate checkout session).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
