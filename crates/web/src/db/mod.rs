//! Database operations for the marketplace `PostgreSQL`.
//!
//! # Tables
//!
//! - `users` - Accounts with optional role (creator/investor) and premium flag
//! - `sessions` - Session storage (managed by tower-sessions)
//! - `ideas` - Published ideas with ownership mode and mint state
//! - `comments` - Idea comments
//! - `upvotes` - One row per (idea, user) upvote
//! - `creator_wallets` - Cent-denominated earnings balances
//! - `wallet_transactions` - Credit/debit ledger (keyed by Stripe session for sales)
//! - `withdrawal_requests` - Pending/processed withdrawals with masked bank details
//! - `partnership_requests` - NDA-backed partnership requests
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p idea-hub-cli -- migrate
//! ```

pub mod ideas;
pub mod partnerships;
pub mod users;
pub mod wallets;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use ideas::{CreatorTotals, FeedFilter, IdeaRepository, NewIdea};
pub use partnerships::PartnershipRepository;
pub use users::UserRepository;
pub use wallets::WalletRepository;

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

    /// Constraint violation (e.g., unique email).
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
