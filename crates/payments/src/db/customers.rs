//! Stripe customer mapping repository.
//!
//! One row per marketplace user who has reached a checkout page. The
//! first Stripe customer created for a user is kept for life; repeat
//! checkouts reuse it so payment history stays on one Stripe object.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use idea_hub_core::UserId;

use super::RepositoryError;

/// A marketplace user's Stripe customer mapping.
#[derive(Debug, Clone)]
pub struct StripeCustomer {
    pub user_id: UserId,
    pub stripe_customer_id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    user_id: i32,
    stripe_customer_id: String,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for StripeCustomer {
    fn from(row: CustomerRow) -> Self {
        Self {
            user_id: UserId::new(row.user_id),
            stripe_customer_id: row.stripe_customer_id,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const CUSTOMER_COLUMNS: &str = "user_id, stripe_customer_id, email, created_at, updated_at";

/// Repository for Stripe customer mappings.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the Stripe customer mapping for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Option<StripeCustomer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE user_id = $1"
        ))
        .bind(user_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Record a freshly created Stripe customer for a user.
    ///
    /// If two checkouts race, the row written first wins and its
    /// `stripe_customer_id` is returned; the loser's Stripe customer is
    /// simply never referenced again.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        user_id: UserId,
        stripe_customer_id: &str,
        email: &str,
    ) -> Result<StripeCustomer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "INSERT INTO customers (user_id, stripe_customer_id, email)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(user_id.as_i32())
        .bind(stripe_customer_id)
        .bind(email)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
