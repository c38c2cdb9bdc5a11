//! Connect payout account repository.
//!
//! One row per creator who has started Express onboarding. The
//! `onboarding_complete` flag mirrors Stripe's `details_submitted` and
//! is refreshed both from `account.updated` webhooks and on demand when
//! a creator re-opens the payout flow.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use idea_hub_core::UserId;

use super::RepositoryError;

/// A creator's Connect Express account.
#[derive(Debug, Clone)]
pub struct PayoutAccount {
    pub user_id: UserId,
    pub stripe_account_id: String,
    pub onboarding_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct PayoutAccountRow {
    user_id: i32,
    stripe_account_id: String,
    onboarding_complete: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PayoutAccountRow> for PayoutAccount {
    fn from(row: PayoutAccountRow) -> Self {
        Self {
            user_id: UserId::new(row.user_id),
            stripe_account_id: row.stripe_account_id,
            onboarding_complete: row.onboarding_complete,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PAYOUT_ACCOUNT_COLUMNS: &str =
    "user_id, stripe_account_id, onboarding_complete, created_at, updated_at";

/// Repository for Connect payout accounts.
pub struct PayoutAccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PayoutAccountRepository<'a> {
    /// Create a new payout account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a creator's payout account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Option<PayoutAccount>, RepositoryError> {
        let row = sqlx::query_as::<_, PayoutAccountRow>(&format!(
            "SELECT {PAYOUT_ACCOUNT_COLUMNS} FROM payout_accounts WHERE user_id = $1"
        ))
        .bind(user_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Record a freshly created Express account for a creator.
    ///
    /// If two payout setups race, the first row wins and is returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert(
        &self,
        user_id: UserId,
        stripe_account_id: &str,
    ) -> Result<PayoutAccount, RepositoryError> {
        let row = sqlx::query_as::<_, PayoutAccountRow>(&format!(
            "INSERT INTO payout_accounts (user_id, stripe_account_id)
             VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
             RETURNING {PAYOUT_ACCOUNT_COLUMNS}"
        ))
        .bind(user_id.as_i32())
        .bind(stripe_account_id)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Mark onboarding state for a creator.
    ///
    /// Returns `true` if a row was updated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_onboarding_complete(
        &self,
        user_id: UserId,
        complete: bool,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE payout_accounts
             SET onboarding_complete = $2, updated_at = NOW()
             WHERE user_id = $1",
        )
        .bind(user_id.as_i32())
        .bind(complete)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark onboarding state by Stripe account id (webhook path).
    ///
    /// Returns `true` if a row was updated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_onboarding_complete_by_account(
        &self,
        stripe_account_id: &str,
        complete: bool,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE payout_accounts
             SET onboarding_complete = $2, updated_at = NOW()
             WHERE stripe_account_id = $1",
        )
        .bind(stripe_account_id)
        .bind(complete)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
