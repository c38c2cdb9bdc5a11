//! Subscription repository.
//!
//! Tracks premium plan subscriptions. The row is the only mapping from
//! a Stripe subscription back to a marketplace user, so lifecycle
//! webhooks resolve the user through `update_status_by_stripe_id`.
//! Lifetime purchases also get a row (with a NULL Stripe id) so billing
//! history has one shape.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use idea_hub_core::{PlanType, SubscriptionId, UserId};

use super::RepositoryError;

/// Stripe-side lifecycle of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Canceled,
}

impl SubscriptionStatus {
    /// Map a Stripe subscription status string to ours.
    ///
    /// Returns `None` for transient states (`incomplete`, `paused`) that
    /// should not change what we have recorded.
    #[must_use]
    pub fn from_stripe(status: &str) -> Option<Self> {
        match status {
            "active" | "trialing" => Some(Self::Active),
            "past_due" | "unpaid" => Some(Self::PastDue),
            "canceled" | "incomplete_expired" => Some(Self::Canceled),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::PastDue => write!(f, "past_due"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

/// A premium plan subscription.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    /// `None` for lifetime purchases.
    pub stripe_subscription_id: Option<String>,
    pub plan: PlanType,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: i32,
    user_id: i32,
    stripe_subscription_id: Option<String>,
    plan: String,
    status: SubscriptionStatus,
    current_period_end: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = RepositoryError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let plan = row.plan.parse::<PlanType>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid plan in database: {e}"))
        })?;

        Ok(Self {
            id: SubscriptionId::new(row.id),
            user_id: UserId::new(row.user_id),
            stripe_subscription_id: row.stripe_subscription_id,
            plan,
            status: row.status,
            current_period_end: row.current_period_end,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, stripe_subscription_id, plan, status, \
                                    current_period_end, created_at, updated_at";

/// Repository for subscription database operations.
pub struct SubscriptionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubscriptionRepository<'a> {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up a subscription by its Stripe id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_stripe_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<Subscription>, RepositoryError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE stripe_subscription_id = $1"
        ))
        .bind(stripe_subscription_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Update a subscription's status from a lifecycle webhook.
    ///
    /// Returns the updated row (which carries the `user_id` the caller
    /// needs for premium changes), or `None` for subscriptions we never
    /// recorded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn update_status_by_stripe_id(
        &self,
        stripe_subscription_id: &str,
        status: SubscriptionStatus,
        current_period_end: Option<DateTime<Utc>>,
    ) -> Result<Option<Subscription>, RepositoryError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "UPDATE subscriptions
             SET status = $2, current_period_end = $3, updated_at = NOW()
             WHERE stripe_subscription_id = $1
             RETURNING {SUBSCRIPTION_COLUMNS}"
        ))
        .bind(stripe_subscription_id)
        .bind(status)
        .bind(current_period_end)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Whether the user has any active subscription.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn user_has_active(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                 SELECT 1 FROM subscriptions WHERE user_id = $1 AND status = 'active'
             )",
        )
        .bind(user_id.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_stripe_status_mapping() {
        assert_eq!(
            SubscriptionStatus::from_stripe("active"),
            Some(SubscriptionStatus::Active)
        );
        assert_eq!(
            SubscriptionStatus::from_stripe("trialing"),
            Some(SubscriptionStatus::Active)
        );
        assert_eq!(
            SubscriptionStatus::from_stripe("past_due"),
            Some(SubscriptionStatus::PastDue)
        );
        assert_eq!(
            SubscriptionStatus::from_stripe("unpaid"),
            Some(SubscriptionStatus::PastDue)
        );
        assert_eq!(
            SubscriptionStatus::from_stripe("canceled"),
            Some(SubscriptionStatus::Canceled)
        );
        assert_eq!(
            SubscriptionStatus::from_stripe("incomplete_expired"),
            Some(SubscriptionStatus::Canceled)
        );
        assert_eq!(SubscriptionStatus::from_stripe("incomplete"), None);
        assert_eq!(SubscriptionStatus::from_stripe("paused"), None);
    }
}
