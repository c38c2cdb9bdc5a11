//! Order repository.
//!
//! One row per checkout session, created `pending` when the session is
//! created and resolved by webhook. The webhook applies fulfillment
//! first and transitions the order last, so a crash mid-fulfillment
//! leaves the order pending and the Stripe retry picks it back up.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use idea_hub_core::{Cents, IdeaId, OrderId, OrderKind, PlanType, UserId};

use super::RepositoryError;

/// Lifecycle of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
pub enum OrderStatus {
    /// Checkout session created, payment not yet confirmed.
    Pending,
    /// Payment confirmed and fulfillment applied.
    Completed,
    /// Session expired without payment.
    Expired,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// A recorded checkout session.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub stripe_session_id: String,
    pub user_id: UserId,
    pub kind: OrderKind,
    /// Set for idea purchases and partnership fees.
    pub idea_id: Option<IdeaId>,
    /// Set for plan purchases.
    pub plan: Option<PlanType>,
    pub amount: Cents,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for recording a new pending order.
#[derive(Debug)]
pub struct NewOrder<'a> {
    pub stripe_session_id: &'a str,
    pub user_id: UserId,
    pub kind: OrderKind,
    pub idea_id: Option<IdeaId>,
    pub plan: Option<PlanType>,
    pub amount: Cents,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    stripe_session_id: String,
    user_id: i32,
    kind: OrderKind,
    idea_id: Option<i32>,
    plan: Option<String>,
    amount_cents: i64,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let plan = row
            .plan
            .map(|p| {
                p.parse::<PlanType>().map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid plan in database: {e}"))
                })
            })
            .transpose()?;

        Ok(Self {
            id: OrderId::new(row.id),
            stripe_session_id: row.stripe_session_id,
            user_id: UserId::new(row.user_id),
            kind: row.kind,
            idea_id: row.idea_id.map(IdeaId::new),
            plan,
            amount: Cents::new(row.amount_cents),
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, stripe_session_id, user_id, kind, idea_id, plan, amount_cents, \
                             status, created_at, updated_at";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a pending order for a freshly created checkout session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the session id was already
    /// recorded.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, order: &NewOrder<'_>) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (stripe_session_id, user_id, kind, idea_id, plan, amount_cents)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.stripe_session_id)
        .bind(order.user_id.as_i32())
        .bind(order.kind)
        .bind(order.idea_id.map(|id| id.as_i32()))
        .bind(order.plan.map(|p| p.to_string()))
        .bind(order.amount)
        .fetch_one(self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict("checkout session already recorded".to_string())
            }
            _ => RepositoryError::Database(e),
        })?;

        row.try_into()
    }

    /// Get an order by its Stripe checkout session id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_session(
        &self,
        stripe_session_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE stripe_session_id = $1"
        ))
        .bind(stripe_session_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Transition a pending order to completed.
    ///
    /// Returns `true` if this call performed the transition; `false`
    /// means the order was unknown or a concurrent delivery finished
    /// first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_completed(&self, stripe_session_id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET status = 'completed', updated_at = NOW()
             WHERE stripe_session_id = $1 AND status = 'pending'",
        )
        .bind(stripe_session_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Transition a pending order to expired.
    ///
    /// Returns `true` if a pending order was expired.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_expired(&self, stripe_session_id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET status = 'expired', updated_at = NOW()
             WHERE stripe_session_id = $1 AND status = 'pending'",
        )
        .bind(stripe_session_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether the user holds a completed lifetime plan purchase.
    ///
    /// Lifetime orders have no subscription, so premium revocation on
    /// subscription cancellation has to check here first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_completed_lifetime(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                 SELECT 1 FROM orders
                 WHERE user_id = $1 AND kind = 'plan' AND plan = 'lifetime'
                   AND status = 'completed'
             )",
        )
        .bind(user_id.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }
}
