//! Webhook fulfillment writes.
//!
//! Everything a confirmed payment changes in the marketplace happens
//! here, each flow in a single transaction so a crash mid-fulfillment
//! leaves nothing half-applied and the Stripe retry starts clean.
//!
//! Every write is idempotent: the webhook re-runs fulfillment for any
//! order still pending, so a retried delivery must land on the same
//! state. Credits dedupe on the ledger's unique `stripe_session_id`,
//! the mint tolerates a rerun by the same buyer, and the premium and
//! subscription writes are plain upserts.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use idea_hub_core::{Cents, IdeaId, PLATFORM_FEE_PERCENT, PlanType, UserId};

use super::RepositoryError;

/// Result of attempting to mint an idea for its buyer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintOutcome {
    /// Idea minted; the creator was credited `net` (sale price less the
    /// platform fee).
    Minted { creator_id: UserId, net: Cents },
    /// Somebody already owns the idea. No money moved.
    AlreadyMinted,
}

/// Repository for applying confirmed payments to the marketplace.
pub struct FulfillmentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FulfillmentRepository<'a> {
    /// Create a new fulfillment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Mint an idea for its buyer and credit the creator.
    ///
    /// The mint is guarded so only an unsold idea (or one this buyer
    /// already minted, on a retried delivery) passes. If somebody else
    /// got there between checkout and webhook, the caller gets
    /// [`MintOutcome::AlreadyMinted`] to escalate; the buyer paid for an
    /// idea they did not receive.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn fulfill_idea_purchase(
        &self,
        stripe_session_id: &str,
        idea_id: IdeaId,
        buyer_id: UserId,
        amount: Cents,
    ) -> Result<MintOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let minted = sqlx::query_as::<_, (i32, String)>(
            "UPDATE ideas SET minted_by = $1, updated_at = NOW()
             WHERE id = $2 AND (minted_by IS NULL OR minted_by = $1)
             RETURNING created_by, title",
        )
        .bind(buyer_id.as_i32())
        .bind(idea_id.as_i32())
        .fetch_optional(&mut *tx)
        .await?;

        let Some((created_by, title)) = minted else {
            return Ok(MintOutcome::AlreadyMinted);
        };
        let creator_id = UserId::new(created_by);

        let net = creator_net(amount);

        let ledger = sqlx::query::<sqlx::Postgres>(
            "INSERT INTO wallet_transactions
                 (user_id, idea_id, amount_cents, kind, description, stripe_session_id)
             VALUES ($1, $2, $3, 'sale', $4, $5)
             ON CONFLICT (stripe_session_id) DO NOTHING",
        )
        .bind(creator_id.as_i32())
        .bind(idea_id.as_i32())
        .bind(net)
        .bind(format!("Sale: {title}"))
        .bind(stripe_session_id)
        .execute(&mut *tx)
        .await?;

        if ledger.rows_affected() > 0 {
            Self::credit_wallet(&mut tx, creator_id, net).await?;
        }

        tx.commit().await?;

        Ok(MintOutcome::Minted { creator_id, net })
    }

    /// Credit a partnership access fee to the idea's creator.
    ///
    /// Unlike sales there is no ownership transfer, but the platform
    /// takes the same cut it does on a sale. Returns `false` if nothing
    /// was credited (idea gone, or this session already in the ledger).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn fulfill_partnership_fee(
        &self,
        stripe_session_id: &str,
        idea_id: IdeaId,
        amount: Cents,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let idea = sqlx::query_as::<_, (i32, String)>(
            "SELECT created_by, title FROM ideas WHERE id = $1",
        )
        .bind(idea_id.as_i32())
        .fetch_optional(&mut *tx)
        .await?;

        let Some((created_by, title)) = idea else {
            return Ok(false);
        };
        let creator_id = UserId::new(created_by);

        let net = creator_net(amount);

        let ledger = sqlx::query::<sqlx::Postgres>(
            "INSERT INTO wallet_transactions
                 (user_id, idea_id, amount_cents, kind, description, stripe_session_id)
             VALUES ($1, $2, $3, 'partnership_fee', $4, $5)
             ON CONFLICT (stripe_session_id) DO NOTHING",
        )
        .bind(creator_id.as_i32())
        .bind(idea_id.as_i32())
        .bind(net)
        .bind(format!("Partnership fee: {title}"))
        .bind(stripe_session_id)
        .execute(&mut *tx)
        .await?;

        let credited = ledger.rows_affected() > 0;
        if credited {
            Self::credit_wallet(&mut tx, creator_id, net).await?;
        }

        tx.commit().await?;

        Ok(credited)
    }

    /// Grant premium and record the subscription for a paid plan.
    ///
    /// `stripe_subscription_id` is `None` for the lifetime plan. The
    /// subscription upsert keys on the Stripe id so a re-activated
    /// subscription refreshes its existing row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn fulfill_plan_purchase(
        &self,
        user_id: UserId,
        plan: PlanType,
        stripe_subscription_id: Option<&str>,
        current_period_end: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query::<sqlx::Postgres>(
            "UPDATE users SET is_premium = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id.as_i32())
        .execute(&mut *tx)
        .await?;

        sqlx::query::<sqlx::Postgres>(
            "INSERT INTO subscriptions
                 (user_id, stripe_subscription_id, plan, status, current_period_end)
             VALUES ($1, $2, $3, 'active', $4)
             ON CONFLICT (stripe_subscription_id) DO UPDATE SET
                 status = 'active',
                 plan = EXCLUDED.plan,
                 current_period_end = EXCLUDED.current_period_end,
                 updated_at = NOW()",
        )
        .bind(user_id.as_i32())
        .bind(stripe_subscription_id)
        .bind(plan.to_string())
        .bind(current_period_end)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Set or clear a user's premium flag.
    ///
    /// Returns `true` if the user exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_premium(&self, user_id: UserId, premium: bool) -> Result<bool, RepositoryError> {
        let result = sqlx::query::<sqlx::Postgres>(
            "UPDATE users SET is_premium = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id.as_i32())
        .bind(premium)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Credit a creator's wallet, creating it on first earnings.
    async fn credit_wallet(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        creator_id: UserId,
        amount: Cents,
    ) -> Result<(), RepositoryError> {
        sqlx::query::<sqlx::Postgres>(
            "INSERT INTO creator_wallets (user_id, balance_cents, total_earned_cents)
             VALUES ($1, $2, $2)
             ON CONFLICT (user_id) DO UPDATE SET
                 balance_cents = creator_wallets.balance_cents + EXCLUDED.balance_cents,
                 total_earned_cents = creator_wallets.total_earned_cents
                     + EXCLUDED.total_earned_cents,
                 updated_at = NOW()",
        )
        .bind(creator_id.as_i32())
        .bind(amount)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

/// What the creator receives from a payment after the platform cut.
///
/// Applies to sales and partnership fees alike.
fn creator_net(amount: Cents) -> Cents {
    let fee = amount.percentage(PLATFORM_FEE_PERCENT);
    // a 10% fee can never exceed the amount
    amount.checked_sub(fee).unwrap_or(Cents::ZERO)
}

#[cfg(test)]
mod tests {
    use idea_hub_core::{IDEA_PRICE, PARTNERSHIP_FEE};

    use super::*;

    #[test]
    fn test_creator_net_takes_platform_cut() {
        // $50.00 sale nets the creator $45.00
        assert_eq!(creator_net(IDEA_PRICE), Cents::new(4500));
        // $5.00 partnership fee nets the creator $4.50
        assert_eq!(creator_net(PARTNERSHIP_FEE), Cents::new(450));
    }

    #[test]
    fn test_creator_net_rounds_fee_half_up() {
        // 10% of 5 cents rounds up to 1 cent
        assert_eq!(creator_net(Cents::new(5)), Cents::new(4));
        assert_eq!(creator_net(Cents::ZERO), Cents::ZERO);
    }
}
