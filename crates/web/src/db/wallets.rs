//! Creator wallet repository for database operations.
//!
//! Handles balances, the transaction ledger and withdrawal requests.
//! Withdrawals debit the balance and create the pending request in a
//! single transaction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use idea_hub_core::{Cents, IdeaId, TransactionId, TransactionKind, UserId, WithdrawalId, WithdrawalStatus};

use super::RepositoryError;
use crate::models::wallet::{BankDetails, CreatorWallet, WalletTransaction, WithdrawalRequest};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` wallet queries.
#[derive(Debug, sqlx::FromRow)]
struct WalletRow {
    user_id: i32,
    balance_cents: i64,
    total_earned_cents: i64,
    total_withdrawn_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WalletRow> for CreatorWallet {
    fn from(row: WalletRow) -> Self {
        Self {
            user_id: UserId::new(row.user_id),
            balance: Cents::new(row.balance_cents),
            total_earned: Cents::new(row.total_earned_cents),
            total_withdrawn: Cents::new(row.total_withdrawn_cents),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Internal row type for `PostgreSQL` transaction queries.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: i32,
    user_id: i32,
    idea_id: Option<i32>,
    amount_cents: i64,
    kind: TransactionKind,
    description: Option<String>,
    stripe_session_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<TransactionRow> for WalletTransaction {
    fn from(row: TransactionRow) -> Self {
        Self {
            id: TransactionId::new(row.id),
            user_id: UserId::new(row.user_id),
            idea_id: row.idea_id.map(IdeaId::new),
            amount: Cents::new(row.amount_cents),
            kind: row.kind,
            description: row.description,
            stripe_session_id: row.stripe_session_id,
            created_at: row.created_at,
        }
    }
}

/// Internal row type for `PostgreSQL` withdrawal queries.
#[derive(Debug, sqlx::FromRow)]
struct WithdrawalRow {
    id: i32,
    user_id: i32,
    amount_cents: i64,
    status: WithdrawalStatus,
    bank_details: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WithdrawalRow> for WithdrawalRequest {
    type Error = RepositoryError;

    fn try_from(row: WithdrawalRow) -> Result<Self, Self::Error> {
        let bank_details: BankDetails = serde_json::from_value(row.bank_details).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid bank details in database: {e}"))
        })?;

        Ok(Self {
            id: WithdrawalId::new(row.id),
            user_id: UserId::new(row.user_id),
            amount: Cents::new(row.amount_cents),
            status: row.status,
            bank_details,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const WALLET_COLUMNS: &str = "user_id, balance_cents, total_earned_cents, \
                              total_withdrawn_cents, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for creator wallet database operations.
pub struct WalletRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WalletRepository<'a> {
    /// Create a new wallet repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a creator's wallet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Option<CreatorWallet>, RepositoryError> {
        // Using runtime query to avoid SQLx offline mode cache requirements
        let row = sqlx::query_as::<_, WalletRow>(&format!(
            "SELECT {WALLET_COLUMNS} FROM creator_wallets WHERE user_id = $1"
        ))
        .bind(user_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get a creator's wallet, creating an empty one if missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<CreatorWallet, RepositoryError> {
        sqlx::query::<sqlx::Postgres>(
            "INSERT INTO creator_wallets (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id.as_i32())
        .execute(self.pool)
        .await?;

        let row = sqlx::query_as::<_, WalletRow>(&format!(
            "SELECT {WALLET_COLUMNS} FROM creator_wallets WHERE user_id = $1"
        ))
        .bind(user_id.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// The most recent ledger entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_transactions(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<WalletTransaction>, RepositoryError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r"
            SELECT id, user_id, idea_id, amount_cents, kind, description,
                   stripe_session_id, created_at
            FROM wallet_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            ",
        )
        .bind(user_id.as_i32())
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// The most recent withdrawal requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn recent_withdrawals(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<WithdrawalRequest>, RepositoryError> {
        let rows = sqlx::query_as::<_, WithdrawalRow>(
            r"
            SELECT id, user_id, amount_cents, status, bank_details,
                   created_at, updated_at
            FROM withdrawal_requests
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            ",
        )
        .bind(user_id.as_i32())
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Debit the wallet and open a pending withdrawal request.
    ///
    /// The balance check and debit happen in one statement so concurrent
    /// requests cannot overdraw.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the balance is insufficient.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn request_withdrawal(
        &self,
        user_id: UserId,
        amount: Cents,
        bank_details: &BankDetails,
    ) -> Result<WithdrawalRequest, RepositoryError> {
        let bank_json = serde_json::to_value(bank_details).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize bank details: {e}"))
        })?;

        let mut tx = self.pool.begin().await?;

        let debit = sqlx::query::<sqlx::Postgres>(
            "UPDATE creator_wallets
             SET balance_cents = balance_cents - $2,
                 total_withdrawn_cents = total_withdrawn_cents + $2,
                 updated_at = NOW()
             WHERE user_id = $1 AND balance_cents >= $2",
        )
        .bind(user_id.as_i32())
        .bind(amount)
        .execute(&mut *tx)
        .await?;

        if debit.rows_affected() == 0 {
            return Err(RepositoryError::Conflict("insufficient balance".to_owned()));
        }

        let row = sqlx::query_as::<_, WithdrawalRow>(
            r"
            INSERT INTO withdrawal_requests (user_id, amount_cents, status, bank_details)
            VALUES ($1, $2, 'pending', $3)
            RETURNING id, user_id, amount_cents, status, bank_details,
                      created_at, updated_at
            ",
        )
        .bind(user_id.as_i32())
        .bind(amount)
        .bind(&bank_json)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query::<sqlx::Postgres>(
            "INSERT INTO wallet_transactions (user_id, amount_cents, kind, description)
             VALUES ($1, $2, 'withdrawal', $3)",
        )
        .bind(user_id.as_i32())
        .bind(Cents::new(-amount.as_i64()))
        .bind(format!("Withdrawal to {}", bank_details.bank_name))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        row.try_into()
    }
}
