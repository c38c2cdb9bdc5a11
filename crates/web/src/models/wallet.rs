//! Creator wallet domain types.
//!
//! Balances are integer cents throughout. Bank details are masked to their
//! last four digits before they ever reach the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use idea_hub_core::{Cents, IdeaId, TransactionId, TransactionKind, UserId, WithdrawalId, WithdrawalStatus};

/// Minimum amount a creator can withdraw ($10.00).
pub const MIN_WITHDRAWAL: Cents = Cents::new(1000);

/// A creator's earnings wallet (domain type).
#[derive(Debug, Clone)]
pub struct CreatorWallet {
    /// Owning user.
    pub user_id: UserId,
    /// Currently available balance.
    pub balance: Cents,
    /// Lifetime credits.
    pub total_earned: Cents,
    /// Lifetime debits from withdrawals.
    pub total_withdrawn: Cents,
    /// When the wallet was created.
    pub created_at: DateTime<Utc>,
    /// When the wallet was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A single ledger entry on a creator's wallet.
#[derive(Debug, Clone)]
pub struct WalletTransaction {
    /// Unique transaction ID.
    pub id: TransactionId,
    /// Wallet owner.
    pub user_id: UserId,
    /// Related idea, if the entry came from a sale or partnership.
    pub idea_id: Option<IdeaId>,
    /// Signed amount (credits positive, debits negative).
    pub amount: Cents,
    /// What this entry records.
    pub kind: TransactionKind,
    /// Human-readable description shown in the wallet.
    pub description: Option<String>,
    /// Stripe checkout session that produced this credit, if any.
    ///
    /// Unique in the database so a redelivered webhook cannot credit twice.
    pub stripe_session_id: Option<String>,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}

/// A withdrawal request with masked bank details.
#[derive(Debug, Clone)]
pub struct WithdrawalRequest {
    /// Unique withdrawal ID.
    pub id: WithdrawalId,
    /// Requesting user.
    pub user_id: UserId,
    /// Amount debited from the wallet.
    pub amount: Cents,
    /// Processing state.
    pub status: WithdrawalStatus,
    /// Masked destination account.
    pub bank_details: BankDetails,
    /// When the request was made.
    pub created_at: DateTime<Utc>,
    /// When the request was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Masked bank details as persisted with a withdrawal request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankDetails {
    /// Account holder's name.
    pub account_holder_name: String,
    /// Bank name.
    pub bank_name: String,
    /// Account number masked to its last four digits.
    pub account_number: String,
    /// Routing number masked to its last four digits.
    pub routing_number: String,
}

/// Raw bank details as submitted on the withdrawal form.
///
/// Never persisted; convert with [`BankDetailsInput::masked`] first.
#[derive(Debug, Clone, Deserialize)]
pub struct BankDetailsInput {
    /// Account holder's name.
    pub account_holder_name: String,
    /// Bank name.
    pub bank_name: String,
    /// Full account number.
    pub account_number: String,
    /// Full routing number.
    pub routing_number: String,
}

impl BankDetailsInput {
    /// Mask account and routing numbers down to their last four digits.
    #[must_use]
    pub fn masked(&self) -> BankDetails {
        BankDetails {
            account_holder_name: self.account_holder_name.clone(),
            bank_name: self.bank_name.clone(),
            account_number: mask_number(&self.account_number),
            routing_number: mask_number(&self.routing_number),
        }
    }
}

/// Replace all but the last four characters with `****`.
fn mask_number(s: &str) -> String {
    let tail_start = s.len().saturating_sub(4);
    let tail = s.get(tail_start..).unwrap_or(s);
    format!("****{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_number_keeps_last_four() {
        assert_eq!(mask_number("123456789"), "****6789");
        assert_eq!(mask_number("000111222333"), "****2333");
    }

    #[test]
    fn test_mask_number_short_input() {
        assert_eq!(mask_number("42"), "****42");
    }

    #[test]
    fn test_masked_bank_details_drop_full_numbers() {
        let input = BankDetailsInput {
            account_holder_name: "Ada Lovelace".to_string(),
            bank_name: "First Analytical".to_string(),
            account_number: "987654321".to_string(),
            routing_number: "021000021".to_string(),
        };

        let masked = input.masked();
        assert_eq!(masked.account_number, "****4321");
        assert_eq!(masked.routing_number, "****0021");
        assert_eq!(masked.account_holder_name, "Ada Lovelace");

        let json = serde_json::to_string(&masked).unwrap_or_default();
        assert!(!json.contains("987654321"));
        assert!(!json.contains("021000021"));
    }

    #[test]
    fn test_min_withdrawal_is_ten_dollars() {
        assert_eq!(MIN_WITHDRAWAL.as_i64(), 1000);
    }
}
