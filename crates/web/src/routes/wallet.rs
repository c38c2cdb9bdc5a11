//! Creator wallet route handlers.
//!
//! Balance and ledger display, withdrawal requests with masked bank
//! details, and Stripe Connect payout onboarding.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use idea_hub_core::{Cents, Role, TransactionKind};

use crate::db::{RepositoryError, UserRepository, WalletRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::wallet::MIN_WITHDRAWAL;
use crate::models::{BankDetailsInput, WalletTransaction, WithdrawalRequest};
use crate::services::{PaymentsError, PayoutSession};
use crate::state::AppState;

use super::ViewerContext;
use super::auth::MessageQuery;

/// Ledger entries shown on the wallet page.
const RECENT_TRANSACTIONS: i64 = 10;

/// Withdrawal requests shown on the wallet page.
const RECENT_WITHDRAWALS: i64 = 5;

// =============================================================================
// Form Types
// =============================================================================

/// Withdrawal request form data.
#[derive(Debug, Deserialize)]
pub struct WithdrawForm {
    /// Dollar amount, e.g. `25` or `25.50`.
    pub amount: String,
    pub account_holder_name: String,
    pub bank_name: String,
    pub account_number: String,
    pub routing_number: String,
}

// =============================================================================
// View Types
// =============================================================================

/// A ledger entry as shown on the wallet page.
#[derive(Debug)]
pub struct TransactionView {
    pub description: String,
    pub amount: String,
    pub is_credit: bool,
    pub posted_at: DateTime<Utc>,
}

impl From<&WalletTransaction> for TransactionView {
    fn from(tx: &WalletTransaction) -> Self {
        let fallback = match tx.kind {
            TransactionKind::Sale => "Idea sale",
            TransactionKind::PartnershipFee => "Partnership access fee",
            TransactionKind::Withdrawal => "Withdrawal",
        };
        Self {
            description: tx
                .description
                .clone()
                .unwrap_or_else(|| fallback.to_string()),
            amount: tx.amount.to_string(),
            is_credit: tx.amount.as_i64() > 0,
            posted_at: tx.created_at,
        }
    }
}

/// A withdrawal request as shown on the wallet page.
#[derive(Debug)]
pub struct WithdrawalView {
    pub amount: String,
    pub status: String,
    pub destination: String,
    pub requested_at: DateTime<Utc>,
}

impl From<&WithdrawalRequest> for WithdrawalView {
    fn from(withdrawal: &WithdrawalRequest) -> Self {
        Self {
            amount: withdrawal.amount.to_string(),
            status: withdrawal.status.to_string(),
            destination: format!(
                "{} {}",
                withdrawal.bank_details.bank_name, withdrawal.bank_details.account_number
            ),
            requested_at: withdrawal.created_at,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Wallet page template.
#[derive(Template, WebTemplate)]
#[template(path = "wallet.html")]
pub struct WalletTemplate {
    pub viewer: Option<ViewerContext>,
    pub balance: String,
    pub total_earned: String,
    pub total_withdrawn: String,
    pub transactions: Vec<TransactionView>,
    pub withdrawals: Vec<WithdrawalView>,
    pub min_withdrawal: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Parse a dollar amount like `25`, `25.5`, or `$25.50` into cents.
///
/// Rejects negative amounts and more than two decimal places.
fn parse_dollars(input: &str) -> Option<Cents> {
    let s = input.trim().trim_start_matches('$');
    if s.is_empty() {
        return None;
    }

    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    let dollars: i64 = whole.parse().ok()?;
    if dollars < 0 {
        return None;
    }

    let cents = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        2 => frac.parse::<i64>().ok()?,
        _ => return None,
    };
    if cents < 0 {
        return None;
    }

    let total = dollars.checked_mul(100)?.checked_add(cents)?;
    Some(Cents::new(total))
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the wallet page with balance, ledger, and withdrawal history.
#[instrument(skip(state, current, query))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> Result<Response> {
    let users = UserRepository::new(state.pool());
    let Some(user) = users.get_by_id(current.id).await? else {
        return Ok(Redirect::to("/auth").into_response());
    };
    match user.role {
        Some(Role::Creator) => {}
        Some(Role::Investor) => {
            return Err(AppError::Forbidden("only creators have a wallet".to_string()));
        }
        None => return Ok(Redirect::to("/auth/role").into_response()),
    }

    let wallets = WalletRepository::new(state.pool());
    let wallet = wallets.get_or_create(current.id).await?;
    let (transactions, withdrawals) = tokio::join!(
        wallets.recent_transactions(current.id, RECENT_TRANSACTIONS),
        wallets.recent_withdrawals(current.id, RECENT_WITHDRAWALS),
    );

    Ok(WalletTemplate {
        viewer: Some(ViewerContext::from(&user)),
        balance: wallet.balance.to_string(),
        total_earned: wallet.total_earned.to_string(),
        total_withdrawn: wallet.total_withdrawn.to_string(),
        transactions: transactions?.iter().map(TransactionView::from).collect(),
        withdrawals: withdrawals?.iter().map(WithdrawalView::from).collect(),
        min_withdrawal: MIN_WITHDRAWAL.to_string(),
        error: query.error,
        success: query.success,
    }
    .into_response())
}

/// Handle a withdrawal request.
///
/// Bank details are masked before they reach the repository; the full
/// account and routing numbers never leave this handler.
#[instrument(skip(state, current, form))]
pub async fn withdraw(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Form(form): Form<WithdrawForm>,
) -> Result<Response> {
    let holder = form.account_holder_name.trim();
    let bank = form.bank_name.trim();
    let account = form.account_number.trim();
    let routing = form.routing_number.trim();
    if holder.is_empty() || bank.is_empty() || account.is_empty() || routing.is_empty() {
        return Ok(Redirect::to("/wallet?error=missing_fields").into_response());
    }

    let Some(amount) = parse_dollars(&form.amount) else {
        return Ok(Redirect::to("/wallet?error=invalid_amount").into_response());
    };
    if amount < MIN_WITHDRAWAL {
        return Ok(Redirect::to("/wallet?error=minimum").into_response());
    }

    let details = BankDetailsInput {
        account_holder_name: holder.to_string(),
        bank_name: bank.to_string(),
        account_number: account.to_string(),
        routing_number: routing.to_string(),
    }
    .masked();

    let wallets = WalletRepository::new(state.pool());
    match wallets.request_withdrawal(current.id, amount, &details).await {
        Ok(_) => Ok(Redirect::to("/wallet?success=withdrawal_requested").into_response()),
        Err(RepositoryError::Conflict(_)) => {
            Ok(Redirect::to("/wallet?error=insufficient_balance").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Start Stripe Connect payout setup.
///
/// First-time callers are sent to Connect onboarding; onboarded callers
/// get a checkout session with their payout destination attached.
#[instrument(skip(state, current))]
pub async fn payout_setup(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Response {
    add_breadcrumb("payouts", "Started payout setup", None);

    match state
        .payments()
        .create_payout_session(current.id, &current.email)
        .await
    {
        Ok(PayoutSession::Onboarding { url } | PayoutSession::Checkout { url }) => {
            Redirect::to(&url).into_response()
        }
        Err(PaymentsError::ConnectNotEnabled) => {
            tracing::warn!("Payouts requested but Stripe Connect is not enabled");
            Redirect::to("/wallet?error=payouts_unavailable").into_response()
        }
        Err(e) => {
            tracing::error!("Failed to create payout session: {}", e);
            Redirect::to("/wallet?error=payout_failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dollars_whole_and_fractional() {
        assert_eq!(parse_dollars("25"), Some(Cents::new(2500)));
        assert_eq!(parse_dollars("25.5"), Some(Cents::new(2550)));
        assert_eq!(parse_dollars("25.50"), Some(Cents::new(2550)));
        assert_eq!(parse_dollars("$10.00"), Some(Cents::new(1000)));
        assert_eq!(parse_dollars(" 3.07 "), Some(Cents::new(307)));
    }

    #[test]
    fn test_parse_dollars_rejects_garbage() {
        assert_eq!(parse_dollars(""), None);
        assert_eq!(parse_dollars("abc"), None);
        assert_eq!(parse_dollars("10.123"), None);
        assert_eq!(parse_dollars("-5"), None);
        assert_eq!(parse_dollars("5.-1"), None);
    }

    #[test]
    fn test_parse_dollars_rejects_overflowing_amounts() {
        assert_eq!(parse_dollars("99999999999999999"), None);
        assert_eq!(parse_dollars(&format!("{}", i64::MAX)), None);
        // largest whole-dollar amount that still fits in cents
        assert_eq!(
            parse_dollars("92233720368547758"),
            Some(Cents::new(9_223_372_036_854_775_800))
        );
    }
}
