//! Domain enums shared across the workspace.
//!
//! All of these map to PostgreSQL enum types (created by the web crate's
//! migrations) when the `postgres` feature is enabled.

use serde::{Deserialize, Serialize};

/// Account role chosen after sign-up.
///
/// Creators upload ideas and earn through the wallet; investors buy and
/// partner. The role is `None` in the database until the user picks one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Creator,
    Investor,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Creator => write!(f, "creator"),
            Self::Investor => write!(f, "investor"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creator" => Ok(Self::Creator),
            "investor" => Ok(Self::Investor),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// How an idea can be acquired.
///
/// Controls the affordances shown on idea cards: `forsale` ideas get a buy
/// button, `partnership` ideas get the NDA request flow, `showcase` ideas
/// are display-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "ownership_mode", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipMode {
    #[default]
    #[serde(rename = "forsale")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "forsale"))]
    ForSale,
    Partnership,
    Showcase,
}

impl std::fmt::Display for OwnershipMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ForSale => write!(f, "forsale"),
            Self::Partnership => write!(f, "partnership"),
            Self::Showcase => write!(f, "showcase"),
        }
    }
}

impl std::str::FromStr for OwnershipMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forsale" => Ok(Self::ForSale),
            "partnership" => Ok(Self::Partnership),
            "showcase" => Ok(Self::Showcase),
            _ => Err(format!("invalid ownership mode: {s}")),
        }
    }
}

/// Lifecycle of a withdrawal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "withdrawal_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl std::fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// What a wallet transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "transaction_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Credit from a completed idea sale.
    Sale,
    /// Credit from a paid partnership request.
    PartnershipFee,
    /// Debit from a withdrawal request.
    Withdrawal,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sale => write!(f, "sale"),
            Self::PartnershipFee => write!(f, "partnership_fee"),
            Self::Withdrawal => write!(f, "withdrawal"),
        }
    }
}

/// Lifecycle of a partnership request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "request_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Accepted => write!(f, "accepted"),
            Self::Declined => write!(f, "declined"),
        }
    }
}

/// What a Stripe order row paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Premium plan purchase (subscription or lifetime).
    Plan,
    /// One-time idea purchase.
    IdeaPurchase,
    /// Partnership access fee.
    Partnership,
}

impl std::fmt::Display for OrderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plan => write!(f, "plan"),
            Self::IdeaPurchase => write!(f, "idea_purchase"),
            Self::Partnership => write!(f, "partnership"),
        }
    }
}

/// Premium plan tiers.
///
/// Not persisted directly; travels in checkout metadata as `plan_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Monthly,
    Quarterly,
    Lifetime,
}

impl PlanType {
    /// Whether this plan is a one-time payment rather than a subscription.
    #[must_use]
    pub const fn is_one_time(self) -> bool {
        matches!(self, Self::Lifetime)
    }

    /// What the plan costs.
    #[must_use]
    pub const fn price(self) -> super::money::Cents {
        match self {
            Self::Monthly => super::money::Cents::new(1000),
            Self::Quarterly => super::money::Cents::new(2500),
            Self::Lifetime => super::money::Cents::new(9900),
        }
    }

    /// Billing term label shown next to the price.
    #[must_use]
    pub const fn term(self) -> &'static str {
        match self {
            Self::Monthly => "per month",
            Self::Quarterly => "per 3 months",
            Self::Lifetime => "one time",
        }
    }
}

impl std::fmt::Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly => write!(f, "monthly"),
            Self::Quarterly => write!(f, "quarterly"),
            Self::Lifetime => write!(f, "lifetime"),
        }
    }
}

impl std::str::FromStr for PlanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "lifetime" => Ok(Self::Lifetime),
            _ => Err(format!("invalid plan type: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        assert_eq!("creator".parse::<Role>().unwrap(), Role::Creator);
        assert_eq!(Role::Investor.to_string(), "investor");
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_ownership_mode_wire_values() {
        // "forsale" is one word in the database and in URLs
        assert_eq!(
            "forsale".parse::<OwnershipMode>().unwrap(),
            OwnershipMode::ForSale
        );
        assert_eq!(OwnershipMode::ForSale.to_string(), "forsale");
        assert_eq!(
            serde_json::to_string(&OwnershipMode::ForSale).unwrap(),
            "\"forsale\""
        );
        assert_eq!(OwnershipMode::Partnership.to_string(), "partnership");
    }

    #[test]
    fn test_plan_type() {
        assert!(PlanType::Lifetime.is_one_time());
        assert!(!PlanType::Monthly.is_one_time());
        assert_eq!("quarterly".parse::<PlanType>().unwrap(), PlanType::Quarterly);
    }

    #[test]
    fn test_plan_prices() {
        assert_eq!(PlanType::Monthly.price().to_string(), "$10.00");
        assert_eq!(PlanType::Quarterly.price().to_string(), "$25.00");
        assert_eq!(PlanType::Lifetime.price().to_string(), "$99.00");
        assert_eq!(PlanType::Lifetime.term(), "one time");
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&TransactionKind::PartnershipFee).unwrap(),
            "\"partnership_fee\""
        );
        assert_eq!(
            serde_json::to_string(&WithdrawalStatus::Pending).unwrap(),
            "\"pending\""
        );
    }
}
