//! Integer money type.
//!
//! All money in Idea-HUB is stored and transferred as integer cents (USD),
//! matching what Stripe amounts and the wallet tables use. There is no
//! fractional currency anywhere, so no decimal type is needed.

use core::fmt;

use serde::{Deserialize, Serialize};

/// An amount of money in integer cents (USD).
///
/// ## Examples
///
/// ```
/// use idea_hub_core::Cents;
///
/// let price = Cents::new(5000);
/// assert_eq!(price.to_string(), "$50.00");
/// assert_eq!(price.percentage(10), Cents::new(500));
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Cents(i64);

/// What a buyer pays to mint an idea ($50.00).
pub const IDEA_PRICE: Cents = Cents::new(5000);

/// Platform share of an idea sale, in percent.
pub const PLATFORM_FEE_PERCENT: i64 = 10;

/// Access fee for sending one partnership request ($5.00).
pub const PARTNERSHIP_FEE: Cents = Cents::new(500);

impl Cents {
    /// Zero cents.
    pub const ZERO: Self = Self(0);

    /// Create an amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Get the underlying cent count.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Whether the amount is zero or negative.
    #[must_use]
    pub const fn is_non_positive(&self) -> bool {
        self.0 <= 0
    }

    /// Checked addition.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked subtraction.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// A percentage of this amount, rounded half-up.
    ///
    /// Used for platform fees (e.g., 10% of a sale).
    #[must_use]
    pub const fn percentage(self, percent: i64) -> Self {
        Self((self.0 * percent + 50) / 100)
    }
}

impl fmt::Display for Cents {
    /// Formats as a dollar string, e.g., `$50.00` or `-$0.99`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for Cents {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl From<Cents> for i64 {
    fn from(cents: Cents) -> Self {
        cents.0
    }
}

// SQLx support (with postgres feature): stored as BIGINT
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Cents {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Cents {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let v = <i64 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(v))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Cents {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i64 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Cents::new(5000).to_string(), "$50.00");
        assert_eq!(Cents::new(999).to_string(), "$9.99");
        assert_eq!(Cents::new(5).to_string(), "$0.05");
        assert_eq!(Cents::ZERO.to_string(), "$0.00");
        assert_eq!(Cents::new(-99).to_string(), "-$0.99");
    }

    #[test]
    fn test_percentage() {
        // 10% platform fee on a $50.00 sale
        assert_eq!(IDEA_PRICE.percentage(PLATFORM_FEE_PERCENT), Cents::new(500));
        // 10% of $5.00 partnership fee
        assert_eq!(Cents::new(500).percentage(10), Cents::new(50));
        // Rounds half-up
        assert_eq!(Cents::new(5).percentage(10), Cents::new(1));
        assert_eq!(Cents::new(4).percentage(10), Cents::ZERO);
    }

    #[test]
    fn test_checked_math() {
        let a = Cents::new(1000);
        let b = Cents::new(250);
        assert_eq!(a.checked_add(b), Some(Cents::new(1250)));
        assert_eq!(a.checked_sub(b), Some(Cents::new(750)));
        assert_eq!(Cents::new(i64::MAX).checked_add(Cents::new(1)), None);
    }

    #[test]
    fn test_is_non_positive() {
        assert!(Cents::ZERO.is_non_positive());
        assert!(Cents::new(-1).is_non_positive());
        assert!(!Cents::new(1).is_non_positive());
    }

    #[test]
    fn test_serde_transparent() {
        let c = Cents::new(5000);
        assert_eq!(serde_json::to_string(&c).unwrap(), "5000");
        let back: Cents = serde_json::from_str("5000").unwrap();
        assert_eq!(back, c);
    }
}
