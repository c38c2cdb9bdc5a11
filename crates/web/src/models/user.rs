//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use idea_hub_core::{Email, Role, UserId, Username};

/// A marketplace user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// User's display handle.
    pub username: Username,
    /// Short profile bio.
    pub bio: Option<String>,
    /// Creator or investor; `None` until the user picks one after sign-up.
    pub role: Option<Role>,
    /// Public URL of the uploaded avatar.
    pub avatar_url: Option<String>,
    /// Ethereum-style wallet address shown on minted ideas.
    pub wallet_address: Option<String>,
    /// Whether the user has an active premium plan.
    pub is_premium: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the user has chosen the creator role.
    #[must_use]
    pub fn is_creator(&self) -> bool {
        self.role == Some(Role::Creator)
    }
}

/// Aggregate counts shown on the profile page.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileStats {
    /// Ideas created by the user.
    pub created: i64,
    /// Ideas the user bought (minted by them, created by someone else).
    pub owned: i64,
    /// Ideas created by the user that have been minted.
    pub minted: i64,
    /// Ideas created by the user with blur protection on.
    pub protected: i64,
}
