//! Idea domain types.
//!
//! Visibility and purchase rules live here so route handlers and templates
//! share one implementation.

use chrono::{DateTime, Utc};

use idea_hub_core::{CommentId, IdeaId, OwnershipMode, UserId, Username};

/// A published idea (domain type).
#[derive(Debug, Clone)]
pub struct Idea {
    /// Unique idea ID.
    pub id: IdeaId,
    /// User who created the idea.
    pub created_by: UserId,
    /// Idea title.
    pub title: String,
    /// Full description (plain text).
    pub description: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Public URL of the cover image.
    pub image_url: Option<String>,
    /// Whether the description is hidden from non-owners.
    pub is_blurred: bool,
    /// How the idea can be acquired.
    pub ownership_mode: OwnershipMode,
    /// User who bought (minted) the idea, if sold.
    pub minted_by: Option<UserId>,
    /// Original idea if this one is a remix.
    pub remix_of_id: Option<IdeaId>,
    /// When the idea was created.
    pub created_at: DateTime<Utc>,
    /// When the idea was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Idea {
    /// Whether the idea has been bought.
    #[must_use]
    pub const fn is_minted(&self) -> bool {
        self.minted_by.is_some()
    }

    /// Whether the full description is visible to this viewer.
    ///
    /// Blurred descriptions are shown only to the creator and to the buyer
    /// once minted.
    #[must_use]
    pub fn content_visible_to(&self, viewer: Option<UserId>) -> bool {
        if !self.is_blurred {
            return true;
        }
        viewer == Some(self.created_by) || (viewer.is_some() && viewer == self.minted_by)
    }

    /// Whether this viewer can buy the idea.
    ///
    /// Requires a logged-in viewer who is not the creator, a for-sale idea,
    /// and no existing buyer.
    #[must_use]
    pub fn purchasable_by(&self, viewer: Option<UserId>) -> bool {
        let Some(viewer) = viewer else {
            return false;
        };
        self.ownership_mode == OwnershipMode::ForSale
            && self.minted_by.is_none()
            && viewer != self.created_by
    }
}

/// An idea with the aggregates needed to render a card or detail page.
#[derive(Debug, Clone)]
pub struct IdeaSummary {
    /// The idea itself.
    pub idea: Idea,
    /// Handle of the creator.
    pub author_username: Username,
    /// Total upvote count.
    pub upvotes: i64,
    /// Total comment count.
    pub comments: i64,
    /// Whether the current viewer has upvoted.
    pub upvoted_by_viewer: bool,
    /// Handle of the buyer, if minted.
    pub minted_by_username: Option<Username>,
    /// Wallet address of the buyer, if minted and set.
    pub minted_by_wallet: Option<String>,
}

impl IdeaSummary {
    /// Attribution line for a minted idea.
    ///
    /// Prefers the buyer's wallet address (shortened), then their handle,
    /// then an anonymous label. Returns `None` for unminted ideas.
    #[must_use]
    pub fn minted_attribution(&self) -> Option<String> {
        if !self.idea.is_minted() {
            return None;
        }
        if let Some(wallet) = self.minted_by_wallet.as_deref() {
            return Some(shorten_wallet(wallet));
        }
        if let Some(username) = &self.minted_by_username {
            return Some(format!("@{username}"));
        }
        Some("@Anonymous".to_string())
    }
}

/// A comment with its author's handle.
#[derive(Debug, Clone)]
pub struct Comment {
    /// Unique comment ID.
    pub id: CommentId,
    /// Idea this comment belongs to.
    pub idea_id: IdeaId,
    /// User who wrote the comment.
    pub user_id: UserId,
    /// Handle of the author.
    pub author_username: Username,
    /// Comment text.
    pub content: String,
    /// When the comment was posted.
    pub created_at: DateTime<Utc>,
}

/// Shorten a wallet address for display (`0x1A2b...cD4e`).
///
/// Addresses of 10 characters or fewer are returned unchanged.
#[must_use]
pub fn shorten_wallet(addr: &str) -> String {
    if addr.len() <= 10 {
        return addr.to_string();
    }
    let head = addr.get(..6).unwrap_or(addr);
    let tail = addr.get(addr.len() - 4..).unwrap_or("");
    format!("{head}...{tail}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_idea() -> Idea {
        Idea {
            id: IdeaId::new(1),
            created_by: UserId::new(10),
            title: "Solar backpack".to_string(),
            description: "A backpack with integrated solar panels".to_string(),
            tags: vec!["hardware".to_string()],
            image_url: None,
            is_blurred: false,
            ownership_mode: OwnershipMode::ForSale,
            minted_by: None,
            remix_of_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn summary(idea: Idea) -> IdeaSummary {
        IdeaSummary {
            idea,
            author_username: "maker".parse().unwrap(),
            upvotes: 0,
            comments: 0,
            upvoted_by_viewer: false,
            minted_by_username: None,
            minted_by_wallet: None,
        }
    }

    #[test]
    fn test_unblurred_visible_to_everyone() {
        let idea = test_idea();
        assert!(idea.content_visible_to(None));
        assert!(idea.content_visible_to(Some(UserId::new(99))));
    }

    #[test]
    fn test_blurred_visible_only_to_creator_and_buyer() {
        let mut idea = test_idea();
        idea.is_blurred = true;

        assert!(idea.content_visible_to(Some(UserId::new(10))), "creator");
        assert!(!idea.content_visible_to(Some(UserId::new(99))), "stranger");
        assert!(!idea.content_visible_to(None), "anonymous");

        idea.minted_by = Some(UserId::new(99));
        assert!(idea.content_visible_to(Some(UserId::new(99))), "buyer");
        assert!(!idea.content_visible_to(Some(UserId::new(7))));
    }

    #[test]
    fn test_purchasable_rules() {
        let idea = test_idea();

        assert!(idea.purchasable_by(Some(UserId::new(99))));
        assert!(!idea.purchasable_by(None), "must be logged in");
        assert!(!idea.purchasable_by(Some(UserId::new(10))), "not own idea");

        let mut minted = test_idea();
        minted.minted_by = Some(UserId::new(42));
        assert!(!minted.purchasable_by(Some(UserId::new(99))), "already sold");

        let mut showcase = test_idea();
        showcase.ownership_mode = OwnershipMode::Showcase;
        assert!(!showcase.purchasable_by(Some(UserId::new(99))));
    }

    #[test]
    fn test_minted_attribution_prefers_wallet() {
        let mut idea = test_idea();
        idea.minted_by = Some(UserId::new(42));
        let mut s = summary(idea);
        s.minted_by_wallet = Some("0x1A2b3C4d5E6f7A8b9C0d1E2f3A4b5C6d7E8f9A0b".to_string());
        s.minted_by_username = Some("investor".parse().unwrap());

        assert_eq!(s.minted_attribution().unwrap(), "0x1A2b...9A0b");
    }

    #[test]
    fn test_minted_attribution_falls_back_to_username() {
        let mut idea = test_idea();
        idea.minted_by = Some(UserId::new(42));
        let mut s = summary(idea);
        s.minted_by_username = Some("investor".parse().unwrap());

        assert_eq!(s.minted_attribution().unwrap(), "@investor");
    }

    #[test]
    fn test_minted_attribution_anonymous() {
        let mut idea = test_idea();
        idea.minted_by = Some(UserId::new(42));
        let s = summary(idea);

        assert_eq!(s.minted_attribution().unwrap(), "@Anonymous");
    }

    #[test]
    fn test_unminted_has_no_attribution() {
        let s = summary(test_idea());
        assert!(s.minted_attribution().is_none());
    }

    #[test]
    fn test_shorten_wallet() {
        assert_eq!(
            shorten_wallet("0x1A2b3C4d5E6f7A8b9C0d1E2f3A4b5C6d7E8f9A0b"),
            "0x1A2b...9A0b"
        );
        assert_eq!(shorten_wallet("0xABC"), "0xABC");
    }
}
