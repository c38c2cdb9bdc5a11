//! Domain models for the marketplace.
//!
//! These types represent validated domain objects separate from database row types.

pub mod idea;
pub mod partnership;
pub mod session;
pub mod user;
pub mod wallet;

pub use idea::{Comment, Idea, IdeaSummary};
pub use partnership::PartnershipRequest;
pub use session::{CurrentUser, PartnerFlow, keys as session_keys};
pub use user::{ProfileStats, User};
pub use wallet::{BankDetails, BankDetailsInput, CreatorWallet, WalletTransaction, WithdrawalRequest};
