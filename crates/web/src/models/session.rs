//! Session-related types.
//!
//! Types stored in the session for authentication state and the
//! multi-step partnership flow.

use serde::{Deserialize, Serialize};

use idea_hub_core::{Email, IdeaId, UserId, Username};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
/// Role and premium status are read from the database per request so
/// webhook-driven changes take effect without a re-login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// User's display handle.
    pub username: Username,
}

/// In-progress partnership request, carried across the wizard steps.
///
/// Step 1 stores the signed NDA, step 2 records the payment acknowledgement,
/// step 3 attaches the message and persists the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerFlow {
    /// Idea the investor wants to partner on.
    pub idea_id: IdeaId,
    /// Typed full-name signature from the NDA step.
    pub nda_signature: String,
    /// Investor's name as entered on the NDA.
    pub investor_name: String,
    /// Investor's contact email for the creator.
    pub investor_email: String,
    /// Set once the payment step has been passed.
    pub payment_acknowledged: bool,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the in-progress partnership request flow.
    pub const PARTNER_FLOW: &str = "partner_flow";
}
