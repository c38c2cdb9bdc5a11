//! Partnership request domain types.

use chrono::{DateTime, Utc};

use idea_hub_core::{IdeaId, PartnershipRequestId, RequestStatus, UserId};

/// A paid partnership request on an idea (domain type).
///
/// Created at the end of the partnership wizard, after the NDA has been
/// signed and the access fee paid.
#[derive(Debug, Clone)]
pub struct PartnershipRequest {
    /// Unique request ID.
    pub id: PartnershipRequestId,
    /// Idea the request targets.
    pub idea_id: IdeaId,
    /// Investor who made the request.
    pub investor_id: UserId,
    /// Investor's name as entered on the NDA.
    pub investor_name: String,
    /// Investor's contact email for the creator.
    pub investor_email: String,
    /// Typed full-name signature accepting the NDA.
    pub nda_signature: String,
    /// Message to the creator.
    pub message: Option<String>,
    /// Whether the access fee has been paid.
    pub payment_completed: bool,
    /// Review state (creators accept or decline).
    pub status: RequestStatus,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
}
