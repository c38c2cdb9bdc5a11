//! Partnership request repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use idea_hub_core::{IdeaId, PartnershipRequestId, RequestStatus, UserId};

use super::RepositoryError;
use crate::models::partnership::PartnershipRequest;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` partnership request queries.
#[derive(Debug, sqlx::FromRow)]
struct PartnershipRequestRow {
    id: i32,
    idea_id: i32,
    investor_id: i32,
    investor_name: String,
    investor_email: String,
    nda_signature: String,
    message: Option<String>,
    payment_completed: bool,
    status: RequestStatus,
    created_at: DateTime<Utc>,
}

impl From<PartnershipRequestRow> for PartnershipRequest {
    fn from(row: PartnershipRequestRow) -> Self {
        Self {
            id: PartnershipRequestId::new(row.id),
            idea_id: IdeaId::new(row.idea_id),
            investor_id: UserId::new(row.investor_id),
            investor_name: row.investor_name,
            investor_email: row.investor_email,
            nda_signature: row.nda_signature,
            message: row.message,
            payment_completed: row.payment_completed,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

const REQUEST_COLUMNS: &str = "id, idea_id, investor_id, investor_name, investor_email, \
                               nda_signature, message, payment_completed, status, created_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for partnership request database operations.
pub struct PartnershipRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PartnershipRepository<'a> {
    /// Create a new partnership repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a completed partnership request.
    ///
    /// Called at the end of the wizard once the NDA is signed and the
    /// access fee paid; requests start out pending for the creator.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        idea_id: IdeaId,
        investor_id: UserId,
        investor_name: &str,
        investor_email: &str,
        nda_signature: &str,
        message: Option<&str>,
    ) -> Result<PartnershipRequest, RepositoryError> {
        // Using runtime query to avoid SQLx offline mode cache requirements
        let row = sqlx::query_as::<_, PartnershipRequestRow>(&format!(
            "INSERT INTO partnership_requests
                 (idea_id, investor_id, investor_name, investor_email,
                  nda_signature, message, payment_completed, status)
             VALUES ($1, $2, $3, $4, $5, $6, TRUE, 'pending')
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(idea_id.as_i32())
        .bind(investor_id.as_i32())
        .bind(investor_name)
        .bind(investor_email)
        .bind(nda_signature)
        .bind(message)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Pending requests on ideas created by this user, newest first.
    ///
    /// Shown on the creator dashboard with investor contact details.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn pending_for_creator(
        &self,
        creator: UserId,
    ) -> Result<Vec<(PartnershipRequest, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct RequestWithTitleRow {
            #[sqlx(flatten)]
            request: PartnershipRequestRow,
            idea_title: String,
        }

        let rows = sqlx::query_as::<_, RequestWithTitleRow>(&format!(
            "SELECT {}, i.title AS idea_title
             FROM partnership_requests pr
             JOIN ideas i ON i.id = pr.idea_id
             WHERE i.created_by = $1 AND pr.status = 'pending'
             ORDER BY pr.created_at DESC",
            prefixed_request_columns()
        ))
        .bind(creator.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.request.into(), r.idea_title))
            .collect())
    }
}

/// `REQUEST_COLUMNS` with the `pr.` prefix for joined queries.
fn prefixed_request_columns() -> String {
    REQUEST_COLUMNS
        .split(", ")
        .map(|c| format!("pr.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_request_columns() {
        let prefixed = prefixed_request_columns();
        assert!(prefixed.starts_with("pr.id, pr.idea_id"));
        assert!(prefixed.ends_with("pr.created_at"));
        assert!(!prefixed.contains("pr.pr."));
    }
}
