//! Read-only view of marketplace ideas.
//!
//! Checkout validation needs just enough of an idea to refuse bad
//! sessions before any money moves: who owns it, how it is listed, and
//! whether it has already been sold. The web process owns the table.

use sqlx::PgPool;

use idea_hub_core::{IdeaId, OwnershipMode, UserId};

use super::RepositoryError;

/// The slice of an idea that checkout validation looks at.
#[derive(Debug, Clone)]
pub struct IdeaSnapshot {
    pub id: IdeaId,
    pub created_by: UserId,
    pub title: String,
    pub ownership_mode: OwnershipMode,
    pub minted_by: Option<UserId>,
}

#[derive(Debug, sqlx::FromRow)]
struct IdeaRow {
    id: i32,
    created_by: i32,
    title: String,
    ownership_mode: OwnershipMode,
    minted_by: Option<i32>,
}

impl From<IdeaRow> for IdeaSnapshot {
    fn from(row: IdeaRow) -> Self {
        Self {
            id: IdeaId::new(row.id),
            created_by: UserId::new(row.created_by),
            title: row.title,
            ownership_mode: row.ownership_mode,
            minted_by: row.minted_by.map(UserId::new),
        }
    }
}

impl IdeaSnapshot {
    /// Whether the idea has been bought (minted) by anyone.
    #[must_use]
    pub const fn is_minted(&self) -> bool {
        self.minted_by.is_some()
    }
}

/// Read-only repository over the marketplace `ideas` table.
pub struct IdeaRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> IdeaRepository<'a> {
    /// Create a new idea repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the checkout-relevant slice of an idea.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: IdeaId) -> Result<Option<IdeaSnapshot>, RepositoryError> {
        let row = sqlx::query_as::<_, IdeaRow>(
            "SELECT id, created_by, title, ownership_mode, minted_by FROM ideas WHERE id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}
