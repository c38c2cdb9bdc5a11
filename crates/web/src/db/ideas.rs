//! Idea repository for database operations.
//!
//! Covers the feed, idea CRUD, upvote toggling, comments and the
//! aggregate queries behind the dashboards.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use idea_hub_core::{CommentId, IdeaId, OwnershipMode, UserId, Username};

use super::RepositoryError;
use crate::models::idea::{Comment, Idea, IdeaSummary};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` idea queries.
#[derive(Debug, sqlx::FromRow)]
struct IdeaRow {
    id: i32,
    created_by: i32,
    title: String,
    description: String,
    tags: Vec<String>,
    image_url: Option<String>,
    is_blurred: bool,
    ownership_mode: OwnershipMode,
    minted_by: Option<i32>,
    remix_of_id: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<IdeaRow> for Idea {
    fn from(row: IdeaRow) -> Self {
        Self {
            id: IdeaId::new(row.id),
            created_by: UserId::new(row.created_by),
            title: row.title,
            description: row.description,
            tags: row.tags,
            image_url: row.image_url,
            is_blurred: row.is_blurred,
            ownership_mode: row.ownership_mode,
            minted_by: row.minted_by.map(UserId::new),
            remix_of_id: row.remix_of_id.map(IdeaId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Internal row type for idea queries joined with author and aggregates.
#[derive(Debug, sqlx::FromRow)]
struct IdeaSummaryRow {
    #[sqlx(flatten)]
    idea: IdeaRow,
    author_username: String,
    upvotes: i64,
    comments: i64,
    upvoted_by_viewer: bool,
    minted_by_username: Option<String>,
    minted_by_wallet: Option<String>,
}

impl TryFrom<IdeaSummaryRow> for IdeaSummary {
    type Error = RepositoryError;

    fn try_from(row: IdeaSummaryRow) -> Result<Self, Self::Error> {
        let author_username = Username::parse(&row.author_username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;
        let minted_by_username = row
            .minted_by_username
            .as_deref()
            .map(Username::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
            })?;

        Ok(Self {
            idea: row.idea.into(),
            author_username,
            upvotes: row.upvotes,
            comments: row.comments,
            upvoted_by_viewer: row.upvoted_by_viewer,
            minted_by_username,
            minted_by_wallet: row.minted_by_wallet,
        })
    }
}

/// Internal row type for comment queries joined with the author.
#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i32,
    idea_id: i32,
    user_id: i32,
    author_username: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = RepositoryError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        let author_username = Username::parse(&row.author_username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        Ok(Self {
            id: CommentId::new(row.id),
            idea_id: IdeaId::new(row.idea_id),
            user_id: UserId::new(row.user_id),
            author_username,
            content: row.content,
            created_at: row.created_at,
        })
    }
}

const IDEA_COLUMNS: &str = "id, created_by, title, description, tags, image_url, is_blurred, \
                            ownership_mode, minted_by, remix_of_id, created_at, updated_at";

/// Base select for summaries. `$1` is always the (nullable) viewer ID.
const SUMMARY_SELECT: &str = r"
    SELECT i.id, i.created_by, i.title, i.description, i.tags, i.image_url,
           i.is_blurred, i.ownership_mode, i.minted_by, i.remix_of_id,
           i.created_at, i.updated_at,
           au.username AS author_username,
           (SELECT COUNT(*) FROM upvotes uv WHERE uv.idea_id = i.id) AS upvotes,
           (SELECT COUNT(*) FROM comments c WHERE c.idea_id = i.id) AS comments,
           EXISTS(
               SELECT 1 FROM upvotes uv
               WHERE uv.idea_id = i.id AND uv.user_id = $1
           ) AS upvoted_by_viewer,
           mu.username AS minted_by_username,
           mu.wallet_address AS minted_by_wallet
    FROM ideas i
    JOIN users au ON au.id = i.created_by
    LEFT JOIN users mu ON mu.id = i.minted_by";

// =============================================================================
// Query Parameters
// =============================================================================

/// Feed sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedSort {
    /// Most recent first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
}

impl std::str::FromStr for FeedSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            _ => Err(format!("invalid sort: {s}")),
        }
    }
}

impl std::fmt::Display for FeedSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Newest => write!(f, "newest"),
            Self::Oldest => write!(f, "oldest"),
        }
    }
}

/// Feed mint-state filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedStatus {
    /// All ideas.
    #[default]
    All,
    /// Only ideas that have been bought.
    Minted,
    /// Only ideas still for sale.
    Available,
}

impl std::str::FromStr for FeedStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "minted" => Ok(Self::Minted),
            "available" => Ok(Self::Available),
            _ => Err(format!("invalid status: {s}")),
        }
    }
}

impl std::fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Minted => write!(f, "minted"),
            Self::Available => write!(f, "available"),
        }
    }
}

/// Feed filtering and ordering options.
#[derive(Debug, Clone, Default)]
pub struct FeedFilter {
    /// Sort order.
    pub sort: FeedSort,
    /// Mint-state filter.
    pub status: FeedStatus,
    /// Only ideas carrying this tag.
    pub tag: Option<String>,
}

/// Fields for a new idea.
#[derive(Debug, Clone)]
pub struct NewIdea {
    /// Idea title.
    pub title: String,
    /// Full description.
    pub description: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Cover image URL.
    pub image_url: Option<String>,
    /// Hide the description from non-owners.
    pub is_blurred: bool,
    /// How the idea can be acquired.
    pub ownership_mode: OwnershipMode,
    /// Original idea when this is a remix.
    pub remix_of: Option<IdeaId>,
    /// Mint to the creator immediately (keeps the idea off the market).
    pub mint_to_self: bool,
}

/// Aggregate counts for the creator dashboard.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreatorTotals {
    /// Ideas created.
    pub total_ideas: i64,
    /// Upvotes across all of the creator's ideas.
    pub total_upvotes: i64,
    /// Comments across all of the creator's ideas.
    pub total_comments: i64,
    /// Of those ideas, how many have been minted.
    pub minted: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for idea database operations.
pub struct IdeaRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> IdeaRepository<'a> {
    /// Create a new idea repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List ideas for the feed.
    ///
    /// `viewer` drives the per-user upvote flag; filters narrow by mint
    /// state and tag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list(
        &self,
        viewer: Option<UserId>,
        filter: &FeedFilter,
    ) -> Result<Vec<IdeaSummary>, RepositoryError> {
        // Using runtime query to avoid SQLx offline mode cache requirements
        let mut sql = String::from(SUMMARY_SELECT);
        let mut has_where = true;
        match filter.status {
            FeedStatus::All => has_where = false,
            FeedStatus::Minted => sql.push_str(" WHERE i.minted_by IS NOT NULL"),
            FeedStatus::Available => sql.push_str(" WHERE i.minted_by IS NULL"),
        }
        if filter.tag.is_some() {
            sql.push_str(if has_where { " AND" } else { " WHERE" });
            sql.push_str(" $2 = ANY(i.tags)");
        }
        sql.push_str(match filter.sort {
            FeedSort::Newest => " ORDER BY i.created_at DESC",
            FeedSort::Oldest => " ORDER BY i.created_at ASC",
        });

        let mut query =
            sqlx::query_as::<_, IdeaSummaryRow>(&sql).bind(viewer.map(|id| id.as_i32()));
        if let Some(tag) = &filter.tag {
            query = query.bind(tag);
        }
        let rows = query.fetch_all(self.pool).await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get an idea by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: IdeaId) -> Result<Option<Idea>, RepositoryError> {
        let row = sqlx::query_as::<_, IdeaRow>(&format!(
            "SELECT {IDEA_COLUMNS} FROM ideas WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get an idea with aggregates for the detail page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_summary(
        &self,
        id: IdeaId,
        viewer: Option<UserId>,
    ) -> Result<Option<IdeaSummary>, RepositoryError> {
        let sql = format!("{SUMMARY_SELECT} WHERE i.id = $2");
        let row = sqlx::query_as::<_, IdeaSummaryRow>(&sql)
            .bind(viewer.map(|id| id.as_i32()))
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Publish a new idea.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        created_by: UserId,
        idea: &NewIdea,
    ) -> Result<Idea, RepositoryError> {
        let minted_by = idea.mint_to_self.then(|| created_by.as_i32());

        let row = sqlx::query_as::<_, IdeaRow>(&format!(
            "INSERT INTO ideas
                 (created_by, title, description, tags, image_url, is_blurred,
                  ownership_mode, minted_by, remix_of_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {IDEA_COLUMNS}"
        ))
        .bind(created_by.as_i32())
        .bind(&idea.title)
        .bind(&idea.description)
        .bind(&idea.tags)
        .bind(idea.image_url.as_deref())
        .bind(idea.is_blurred)
        .bind(idea.ownership_mode)
        .bind(minted_by)
        .bind(idea.remix_of.map(|id| id.as_i32()))
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update an idea's editable fields.
    ///
    /// Scoped to the creator; editing someone else's idea reports not found.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the idea doesn't exist or
    /// isn't owned by `editor`.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: IdeaId,
        editor: UserId,
        title: &str,
        description: &str,
        tags: &[String],
        image_url: Option<&str>,
        is_blurred: bool,
    ) -> Result<Idea, RepositoryError> {
        let row = sqlx::query_as::<_, IdeaRow>(&format!(
            "UPDATE ideas
             SET title = $1, description = $2, tags = $3, image_url = $4,
                 is_blurred = $5, updated_at = NOW()
             WHERE id = $6 AND created_by = $7
             RETURNING {IDEA_COLUMNS}"
        ))
        .bind(title)
        .bind(description)
        .bind(tags)
        .bind(image_url)
        .bind(is_blurred)
        .bind(id.as_i32())
        .bind(editor.as_i32())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete an idea.
    ///
    /// Scoped to the creator. Comments and upvotes cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the idea doesn't exist or
    /// isn't owned by `editor`.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: IdeaId, editor: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query::<sqlx::Postgres>(
            "DELETE FROM ideas WHERE id = $1 AND created_by = $2",
        )
        .bind(id.as_i32())
        .bind(editor.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Toggle an upvote. Returns `true` if the idea is now upvoted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn toggle_upvote(
        &self,
        idea_id: IdeaId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let deleted = sqlx::query::<sqlx::Postgres>(
            "DELETE FROM upvotes WHERE idea_id = $1 AND user_id = $2",
        )
        .bind(idea_id.as_i32())
        .bind(user_id.as_i32())
        .execute(self.pool)
        .await?;

        if deleted.rows_affected() > 0 {
            return Ok(false);
        }

        // ON CONFLICT covers a concurrent toggle of the same pair
        sqlx::query::<sqlx::Postgres>(
            "INSERT INTO upvotes (idea_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(idea_id.as_i32())
        .bind(user_id.as_i32())
        .execute(self.pool)
        .await?;

        Ok(true)
    }

    /// Add a comment and return it.
    ///
    /// Content is expected to be trimmed and non-empty by the caller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn add_comment(
        &self,
        idea_id: IdeaId,
        user_id: UserId,
        author_username: &Username,
        content: &str,
    ) -> Result<Comment, RepositoryError> {
        let row: (i32, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO comments (idea_id, user_id, content)
             VALUES ($1, $2, $3)
             RETURNING id, created_at",
        )
        .bind(idea_id.as_i32())
        .bind(user_id.as_i32())
        .bind(content)
        .fetch_one(self.pool)
        .await?;

        Ok(Comment {
            id: CommentId::new(row.0),
            idea_id,
            user_id,
            author_username: author_username.clone(),
            content: content.to_string(),
            created_at: row.1,
        })
    }

    /// All comments on an idea, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn comments_for(&self, idea_id: IdeaId) -> Result<Vec<Comment>, RepositoryError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r"
            SELECT c.id, c.idea_id, c.user_id, u.username AS author_username,
                   c.content, c.created_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.idea_id = $1
            ORDER BY c.created_at ASC
            ",
        )
        .bind(idea_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Aggregate counts for the creator dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn creator_totals(&self, creator: UserId) -> Result<CreatorTotals, RepositoryError> {
        let row: (i64, i64, i64, i64) = sqlx::query_as(
            r"
            SELECT
                (SELECT COUNT(*) FROM ideas WHERE created_by = $1),
                (SELECT COUNT(*) FROM upvotes uv
                 JOIN ideas i ON i.id = uv.idea_id WHERE i.created_by = $1),
                (SELECT COUNT(*) FROM comments c
                 JOIN ideas i ON i.id = c.idea_id WHERE i.created_by = $1),
                (SELECT COUNT(*) FROM ideas
                 WHERE created_by = $1 AND minted_by IS NOT NULL)
            ",
        )
        .bind(creator.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(CreatorTotals {
            total_ideas: row.0,
            total_upvotes: row.1,
            total_comments: row.2,
            minted: row.3,
        })
    }

    /// The creator's most recent ideas.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn recent_by_creator(
        &self,
        creator: UserId,
        limit: i64,
    ) -> Result<Vec<IdeaSummary>, RepositoryError> {
        let sql = format!("{SUMMARY_SELECT} WHERE i.created_by = $2 ORDER BY i.created_at DESC LIMIT $3");
        let rows = sqlx::query_as::<_, IdeaSummaryRow>(&sql)
            .bind(Some(creator.as_i32()))
            .bind(creator.as_i32())
            .bind(limit)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Ideas the user has bought, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn owned_by(&self, owner: UserId) -> Result<Vec<IdeaSummary>, RepositoryError> {
        let sql = format!("{SUMMARY_SELECT} WHERE i.minted_by = $2 ORDER BY i.updated_at DESC");
        let rows = sqlx::query_as::<_, IdeaSummaryRow>(&sql)
            .bind(Some(owner.as_i32()))
            .bind(owner.as_i32())
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Most-upvoted unminted ideas by other creators.
    ///
    /// Feeds the investor dashboard's trending list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn trending(
        &self,
        viewer: UserId,
        limit: i64,
    ) -> Result<Vec<IdeaSummary>, RepositoryError> {
        let sql = format!(
            "{SUMMARY_SELECT}
             WHERE i.minted_by IS NULL AND i.created_by <> $2
             ORDER BY upvotes DESC, i.created_at DESC
             LIMIT $3"
        );
        let rows = sqlx::query_as::<_, IdeaSummaryRow>(&sql)
            .bind(Some(viewer.as_i32()))
            .bind(viewer.as_i32())
            .bind(limit)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Every tag currently in use, sorted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn distinct_tags(&self) -> Result<Vec<String>, RepositoryError> {
        let tags = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT UNNEST(tags) AS tag FROM ideas ORDER BY tag",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(tags)
    }
}
