//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use url::Url;

use idea_hub_core::UserId;

use crate::config::WebConfig;
use crate::content::{ContentError, ContentStore};
use crate::models::IdeaSummary;
use crate::services::{EmailService, MediaError, MediaStore, PaymentsClient, PaymentsError};

/// Trending list cache TTL.
const TRENDING_TTL: Duration = Duration::from_secs(60);

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid base_url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("payments client error: {0}")]
    Payments(#[from] PaymentsError),
    #[error("content error: {0}")]
    Content(#[from] ContentError),
    #[error("media store error: {0}")]
    Media(#[from] MediaError),
    #[error("email transport error: {0}")]
    Email(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    pool: PgPool,
    payments: PaymentsClient,
    email: Option<EmailService>,
    content: ContentStore,
    media: MediaStore,
    trending: Cache<UserId, Arc<Vec<IdeaSummary>>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Web server configuration
    /// * `pool` - `PostgreSQL` connection pool
    /// * `content_dir` - Directory holding markdown pages and the NDA
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid, a dependent service
    /// client fails to build, or the content/media directories cannot be
    /// loaded.
    pub async fn new(
        config: WebConfig,
        pool: PgPool,
        content_dir: &std::path::Path,
    ) -> Result<Self, StateError> {
        // Validate the base URL up front; redirect URLs are derived from it
        Url::parse(&config.base_url)?;

        let payments = PaymentsClient::new(&config.payments)?;

        let email = match config.email() {
            Some(email_config) => Some(EmailService::new(email_config)?),
            None => None,
        };

        let content = ContentStore::load(content_dir)?;
        let media = MediaStore::new(config.media_root()).await?;

        let trending = Cache::builder()
            .max_capacity(1000)
            .time_to_live(TRENDING_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                payments,
                email,
                content,
                media,
                trending,
            }),
        })
    }

    /// Get a reference to the web configuration.
    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the payments service client.
    #[must_use]
    pub fn payments(&self) -> &PaymentsClient {
        &self.inner.payments
    }

    /// Get a reference to the email service, if SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    /// Get a reference to the markdown content store.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    /// Get a reference to the media store.
    #[must_use]
    pub fn media(&self) -> &MediaStore {
        &self.inner.media
    }

    /// Get a reference to the per-viewer trending ideas cache.
    #[must_use]
    pub fn trending_cache(&self) -> &Cache<UserId, Arc<Vec<IdeaSummary>>> {
        &self.inner.trending
    }
}
