//! Local media storage for uploaded files.
//!
//! Avatars are written under a configured storage root and served back at
//! `/media/...` public URLs by a static file service.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

use idea_hub_core::UserId;

/// Maximum accepted avatar upload size in bytes (5 MiB).
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

/// Errors that can occur when storing media.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The uploaded content type is not an accepted image format.
    #[error("unsupported media type: {0}")]
    UnsupportedType(String),

    /// The upload exceeds the size limit.
    #[error("file too large ({size} bytes, max {MAX_AVATAR_BYTES})")]
    TooLarge { size: usize },

    /// Filesystem error.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Filesystem-backed store for uploaded media.
#[derive(Clone)]
pub struct MediaStore {
    avatars_path: PathBuf,
}

impl MediaStore {
    /// Create the store and its directory layout under `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created.
    pub async fn new(root: &Path) -> Result<Self, MediaError> {
        let avatars_path = root.join("avatars");
        fs::create_dir_all(&avatars_path).await?;

        tracing::info!(root = %root.display(), "Initialized media store");

        Ok(Self { avatars_path })
    }

    /// Store an avatar image and return its public URL path.
    ///
    /// The filename embeds a fresh UUID so a re-upload never collides
    /// with (or is cached as) the previous avatar.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::UnsupportedType` for non-image content types,
    /// `MediaError::TooLarge` for oversized uploads, or an I/O error if
    /// the write fails.
    pub async fn save_avatar(
        &self,
        user_id: UserId,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, MediaError> {
        if bytes.len() > MAX_AVATAR_BYTES {
            return Err(MediaError::TooLarge { size: bytes.len() });
        }

        let ext = extension_for(content_type)
            .ok_or_else(|| MediaError::UnsupportedType(content_type.to_string()))?;

        let filename = format!("avatar-{}-{}.{ext}", user_id.as_i32(), Uuid::new_v4());
        let path = self.avatars_path.join(&filename);

        fs::write(&path, bytes).await?;

        tracing::debug!(user_id = %user_id, path = %path.display(), "Stored avatar");

        Ok(format!("/media/avatars/{filename}"))
    }
}

/// Map an image content type to a file extension.
fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_mapping() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("text/html"), None);
        assert_eq!(extension_for("application/octet-stream"), None);
    }

    #[tokio::test]
    async fn test_save_avatar_roundtrip() {
        let dir = std::env::temp_dir().join(format!("media-test-{}", Uuid::new_v4()));
        let store = MediaStore::new(&dir).await.unwrap();

        let url = store
            .save_avatar(UserId::new(7), "image/png", b"not really a png")
            .await
            .unwrap();

        assert!(url.starts_with("/media/avatars/avatar-7-"));
        assert!(url.ends_with(".png"));

        let on_disk = dir.join("avatars").join(url.rsplit('/').next().unwrap());
        let contents = tokio::fs::read(&on_disk).await.unwrap();
        assert_eq!(contents, b"not really a png");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_avatar_rejects_unknown_type() {
        let dir = std::env::temp_dir().join(format!("media-test-{}", Uuid::new_v4()));
        let store = MediaStore::new(&dir).await.unwrap();

        let result = store
            .save_avatar(UserId::new(1), "application/pdf", b"%PDF-")
            .await;
        assert!(matches!(result, Err(MediaError::UnsupportedType(_))));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
