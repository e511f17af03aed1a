//! Where the worker records a finished thumbnail.

use async_trait::async_trait;
use seacloud_core::AppError;
use seacloud_db::FileRepository;
use uuid::Uuid;

/// Persists the thumbnail path for a file.
///
/// Implementations must be idempotent: recording the same path twice leaves
/// the same state as recording it once.
#[async_trait]
pub trait ThumbnailRecordStore: Send + Sync {
    async fn update_thumbnail(&self, file_id: &str, thumbnail: &str) -> Result<(), AppError>;
}

#[async_trait]
impl ThumbnailRecordStore for FileRepository {
    async fn update_thumbnail(&self, file_id: &str, thumbnail: &str) -> Result<(), AppError> {
        let id = Uuid::parse_str(file_id)
            .map_err(|e| AppError::InvalidInput(format!("file id {file_id:?} is not a UUID: {e}")))?;

        FileRepository::update_thumbnail(self, id, thumbnail).await?;
        Ok(())
    }
}
