#[cfg(feature = "storage-filer")]
use crate::FilerStorage;
#[cfg(feature = "storage-local")]
use crate::LocalStorage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use seacloud_core::ThumbnailWorkerConfig;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &ThumbnailWorkerConfig) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend {
        #[cfg(feature = "storage-filer")]
        StorageBackend::Filer => {
            let filer_url = config
                .filer_url
                .clone()
                .ok_or_else(|| StorageError::ConfigError("FILER_URL not configured".to_string()))?;

            let storage = FilerStorage::new(filer_url, config.storage_timeout())?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-filer"))]
        StorageBackend::Filer => Err(StorageError::ConfigError(
            "Filer storage backend not available (storage-filer feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;

            let storage = LocalStorage::new(base_path).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
