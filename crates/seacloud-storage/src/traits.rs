//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked blob content.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Reader handed to uploads.
pub type BlobReader = Pin<Box<dyn AsyncRead + Send + Sync + Unpin>>;

/// A blob being downloaded.
pub struct Download {
    /// Content type reported by the backend, if any.
    pub content_type: Option<String>,
    pub stream: ByteStream,
}

/// Storage abstraction trait
///
/// Backends (SeaweedFS filer, local filesystem) store blobs by path. Paths may
/// start with `/`; see the crate root for the accepted format.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Download a blob as a stream of chunks, with its content type.
    async fn download_stream(&self, path: &str) -> StorageResult<Download>;

    /// Upload a blob from a reader, replacing whatever is stored at `path`.
    ///
    /// Returns the number of bytes written.
    async fn upload_stream(
        &self,
        path: &str,
        content_type: &str,
        content_length: Option<u64>,
        reader: BlobReader,
    ) -> StorageResult<u64>;

    /// Check if a blob exists
    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
