//! SeaCloud Core Library
//!
//! Shared configuration, constants, error types and the thumbnail job model
//! used by every SeaCloud worker component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{LogFormat, ThumbnailWorkerConfig};
pub use error::AppError;
pub use models::{decode_batch, encode_batch, AssetPaths, BatchDecodeError, ThumbnailJob};
pub use storage_types::StorageBackend;
