//! SeaCloud Storage Library
//!
//! Blob storage abstraction for the thumbnail worker, with a SeaweedFS filer
//! client and a local filesystem backend.
//!
//! # Path format
//!
//! Blobs are addressed by slash-separated paths such as `/assets/images/thumb_x.png`
//! or a bare file id. A leading `/` is optional; `..` segments and empty paths are
//! rejected. Normalization lives in the `paths` module so both backends agree.

pub mod factory;
#[cfg(feature = "storage-filer")]
pub mod filer;
#[cfg(feature = "storage-local")]
pub mod local;
pub(crate) mod paths;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-filer")]
pub use filer::FilerStorage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use seacloud_core::StorageBackend;
pub use traits::{BlobReader, ByteStream, Download, Storage, StorageError, StorageResult};
