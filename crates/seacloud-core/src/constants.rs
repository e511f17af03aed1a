//! Fixed names shared by the worker and its producers.

/// Pub/sub channel the upload handlers publish thumbnail batches to.
pub const THUMBNAIL_CHANNEL: &str = "thumbnails";

/// Blob-store directory generated thumbnails are uploaded into.
pub const ASSETS_UPLOAD_DIR: &str = "/assets/images";

/// Public path prefix under which the API serves the asset namespace.
pub const ASSETS_PUBLIC_PREFIX: &str = "/api/assets/images";

/// Prefix of every generated thumbnail file name.
pub const THUMBNAIL_PREFIX: &str = "thumb_";

/// All thumbnails are PNG regardless of the source type.
pub const THUMBNAIL_EXTENSION: &str = "png";
pub const THUMBNAIL_CONTENT_TYPE: &str = "image/png";

/// Edge length in pixels of the square thumbnail frame.
pub const THUMBNAIL_SIZE: u32 = 200;
