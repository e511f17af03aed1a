//! Shared models exchanged between the upload side and the thumbnail worker.

pub mod thumbnail;

pub use thumbnail::{decode_batch, encode_batch, AssetPaths, BatchDecodeError, ThumbnailJob};
