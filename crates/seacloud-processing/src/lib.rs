//! SeaCloud Media Processing Library
//!
//! Thumbnail generation through external converters (ImageMagick, FFmpeg).

pub mod thumbnail;

// Re-export commonly used types
pub use thumbnail::{
    CommandConverter, ConversionError, ConverterKind, ConverterRegistry, ExtensionTable,
    ThumbnailConverter,
};
