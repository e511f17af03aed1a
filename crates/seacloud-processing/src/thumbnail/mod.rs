//! Thumbnail generation
//!
//! A [`ConverterRegistry`] maps MIME prefixes to converters; each
//! [`CommandConverter`] shells out to one external tool that renders a
//! 200x200 PNG preview.

pub mod converter;
pub mod mime;
pub mod registry;

pub use converter::{CommandConverter, ConversionError, ConverterKind, ThumbnailConverter};
pub use mime::ExtensionTable;
pub use registry::ConverterRegistry;
