//! MIME-prefix dispatch to converters.

use std::sync::Arc;
use std::time::Duration;

use super::converter::{CommandConverter, ThumbnailConverter};

/// Ordered `(prefix, converter)` table. The first prefix the MIME type starts
/// with wins; a type matching nothing has no converter.
///
/// Matching is exact: no trimming, no case folding.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    entries: Vec<(String, Arc<dyn ThumbnailConverter>)>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Image, video and PDF converters, matched in that order.
    pub fn standard(convert_path: &str, ffmpeg_path: &str, timeout: Duration) -> Self {
        Self::new()
            .with("image", Arc::new(CommandConverter::image(convert_path, timeout)))
            .with("video", Arc::new(CommandConverter::video(ffmpeg_path, timeout)))
            .with(
                "application/pdf",
                Arc::new(CommandConverter::pdf(convert_path, timeout)),
            )
    }

    /// Append a converter for MIME types starting with `prefix`.
    pub fn with(mut self, prefix: &str, converter: Arc<dyn ThumbnailConverter>) -> Self {
        self.entries.push((prefix.to_string(), converter));
        self
    }

    pub fn resolve(&self, mime: &str) -> Option<Arc<dyn ThumbnailConverter>> {
        self.entries
            .iter()
            .find(|(prefix, _)| mime.starts_with(prefix.as_str()))
            .map(|(_, converter)| Arc::clone(converter))
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(prefix, _)| prefix.as_str())
    }
}
