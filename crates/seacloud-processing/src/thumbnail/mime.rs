//! MIME type to file extension lookup for downloaded originals.

use std::collections::HashMap;

/// Extension table: explicitly registered types first, then the
/// `mime_guess` database.
///
/// Registered types match exactly, like converter dispatch; only MIME
/// parameters (`; charset=...`) are dropped.
#[derive(Debug, Clone, Default)]
pub struct ExtensionTable {
    registered: HashMap<String, String>,
}

impl ExtensionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the types uploads commonly carry pinned to one extension.
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.register("video/quicktime", "mov");
        table.register("image/jpeg", "jpg");
        table.register("image/png", "png");
        table.register("image/gif", "gif");
        table.register("image/webp", "webp");
        table.register("video/mp4", "mp4");
        table.register("application/pdf", "pdf");
        table
    }

    pub fn register(&mut self, mime: &str, extension: &str) {
        self.registered.insert(
            essence(mime),
            extension.trim_start_matches('.').to_lowercase(),
        );
    }

    /// Extension (without the dot) for a MIME type, or `None` if the type is unknown.
    pub fn extension_for(&self, mime: &str) -> Option<String> {
        let essence = essence(mime);
        if let Some(ext) = self.registered.get(&essence) {
            return Some(ext.clone());
        }

        mime_guess::get_mime_extensions_str(&essence)
            .and_then(|exts| exts.first())
            .map(|ext| ext.to_string())
    }
}

/// `type/subtype` without parameters.
fn essence(mime: &str) -> String {
    mime.split(';').next().unwrap_or("").trim_end().to_string()
}
