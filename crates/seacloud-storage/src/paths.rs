//! Shared path normalization for storage backends.

use crate::traits::{StorageError, StorageResult};

/// Normalize a blob path to its relative form (`assets/images/x.png`).
///
/// Leading slashes are dropped and repeated separators collapsed. Empty paths,
/// `.`/`..` segments and backslashes are rejected.
pub fn normalize(path: &str) -> StorageResult<String> {
    if path.contains('\\') {
        return Err(StorageError::InvalidPath(path.to_string()));
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() || segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(StorageError::InvalidPath(path.to_string()));
    }

    Ok(segments.join("/"))
}

/// Last segment of a normalized path.
pub fn file_name(normalized: &str) -> &str {
    normalized.rsplit('/').next().unwrap_or(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_and_duplicate_slashes() {
        assert_eq!(
            normalize("/assets//images/thumb_f1.png").unwrap(),
            "assets/images/thumb_f1.png"
        );
        assert_eq!(normalize("f1").unwrap(), "f1");
    }

    #[test]
    fn rejects_traversal_and_empty_paths() {
        for bad in ["", "/", "../etc/passwd", "/assets/../../x", "a/./b", "a\\b"] {
            assert!(
                matches!(normalize(bad), Err(StorageError::InvalidPath(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn file_name_is_last_segment() {
        assert_eq!(file_name("assets/images/thumb_f1.png"), "thumb_f1.png");
        assert_eq!(file_name("f1"), "f1");
    }
}
