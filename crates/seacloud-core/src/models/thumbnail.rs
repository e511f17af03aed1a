//! Thumbnail job model and the JSON batch format carried on the channel.
//!
//! One channel message is a JSON array of jobs:
//!
//! ```json
//! [{"id": "0b6c1f9e-4a43-4a86-9d1e-0d3f2f7c9a11", "mime": "image/png"}]
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{
    ASSETS_PUBLIC_PREFIX, ASSETS_UPLOAD_DIR, THUMBNAIL_EXTENSION, THUMBNAIL_PREFIX,
};

/// One file that needs a thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailJob {
    /// File identifier; also the blob path of the original upload.
    pub id: String,
    /// MIME type recorded when the file was uploaded.
    pub mime: String,
}

impl ThumbnailJob {
    pub fn new(id: impl Into<String>, mime: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mime: mime.into(),
        }
    }

    /// Local file name of the generated thumbnail: `thumb_{id}.png`.
    pub fn thumbnail_file_name(&self) -> String {
        format!("{}{}.{}", THUMBNAIL_PREFIX, self.id, THUMBNAIL_EXTENSION)
    }

    /// Local file name of the downloaded original for a given extension.
    pub fn source_file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.id, extension.trim_start_matches('.'))
    }

    pub fn asset_paths(&self) -> AssetPaths {
        let name = self.thumbnail_file_name();
        AssetPaths {
            storage_path: format!("{}/{}", ASSETS_UPLOAD_DIR, name),
            public_path: format!("{}/{}", ASSETS_PUBLIC_PREFIX, name),
        }
    }
}

/// Where a job's thumbnail lives once committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    /// Path inside the blob store the thumbnail is uploaded to.
    pub storage_path: String,
    /// Path written to the file record and served by the API.
    pub public_path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum BatchDecodeError {
    #[error("malformed batch payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("job {index} has an invalid file id {id:?}")]
    InvalidId { index: usize, id: String },
}

/// Decode one channel payload into its jobs, in order.
///
/// File ids end up in local file names, so anything other than ASCII
/// alphanumerics, `-` and `_` rejects the whole batch.
pub fn decode_batch(payload: &str) -> Result<Vec<ThumbnailJob>, BatchDecodeError> {
    let jobs: Vec<ThumbnailJob> = serde_json::from_str(payload)?;

    for (index, job) in jobs.iter().enumerate() {
        if !is_valid_file_id(&job.id) {
            return Err(BatchDecodeError::InvalidId {
                index,
                id: job.id.clone(),
            });
        }
    }

    Ok(jobs)
}

/// Encode jobs the way the upload handlers publish them.
pub fn encode_batch(jobs: &[ThumbnailJob]) -> Result<String, serde_json::Error> {
    serde_json::to_string(jobs)
}

fn is_valid_file_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_jobs_in_order() {
        let payload = r#"[
            {"id": "0b6c1f9e-4a43-4a86-9d1e-0d3f2f7c9a11", "mime": "image/png"},
            {"id": "f2", "mime": "video/mp4"}
        ]"#;

        let jobs = decode_batch(payload).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, "0b6c1f9e-4a43-4a86-9d1e-0d3f2f7c9a11");
        assert_eq!(jobs[1], ThumbnailJob::new("f2", "video/mp4"));
    }

    #[test]
    fn empty_array_is_an_empty_batch() {
        assert!(decode_batch("[]").unwrap().is_empty());
    }

    #[test]
    fn rejects_non_array_payloads() {
        assert!(matches!(
            decode_batch(r#"{"id": "f1", "mime": "image/png"}"#),
            Err(BatchDecodeError::Json(_))
        ));
        assert!(matches!(decode_batch("not json"), Err(BatchDecodeError::Json(_))));
    }

    #[test]
    fn rejects_ids_that_escape_the_work_dir() {
        let err = decode_batch(r#"[{"id": "ok", "mime": "image/png"}, {"id": "../etc", "mime": "image/png"}]"#)
            .unwrap_err();
        assert!(matches!(err, BatchDecodeError::InvalidId { index: 1, .. }));
    }

    #[test]
    fn derives_deterministic_names() {
        let job = ThumbnailJob::new("f1", "image/png");
        assert_eq!(job.source_file_name("png"), "f1.png");
        assert_eq!(job.source_file_name(".mov"), "f1.mov");
        assert_eq!(job.thumbnail_file_name(), "thumb_f1.png");

        let paths = job.asset_paths();
        assert_eq!(paths.storage_path, "/assets/images/thumb_f1.png");
        assert_eq!(paths.public_path, "/api/assets/images/thumb_f1.png");
    }

    #[test]
    fn encoded_batch_uses_the_published_field_names() {
        let payload = encode_batch(&[ThumbnailJob::new("f1", "application/pdf")]).unwrap();
        assert_eq!(payload, r#"[{"id":"f1","mime":"application/pdf"}]"#);
    }
}
