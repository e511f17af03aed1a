//! Per-job failure and outcome types.

use seacloud_core::AppError;
use seacloud_processing::ConversionError;
use seacloud_storage::StorageError;
use std::fmt;
use std::path::PathBuf;

/// Pipeline step a job was in when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStep {
    Dispatch,
    Download,
    Convert,
    Upload,
    RecordUpdate,
    Cleanup,
}

impl fmt::Display for JobStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStep::Dispatch => "dispatch",
            JobStep::Download => "download",
            JobStep::Convert => "convert",
            JobStep::Upload => "upload",
            JobStep::RecordUpdate => "record_update",
            JobStep::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Why a job produced no committed thumbnail.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("no converter for mime type {mime:?}")]
    UnsupportedMedia { mime: String },

    #[error("no file extension known for mime type {mime:?}")]
    UnknownExtension { mime: String },

    #[error("download failed: {0}")]
    Download(#[source] StorageError),

    #[error("temp file {path} ({step}): {source}")]
    TempFile {
        step: JobStep,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    #[error("upload failed: {0}")]
    Upload(#[source] StorageError),

    #[error("record update failed: {0}")]
    RecordUpdate(#[source] AppError),
}

impl JobError {
    pub fn step(&self) -> JobStep {
        match self {
            JobError::UnsupportedMedia { .. } | JobError::UnknownExtension { .. } => {
                JobStep::Dispatch
            }
            JobError::Download(_) => JobStep::Download,
            JobError::TempFile { step, .. } => *step,
            JobError::Conversion(_) => JobStep::Convert,
            JobError::Upload(_) => JobStep::Upload,
            JobError::RecordUpdate(_) => JobStep::RecordUpdate,
        }
    }

    /// Whether the thumbnail blob was already written when the job failed.
    pub fn thumbnail_uploaded(&self) -> bool {
        matches!(self, JobError::RecordUpdate(_))
    }
}

/// A temp file that could not be removed.
#[derive(Debug, thiserror::Error)]
#[error("failed to remove {path}: {source}")]
pub struct CleanupError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Result of a job whose thumbnail was uploaded and recorded.
#[derive(Debug)]
pub enum JobOutcome {
    Completed {
        thumbnail: String,
        bytes: u64,
    },
    /// Thumbnail uploaded and recorded, but temp files were left behind.
    CommittedWithCleanupFailure {
        thumbnail: String,
        bytes: u64,
        error: CleanupError,
    },
}

impl JobOutcome {
    /// Public path written to the file record.
    pub fn thumbnail(&self) -> &str {
        match self {
            JobOutcome::Completed { thumbnail, .. }
            | JobOutcome::CommittedWithCleanupFailure { thumbnail, .. } => thumbnail,
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, JobOutcome::Completed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_report_their_step() {
        assert_eq!(
            JobError::UnsupportedMedia { mime: "text/plain".into() }.step(),
            JobStep::Dispatch
        );
        assert_eq!(
            JobError::Download(StorageError::NotFound("f1".into())).step(),
            JobStep::Download
        );
        assert_eq!(
            JobError::TempFile {
                step: JobStep::Upload,
                path: PathBuf::from("thumb_f1.png"),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }
            .step(),
            JobStep::Upload
        );
        assert_eq!(
            JobError::RecordUpdate(AppError::Internal("pool closed".into())).step(),
            JobStep::RecordUpdate
        );
    }

    #[test]
    fn only_record_update_failures_leave_an_uploaded_blob() {
        assert!(JobError::RecordUpdate(AppError::Internal("x".into())).thumbnail_uploaded());
        assert!(!JobError::Upload(StorageError::UploadFailed("x".into())).thumbnail_uploaded());
    }

    #[test]
    fn step_names_are_snake_case() {
        assert_eq!(JobStep::RecordUpdate.to_string(), "record_update");
        assert_eq!(JobStep::Convert.to_string(), "convert");
    }
}
