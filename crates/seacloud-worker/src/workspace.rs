//! Temporary files for a single job.

use crate::error::CleanupError;
use seacloud_core::ThumbnailJob;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// The downloaded source and rendered thumbnail of one job.
///
/// Shared mode places both files directly in the work directory, named after
/// the job id. Isolated mode gives each job a private subdirectory so jobs
/// running at the same time never collide, even on a repeated id.
#[derive(Debug)]
pub struct JobWorkspace {
    input: PathBuf,
    output: PathBuf,
    private_dir: Option<PathBuf>,
}

impl JobWorkspace {
    pub async fn prepare(
        work_dir: &Path,
        job: &ThumbnailJob,
        extension: &str,
        isolated: bool,
    ) -> std::io::Result<Self> {
        let (dir, private_dir) = if isolated {
            let dir = work_dir.join(format!("job-{}-{}", job.id, Uuid::new_v4().simple()));
            tokio::fs::create_dir_all(&dir).await?;
            (dir.clone(), Some(dir))
        } else {
            (work_dir.to_path_buf(), None)
        };

        Ok(Self {
            input: dir.join(job.source_file_name(extension)),
            output: dir.join(job.thumbnail_file_name()),
            private_dir,
        })
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Remove the input, then the output, then the private directory.
    ///
    /// Files that were never created are not an error.
    pub async fn cleanup(self) -> Result<(), CleanupError> {
        remove_file(&self.input).await?;
        remove_file(&self.output).await?;

        if let Some(dir) = &self.private_dir {
            match tokio::fs::remove_dir(dir).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(CleanupError {
                        path: dir.clone(),
                        source: e,
                    })
                }
            }
        }

        Ok(())
    }

    /// Cleanup on a failure path: problems are logged, never returned.
    pub async fn discard(self) {
        if let Err(e) = self.cleanup().await {
            tracing::warn!(path = %e.path.display(), error = %e.source, "Failed to remove temp file");
        }
    }
}

async fn remove_file(path: &Path) -> Result<(), CleanupError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CleanupError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn job() -> ThumbnailJob {
        ThumbnailJob::new("f1", "image/png")
    }

    #[tokio::test]
    async fn shared_mode_names_files_after_the_job() {
        let dir = TempDir::new().unwrap();
        let workspace = JobWorkspace::prepare(dir.path(), &job(), "png", false)
            .await
            .unwrap();

        assert_eq!(workspace.input(), dir.path().join("f1.png"));
        assert_eq!(workspace.output(), dir.path().join("thumb_f1.png"));
    }

    #[tokio::test]
    async fn isolated_mode_uses_a_fresh_directory_per_job() {
        let dir = TempDir::new().unwrap();
        let a = JobWorkspace::prepare(dir.path(), &job(), "png", true).await.unwrap();
        let b = JobWorkspace::prepare(dir.path(), &job(), "png", true).await.unwrap();

        assert_ne!(a.input(), b.input());
        assert_eq!(a.input().file_name().unwrap(), "f1.png");
        assert_eq!(a.output().file_name().unwrap(), "thumb_f1.png");

        a.cleanup().await.unwrap();
        b.cleanup().await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn cleanup_removes_both_files() {
        let dir = TempDir::new().unwrap();
        let workspace = JobWorkspace::prepare(dir.path(), &job(), "png", false)
            .await
            .unwrap();
        std::fs::write(workspace.input(), b"source").unwrap();
        std::fs::write(workspace.output(), b"thumb").unwrap();

        workspace.cleanup().await.unwrap();
        assert!(!dir.path().join("f1.png").exists());
        assert!(!dir.path().join("thumb_f1.png").exists());
    }

    #[tokio::test]
    async fn cleanup_tolerates_files_that_were_never_written() {
        let dir = TempDir::new().unwrap();
        let workspace = JobWorkspace::prepare(dir.path(), &job(), "png", false)
            .await
            .unwrap();
        std::fs::write(workspace.input(), b"source").unwrap();

        workspace.cleanup().await.unwrap();
    }

    #[tokio::test]
    async fn cleanup_reports_the_path_it_could_not_remove() {
        let dir = TempDir::new().unwrap();
        let workspace = JobWorkspace::prepare(dir.path(), &job(), "png", false)
            .await
            .unwrap();
        // A non-empty directory where the output file should be cannot be unlinked.
        std::fs::create_dir_all(workspace.output().join("nested")).unwrap();

        let err = workspace.cleanup().await.unwrap_err();
        assert_eq!(err.path, dir.path().join("thumb_f1.png"));
    }
}
