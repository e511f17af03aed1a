//! Single-job thumbnail pipeline.
//!
//! ```text
//! dispatch -> download -> convert -> upload -> record update -> cleanup
//! ```
//!
//! A job commits only once the record update succeeds. Any earlier failure
//! leaves the blob store and the file record untouched, apart from a record
//! update failure which happens after the thumbnail blob is written.

use crate::error::{JobError, JobOutcome, JobStep};
use crate::records::ThumbnailRecordStore;
use crate::workspace::JobWorkspace;
use futures::StreamExt;
use seacloud_core::constants::THUMBNAIL_CONTENT_TYPE;
use seacloud_core::ThumbnailJob;
use seacloud_processing::{ConverterRegistry, ExtensionTable};
use seacloud_storage::Storage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;

/// Everything one job needs, shared by every job the worker runs.
pub struct ThumbnailPipeline {
    storage: Arc<dyn Storage>,
    records: Arc<dyn ThumbnailRecordStore>,
    converters: ConverterRegistry,
    extensions: ExtensionTable,
    work_dir: PathBuf,
    isolate_jobs: bool,
}

impl ThumbnailPipeline {
    pub fn new(
        storage: Arc<dyn Storage>,
        records: Arc<dyn ThumbnailRecordStore>,
        converters: ConverterRegistry,
        extensions: ExtensionTable,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            storage,
            records,
            converters,
            extensions,
            work_dir: work_dir.into(),
            isolate_jobs: false,
        }
    }

    /// Give every job its own subdirectory of the work directory.
    ///
    /// Required whenever jobs run concurrently.
    pub fn isolate_jobs(mut self, isolate: bool) -> Self {
        self.isolate_jobs = isolate;
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Run one job to completion.
    #[tracing::instrument(skip(self, job), fields(file_id = %job.id, mime = %job.mime))]
    pub async fn process_job(&self, job: &ThumbnailJob) -> Result<JobOutcome, JobError> {
        let start = Instant::now();

        let converter = self
            .converters
            .resolve(&job.mime)
            .ok_or_else(|| JobError::UnsupportedMedia {
                mime: job.mime.clone(),
            })?;
        let extension = self
            .extensions
            .extension_for(&job.mime)
            .ok_or_else(|| JobError::UnknownExtension {
                mime: job.mime.clone(),
            })?;

        let workspace =
            JobWorkspace::prepare(&self.work_dir, job, &extension, self.isolate_jobs)
                .await
                .map_err(|e| JobError::TempFile {
                    step: JobStep::Download,
                    path: self.work_dir.clone(),
                    source: e,
                })?;

        let bytes = match self.render_and_commit(job, &workspace, &*converter).await {
            Ok(bytes) => bytes,
            Err(e) => {
                workspace.discard().await;
                return Err(e);
            }
        };

        let thumbnail = job.asset_paths().public_path;
        tracing::info!(
            converter = %converter.kind(),
            thumbnail = %thumbnail,
            bytes,
            duration_ms = start.elapsed().as_millis() as u64,
            "Thumbnail committed"
        );

        match workspace.cleanup().await {
            Ok(()) => Ok(JobOutcome::Completed { thumbnail, bytes }),
            Err(error) => Ok(JobOutcome::CommittedWithCleanupFailure {
                thumbnail,
                bytes,
                error,
            }),
        }
    }

    async fn render_and_commit(
        &self,
        job: &ThumbnailJob,
        workspace: &JobWorkspace,
        converter: &dyn seacloud_processing::ThumbnailConverter,
    ) -> Result<u64, JobError> {
        let downloaded = self.download(job, workspace.input()).await?;
        tracing::debug!(bytes = downloaded, path = %workspace.input().display(), "Source downloaded");

        converter
            .convert(workspace.input(), workspace.output())
            .await?;

        let paths = job.asset_paths();
        let uploaded = self.upload(workspace.output(), &paths.storage_path).await?;

        self.records
            .update_thumbnail(&job.id, &paths.public_path)
            .await
            .map_err(JobError::RecordUpdate)?;

        Ok(uploaded)
    }

    async fn download(&self, job: &ThumbnailJob, dest: &Path) -> Result<u64, JobError> {
        let temp_err = |e: std::io::Error| JobError::TempFile {
            step: JobStep::Download,
            path: dest.to_path_buf(),
            source: e,
        };

        let mut download = self
            .storage
            .download_stream(&job.id)
            .await
            .map_err(JobError::Download)?;

        let mut file = tokio::fs::File::create(dest).await.map_err(temp_err)?;
        let mut written = 0u64;
        while let Some(chunk) = download.stream.next().await {
            let chunk = chunk.map_err(JobError::Download)?;
            file.write_all(&chunk).await.map_err(temp_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(temp_err)?;

        Ok(written)
    }

    async fn upload(&self, source: &Path, storage_path: &str) -> Result<u64, JobError> {
        let temp_err = |e: std::io::Error| JobError::TempFile {
            step: JobStep::Upload,
            path: source.to_path_buf(),
            source: e,
        };

        let file = tokio::fs::File::open(source).await.map_err(temp_err)?;
        let length = file.metadata().await.map_err(temp_err)?.len();

        self.storage
            .upload_stream(
                storage_path,
                THUMBNAIL_CONTENT_TYPE,
                Some(length),
                Box::pin(file),
            )
            .await
            .map_err(JobError::Upload)
    }
}
