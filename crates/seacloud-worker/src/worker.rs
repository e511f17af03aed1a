//! Channel consumer: one message is one batch, batches run one after another.
//!
//! Within a batch, jobs run sequentially unless `max_concurrent_jobs` allows
//! more. A job failure never affects the other jobs of its batch, and a
//! malformed message never stops the loop. Shutdown is honoured between
//! batches: a batch that has started always runs to the end.

use crate::error::{JobError, JobOutcome, JobStep};
use crate::pipeline::ThumbnailPipeline;
use futures::stream::{self, StreamExt};
use seacloud_core::{decode_batch, ThumbnailJob};
use seacloud_infra::{PubSubError, Subscriber, Subscription};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Worker settings
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub channel: String,
    pub max_concurrent_jobs: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            channel: seacloud_core::constants::THUMBNAIL_CHANNEL.to_string(),
            max_concurrent_jobs: 1,
        }
    }
}

/// Tally of one processed message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub jobs: usize,
    pub completed: usize,
    /// Committed, but temp files could not be removed.
    pub uncleaned: usize,
    pub failed: usize,
    /// The payload could not be decoded; no job ran.
    pub rejected: bool,
}

pub struct ThumbnailWorker {
    pipeline: Arc<ThumbnailPipeline>,
    config: WorkerConfig,
}

impl ThumbnailWorker {
    pub fn new(pipeline: ThumbnailPipeline, config: WorkerConfig) -> Self {
        let concurrent = config.max_concurrent_jobs > 1;
        Self {
            pipeline: Arc::new(pipeline.isolate_jobs(concurrent)),
            config: WorkerConfig {
                max_concurrent_jobs: config.max_concurrent_jobs.max(1),
                ..config
            },
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Subscribe to the configured channel and consume it until shutdown.
    pub async fn run(
        &self,
        subscriber: &dyn Subscriber,
        shutdown: CancellationToken,
    ) -> Result<(), PubSubError> {
        let subscription = subscriber.subscribe(&self.config.channel).await?;
        tracing::info!(
            channel = %self.config.channel,
            max_concurrent_jobs = self.config.max_concurrent_jobs,
            work_dir = %self.pipeline.work_dir().display(),
            "Thumbnail worker subscribed"
        );
        self.consume(subscription, shutdown).await
    }

    /// Consume messages from an existing subscription.
    ///
    /// Returns `Ok(())` on shutdown or when the subscription is closed, and an
    /// error when the transport fails.
    pub async fn consume(
        &self,
        mut subscription: Box<dyn Subscription>,
        shutdown: CancellationToken,
    ) -> Result<(), PubSubError> {
        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutdown requested, thumbnail worker stopping");
                    return Ok(());
                }
                next = subscription.next_message() => next,
            };

            match next {
                Ok(Some(message)) => {
                    self.process_batch(&message.payload).await;
                }
                Ok(None) => {
                    tracing::info!(channel = %self.config.channel, "Subscription closed");
                    return Ok(());
                }
                Err(e) if !e.is_fatal() => {
                    tracing::warn!(error = %e, "Skipping unreadable message");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Subscription failed");
                    return Err(e);
                }
            }
        }
    }

    /// Decode one message and run every job in it.
    pub async fn process_batch(&self, payload: &str) -> BatchReport {
        let jobs = match decode_batch(payload) {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!(error = %e, payload_len = payload.len(), "Discarding malformed batch");
                return BatchReport {
                    rejected: true,
                    ..BatchReport::default()
                };
            }
        };

        tracing::debug!(jobs = jobs.len(), "Batch received");

        let pipeline = &self.pipeline;
        let results: Vec<(ThumbnailJob, Result<JobOutcome, JobError>)> = stream::iter(jobs)
            .map(|job| async move {
                let result = pipeline.process_job(&job).await;
                (job, result)
            })
            .buffered(self.config.max_concurrent_jobs)
            .collect()
            .await;

        let mut report = BatchReport {
            jobs: results.len(),
            ..BatchReport::default()
        };
        for (job, result) in &results {
            match result {
                Ok(JobOutcome::Completed { .. }) => report.completed += 1,
                Ok(JobOutcome::CommittedWithCleanupFailure { error, .. }) => {
                    report.uncleaned += 1;
                    tracing::warn!(
                        file_id = %job.id,
                        step = %JobStep::Cleanup,
                        path = %error.path.display(),
                        error = %error.source,
                        "Thumbnail committed but temp files remain"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        file_id = %job.id,
                        mime = %job.mime,
                        step = %e.step(),
                        thumbnail_uploaded = e.thumbnail_uploaded(),
                        error = %e,
                        "Thumbnail job failed"
                    );
                }
            }
        }

        tracing::info!(
            jobs = report.jobs,
            completed = report.completed,
            uncleaned = report.uncleaned,
            failed = report.failed,
            "Batch finished"
        );
        report
    }
}
