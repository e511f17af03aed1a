//! Producer side: how uploads request thumbnails.

use anyhow::Context;
use seacloud_core::{encode_batch, ThumbnailJob};
use seacloud_infra::Publisher;

/// Publish one batch of jobs on `channel`.
///
/// Returns the number of subscribers that received it; zero means the batch
/// was dropped because no worker was listening. An empty batch is not sent.
pub async fn enqueue_thumbnails(
    publisher: &dyn Publisher,
    channel: &str,
    jobs: &[ThumbnailJob],
) -> anyhow::Result<usize> {
    if jobs.is_empty() {
        return Ok(0);
    }

    let payload = encode_batch(jobs).context("Failed to encode thumbnail batch")?;
    seacloud_core::decode_batch(&payload).context("Refusing to publish an invalid batch")?;

    let receivers = publisher
        .publish(channel, &payload)
        .await
        .with_context(|| format!("Failed to publish thumbnail batch on {channel}"))?;

    if receivers == 0 {
        tracing::warn!(channel, jobs = jobs.len(), "Thumbnail batch published with no subscribers");
    } else {
        tracing::debug!(channel, jobs = jobs.len(), receivers, "Thumbnail batch published");
    }
    Ok(receivers)
}
