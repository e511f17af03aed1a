//! seacloud-thumbnail: the SeaCloud thumbnail worker.
//!
//! Configuration comes from the environment (and `.env`); see
//! `ThumbnailWorkerConfig`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use seacloud_core::{ThumbnailJob, ThumbnailWorkerConfig};
use seacloud_db::{setup_database, FileRepository};
use seacloud_infra::{init_telemetry, shutdown_telemetry, RedisPubSub};
use seacloud_processing::{CommandConverter, ConverterRegistry, ExtensionTable};
use seacloud_storage::create_storage;
use seacloud_worker::{enqueue_thumbnails, ThumbnailPipeline, ThumbnailWorker, WorkerConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "seacloud-thumbnail", about = "SeaCloud thumbnail worker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Consume thumbnail batches until interrupted (default)
    Run,
    /// Publish one batch of thumbnail jobs
    Enqueue {
        /// File id; repeat together with --mime
        #[arg(long = "id", required = true)]
        ids: Vec<String>,
        /// MIME type of the file at the same position
        #[arg(long = "mime", required = true)]
        mimes: Vec<String>,
    },
    /// Validate configuration and check that dependencies are reachable
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ThumbnailWorkerConfig::from_env().context("Invalid configuration")?;

    init_telemetry("seacloud-thumbnail", &config.environment, config.log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(&config).await,
        Commands::Enqueue { ids, mimes } => enqueue(&config, ids, mimes).await,
        Commands::Check => check(&config).await,
    };

    shutdown_telemetry().await;
    result
}

async fn run(config: &ThumbnailWorkerConfig) -> anyhow::Result<()> {
    if config.is_production() && config.max_concurrent_jobs > 1 {
        tracing::warn!(
            max_concurrent_jobs = config.max_concurrent_jobs,
            "Running converters concurrently; size MAX_CONCURRENT_JOBS to the host"
        );
    }

    tokio::fs::create_dir_all(&config.work_dir)
        .await
        .with_context(|| format!("Failed to create work dir {}", config.work_dir.display()))?;

    let pool = setup_database(config).await?;
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage")?;
    let pubsub = RedisPubSub::new(&config.redis_url)?;
    pubsub.ping().await?;

    let converters = ConverterRegistry::standard(
        &config.convert_path,
        &config.ffmpeg_path,
        config.converter_timeout(),
    );
    tracing::info!(
        prefixes = ?converters.prefixes().collect::<Vec<_>>(),
        storage = %storage.backend_type(),
        "Converters registered"
    );
    let pipeline = ThumbnailPipeline::new(
        storage,
        Arc::new(FileRepository::new(pool.clone())),
        converters,
        ExtensionTable::standard(),
        config.work_dir.clone(),
    );
    let worker = ThumbnailWorker::new(
        pipeline,
        WorkerConfig {
            channel: config.thumbnail_channel.clone(),
            max_concurrent_jobs: config.max_concurrent_jobs,
        },
    );

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Received Ctrl+C, finishing current batch");
        signal.cancel();
    });

    let result = worker.run(&pubsub, shutdown).await;
    pool.close().await;
    result.context("Thumbnail worker stopped")
}

async fn enqueue(
    config: &ThumbnailWorkerConfig,
    ids: Vec<String>,
    mimes: Vec<String>,
) -> anyhow::Result<()> {
    if ids.len() != mimes.len() {
        anyhow::bail!(
            "Got {} --id values but {} --mime values; pass one --mime per --id",
            ids.len(),
            mimes.len()
        );
    }

    let jobs: Vec<ThumbnailJob> = ids
        .into_iter()
        .zip(mimes)
        .map(|(id, mime)| ThumbnailJob::new(id, mime))
        .collect();

    let pubsub = RedisPubSub::new(&config.redis_url)?;
    let receivers = enqueue_thumbnails(&pubsub, &config.thumbnail_channel, &jobs).await?;
    println!(
        "Published {} job(s) on {} to {} subscriber(s)",
        jobs.len(),
        config.thumbnail_channel,
        receivers
    );
    Ok(())
}

async fn check(config: &ThumbnailWorkerConfig) -> anyhow::Result<()> {
    let timeout = config.converter_timeout();
    for converter in [
        CommandConverter::image(&config.convert_path, timeout),
        CommandConverter::video(&config.ffmpeg_path, timeout),
    ] {
        let version = converter
            .probe()
            .await
            .with_context(|| format!("{} is not runnable", converter.program()))?;
        println!("ok  {}: {}", converter.program(), version);
    }

    let pool = setup_database(config).await?;
    seacloud_db::ping(&pool).await?;
    pool.close().await;
    println!("ok  database");

    RedisPubSub::new(&config.redis_url)?.ping().await?;
    println!("ok  redis ({})", config.thumbnail_channel);

    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage")?;
    println!("ok  storage ({})", storage.backend_type());

    Ok(())
}
