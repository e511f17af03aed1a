//! Configuration module
//!
//! Settings for the thumbnail worker: database, pub/sub, blob storage,
//! converter binaries and logging. Everything comes from the environment
//! (optionally seeded from a `.env` file).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::THUMBNAIL_CHANNEL;
use crate::storage_types::StorageBackend;

const DB_MAX_CONNECTIONS: u32 = 5;
const DB_TIMEOUT_SECS: u64 = 30;
const STORAGE_TIMEOUT_SECS: u64 = 60;
const CONVERTER_TIMEOUT_SECS: u64 = 120;
const MAX_CONCURRENT_JOBS: usize = 1;

/// Log output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

/// Thumbnail worker configuration
#[derive(Clone, Debug)]
pub struct ThumbnailWorkerConfig {
    pub environment: String,
    pub log_format: LogFormat,
    // Database
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Pub/sub
    pub redis_url: String,
    pub thumbnail_channel: String,
    // Blob storage
    pub storage_backend: StorageBackend,
    pub filer_url: Option<String>,
    pub local_storage_path: Option<String>,
    pub storage_timeout_seconds: u64,
    // Conversion
    pub work_dir: PathBuf,
    pub convert_path: String,
    pub ffmpeg_path: String,
    pub converter_timeout_seconds: u64,
    pub max_concurrent_jobs: usize,
}

impl ThumbnailWorkerConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let log_format = var("LOG_FORMAT")
            .map(|s| s.parse::<LogFormat>())
            .transpose()?
            .unwrap_or(LogFormat::Pretty);

        let storage_backend = var("STORAGE_BACKEND")
            .map(|s| s.parse::<StorageBackend>())
            .transpose()?
            .unwrap_or(StorageBackend::Filer);

        let config = ThumbnailWorkerConfig {
            environment,
            log_format,
            database_url: var("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: parse_or(&var, "DB_MAX_CONNECTIONS", DB_MAX_CONNECTIONS)?,
            db_timeout_seconds: parse_or(&var, "DB_TIMEOUT_SECONDS", DB_TIMEOUT_SECS)?,
            redis_url: var("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
            thumbnail_channel: var("THUMBNAIL_CHANNEL")
                .unwrap_or_else(|| THUMBNAIL_CHANNEL.to_string()),
            storage_backend,
            filer_url: var("FILER_URL"),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            storage_timeout_seconds: parse_or(&var, "STORAGE_TIMEOUT_SECS", STORAGE_TIMEOUT_SECS)?,
            work_dir: var("THUMBNAIL_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            convert_path: var("CONVERT_PATH").unwrap_or_else(|| "convert".to_string()),
            ffmpeg_path: var("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()),
            converter_timeout_seconds: parse_or(
                &var,
                "CONVERTER_TIMEOUT_SECS",
                CONVERTER_TIMEOUT_SECS,
            )?,
            max_concurrent_jobs: parse_or(&var, "MAX_CONCURRENT_JOBS", MAX_CONCURRENT_JOBS)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.database_url.starts_with("postgres://")
            || self.database_url.starts_with("postgresql://"))
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        match self.storage_backend {
            StorageBackend::Filer if self.filer_url.is_none() => {
                return Err(anyhow::anyhow!(
                    "STORAGE_BACKEND=filer requires FILER_URL to be set"
                ));
            }
            StorageBackend::Local if self.local_storage_path.is_none() => {
                return Err(anyhow::anyhow!(
                    "STORAGE_BACKEND=local requires LOCAL_STORAGE_PATH to be set"
                ));
            }
            _ => {}
        }

        if self.thumbnail_channel.trim().is_empty() {
            return Err(anyhow::anyhow!("THUMBNAIL_CHANNEL cannot be empty"));
        }

        if self.max_concurrent_jobs == 0 {
            return Err(anyhow::anyhow!("MAX_CONCURRENT_JOBS must be at least 1"));
        }

        if self.converter_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("CONVERTER_TIMEOUT_SECS must be at least 1"));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn converter_timeout(&self) -> Duration {
        Duration::from_secs(self.converter_timeout_seconds)
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.storage_timeout_seconds)
    }

    pub fn db_timeout(&self) -> Duration {
        Duration::from_secs(self.db_timeout_seconds)
    }
}

fn parse_or<F, T>(var: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", key)),
        None => Ok(default),
    }
}
