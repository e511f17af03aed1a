//! SeaCloud thumbnail worker
//!
//! Listens for thumbnail batches, renders a 200x200 PNG for every file with an
//! external converter, uploads it next to the other assets and points the file
//! record at it.

pub mod error;
pub mod pipeline;
pub mod publisher;
pub mod records;
pub mod worker;
pub mod workspace;

pub use error::{CleanupError, JobError, JobOutcome, JobStep};
pub use pipeline::ThumbnailPipeline;
pub use publisher::enqueue_thumbnails;
pub use records::ThumbnailRecordStore;
pub use worker::{BatchReport, ThumbnailWorker, WorkerConfig};
pub use workspace::JobWorkspace;
