#![allow(dead_code)]

use async_trait::async_trait;
use seacloud_core::AppError;
use seacloud_processing::{
    ConversionError, ConverterKind, ConverterRegistry, ExtensionTable, ThumbnailConverter,
};
use seacloud_storage::{LocalStorage, Storage};
use seacloud_worker::{ThumbnailPipeline, ThumbnailRecordStore};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Render,
    Fail,
    /// Render, then swap the input file for a non-empty directory.
    RenderAndBlockInput,
}

/// Converter that copies a marker into the output instead of rendering.
pub struct FakeConverter {
    kind: ConverterKind,
    behavior: Behavior,
    pub calls: Mutex<Vec<(PathBuf, PathBuf)>>,
    runs: AtomicUsize,
}

impl FakeConverter {
    fn build(kind: ConverterKind, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            kind,
            behavior,
            calls: Mutex::new(Vec::new()),
            runs: AtomicUsize::new(0),
        })
    }

    pub fn succeeding(kind: ConverterKind) -> Arc<Self> {
        Self::build(kind, Behavior::Render)
    }

    pub fn failing(kind: ConverterKind) -> Arc<Self> {
        Self::build(kind, Behavior::Fail)
    }

    /// Renders normally but leaves an input path that cannot be unlinked.
    pub fn blocking_cleanup(kind: ConverterKind) -> Arc<Self> {
        Self::build(kind, Behavior::RenderAndBlockInput)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ThumbnailConverter for FakeConverter {
    fn kind(&self) -> ConverterKind {
        self.kind
    }

    async fn convert(&self, input: &Path, output: &Path) -> Result<(), ConversionError> {
        self.calls
            .lock()
            .unwrap()
            .push((input.to_path_buf(), output.to_path_buf()));
        let run = self.runs.fetch_add(1, Ordering::SeqCst) + 1;

        if self.behavior == Behavior::Fail {
            return Err(ConversionError::Failed {
                program: "fake".into(),
                status: "exit status: 1".into(),
                stdout: String::new(),
                stderr: "corrupt input".into(),
            });
        }

        let source = tokio::fs::read(input).await.unwrap();
        let rendered = format!("thumb#{run}:{}", String::from_utf8_lossy(&source));
        tokio::fs::write(output, rendered).await.unwrap();

        if self.behavior == Behavior::RenderAndBlockInput {
            tokio::fs::remove_file(input).await.unwrap();
            tokio::fs::create_dir_all(input.join("frames")).await.unwrap();
        }
        Ok(())
    }
}

/// Record store that remembers every update.
#[derive(Default)]
pub struct RecordingStore {
    pub updates: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl RecordingStore {
    pub fn failing() -> Self {
        Self {
            updates: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn updates(&self) -> Vec<(String, String)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl ThumbnailRecordStore for RecordingStore {
    async fn update_thumbnail(&self, file_id: &str, thumbnail: &str) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::Internal("connection reset".into()));
        }
        self.updates
            .lock()
            .unwrap()
            .push((file_id.to_string(), thumbnail.to_string()));
        Ok(())
    }
}

/// Blob store, work dir and fakes wired into a pipeline.
pub struct Harness {
    pub blobs: TempDir,
    pub work: TempDir,
    pub storage: Arc<LocalStorage>,
    pub records: Arc<RecordingStore>,
    pub image: Arc<FakeConverter>,
    pub video: Arc<FakeConverter>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with(FakeConverter::succeeding(ConverterKind::Image), RecordingStore::default()).await
    }

    pub async fn with(image: Arc<FakeConverter>, records: RecordingStore) -> Self {
        let blobs = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let storage = Arc::new(LocalStorage::new(blobs.path()).await.unwrap());
        Self {
            blobs,
            work,
            storage,
            records: Arc::new(records),
            image,
            video: FakeConverter::succeeding(ConverterKind::Video),
        }
    }

    pub fn registry(&self) -> ConverterRegistry {
        ConverterRegistry::new()
            .with("image", self.image.clone())
            .with("video", self.video.clone())
    }

    pub fn pipeline(&self) -> ThumbnailPipeline {
        ThumbnailPipeline::new(
            self.storage.clone() as Arc<dyn Storage>,
            self.records.clone() as Arc<dyn ThumbnailRecordStore>,
            self.registry(),
            ExtensionTable::standard(),
            self.work.path(),
        )
    }

    /// Store an original upload under its file id.
    pub fn seed(&self, id: &str, content: &[u8]) {
        std::fs::write(self.blobs.path().join(id), content).unwrap();
    }

    pub fn thumbnail_blob(&self, id: &str) -> Option<Vec<u8>> {
        std::fs::read(
            self.blobs
                .path()
                .join("assets/images")
                .join(format!("thumb_{id}.png")),
        )
        .ok()
    }

    /// Entries left in the work directory.
    pub fn leftovers(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.work.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }
}
