//! External-tool thumbnail converters.

use async_trait::async_trait;
use seacloud_core::constants::THUMBNAIL_SIZE;
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Which family of media a converter handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConverterKind {
    Image,
    Video,
    Pdf,
}

impl fmt::Display for ConverterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConverterKind::Image => write!(f, "image"),
            ConverterKind::Video => write!(f, "video"),
            ConverterKind::Pdf => write!(f, "pdf"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stdout: String,
        stderr: String,
    },

    #[error("{program} did not finish within {timeout:?} and was killed")]
    TimedOut { program: String, timeout: Duration },
}

/// Renders a thumbnail of `input` into `output`.
///
/// Implementations hold no mutable state and may run concurrently.
#[async_trait]
pub trait ThumbnailConverter: Send + Sync {
    fn kind(&self) -> ConverterKind;

    async fn convert(&self, input: &Path, output: &Path) -> Result<(), ConversionError>;
}

/// Converter that runs one external command with a fixed argument template.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    kind: ConverterKind,
    program: String,
    timeout: Duration,
}

impl CommandConverter {
    pub fn new(kind: ConverterKind, program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            kind,
            program: program.into(),
            timeout,
        }
    }

    /// ImageMagick `convert`, centered and padded to the thumbnail frame.
    pub fn image(convert_path: impl Into<String>, timeout: Duration) -> Self {
        Self::new(ConverterKind::Image, convert_path, timeout)
    }

    /// FFmpeg, first frame scaled down and letterboxed.
    pub fn video(ffmpeg_path: impl Into<String>, timeout: Duration) -> Self {
        Self::new(ConverterKind::Video, ffmpeg_path, timeout)
    }

    /// ImageMagick `convert` on the first page only.
    pub fn pdf(convert_path: impl Into<String>, timeout: Duration) -> Self {
        Self::new(ConverterKind::Pdf, convert_path, timeout)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the program with `-version` and return the first line it prints.
    pub async fn probe(&self) -> Result<String, ConversionError> {
        let run = Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| ConversionError::TimedOut {
                program: self.program.clone(),
                timeout: self.timeout,
            })?
            .map_err(|e| ConversionError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() {
            return Err(ConversionError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stdout,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    /// Command-line arguments for converting `input` into `output`.
    pub fn args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy().to_string();
        let output = output.to_string_lossy().to_string();
        let frame = format!("{0}x{0}", THUMBNAIL_SIZE);

        match self.kind {
            ConverterKind::Image => vec![
                input,
                "-resize".to_string(),
                frame.clone(),
                "-gravity".to_string(),
                "center".to_string(),
                "-extent".to_string(),
                frame,
                output,
            ],
            ConverterKind::Pdf => vec![
                format!("{}[0]", input),
                "-resize".to_string(),
                frame.clone(),
                "-gravity".to_string(),
                "center".to_string(),
                "-extent".to_string(),
                frame,
                output,
            ],
            ConverterKind::Video => vec![
                "-i".to_string(),
                input,
                "-vf".to_string(),
                format!(
                    "scale={0}:{0}:force_original_aspect_ratio=decrease,pad={0}:{0}:(ow-iw)/2:(oh-ih)/2",
                    THUMBNAIL_SIZE
                ),
                "-vframes".to_string(),
                "1".to_string(),
                "-update".to_string(),
                "true".to_string(),
                output,
            ],
        }
    }
}

#[async_trait]
impl ThumbnailConverter for CommandConverter {
    fn kind(&self) -> ConverterKind {
        self.kind
    }

    #[tracing::instrument(skip(self), fields(converter = %self.kind, program = %self.program))]
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), ConversionError> {
        let args = self.args(input, output);
        let start = Instant::now();

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|e| ConversionError::Spawn {
            program: self.program.clone(),
            source: e,
        })?;

        // Dropping the wait future on timeout kills the child.
        let result = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Converter timed out, process killed"
                );
                return Err(ConversionError::TimedOut {
                    program: self.program.clone(),
                    timeout: self.timeout,
                });
            }
        };

        let output = result.map_err(|e| ConversionError::Spawn {
            program: self.program.clone(),
            source: e,
        })?;

        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!(
                command = %format!("{} {}", self.program, args.join(" ")),
                status = %output.status,
                stdout = %stdout,
                stderr = %stderr,
                "Converter failed"
            );
            return Err(ConversionError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stdout,
                stderr,
            });
        }

        tracing::debug!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Converter finished"
        );
        Ok(())
    }
}
