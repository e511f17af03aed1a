//! SeaweedFS filer client.
//!
//! The filer serves blobs at `GET {filer}/{path}` and accepts multipart
//! uploads at `POST {filer}/{path}`, answering `201 Created` with the stored
//! name and size.

use crate::paths;
use crate::traits::{BlobReader, Download, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{multipart, Body, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio_util::io::ReaderStream;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    name: Option<String>,
    size: u64,
    #[serde(default)]
    error: Option<String>,
}

/// Blob storage backed by a SeaweedFS filer.
#[derive(Clone, Debug)]
pub struct FilerStorage {
    base_url: String,
    client: Client,
}

impl FilerStorage {
    /// Create a client for the filer at `base_url` (e.g. `http://filer:8888`).
    ///
    /// `timeout` bounds connecting and each read, not a whole transfer: a
    /// large blob may stream for longer as long as data keeps arriving.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> StorageResult<Self> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(StorageError::ConfigError(format!(
                "Filer URL must be http(s): {}",
                base_url
            )));
        }

        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| {
                StorageError::ConfigError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url_for(&self, path: &str) -> StorageResult<(String, String)> {
        let normalized = paths::normalize(path)?;
        let url = format!("{}/{}", self.base_url, normalized);
        Ok((normalized, url))
    }
}

#[async_trait]
impl Storage for FilerStorage {
    #[tracing::instrument(skip(self), fields(storage.backend = "filer"))]
    async fn download_stream(&self, path: &str) -> StorageResult<Download> {
        let (_, url) = self.url_for(path)?;
        let start = std::time::Instant::now();

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| StorageError::DownloadFailed(format!("GET {}: {}", url, e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(StorageError::NotFound(path.to_string())),
            status if !status.is_success() => {
                return Err(StorageError::DownloadFailed(format!(
                    "GET {} returned {}",
                    url, status
                )))
            }
            _ => {}
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        tracing::debug!(
            path = %path,
            content_type = ?content_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Filer download started"
        );

        let stream = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| StorageError::DownloadFailed(format!("Failed to read chunk: {}", e)))
        });

        Ok(Download {
            content_type,
            stream: Box::pin(stream),
        })
    }

    #[tracing::instrument(skip(self, reader), fields(storage.backend = "filer"))]
    async fn upload_stream(
        &self,
        path: &str,
        content_type: &str,
        content_length: Option<u64>,
        reader: BlobReader,
    ) -> StorageResult<u64> {
        let (normalized, url) = self.url_for(path)?;
        let start = std::time::Instant::now();

        let body = Body::wrap_stream(ReaderStream::new(reader));
        let part = match content_length {
            Some(len) => multipart::Part::stream_with_length(body, len),
            None => multipart::Part::stream(body),
        }
        .file_name(paths::file_name(&normalized).to_string())
        .mime_str(content_type)
        .map_err(|e| StorageError::UploadFailed(format!("Invalid content type: {}", e)))?;

        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("POST {}: {}", url, e)))?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::UploadFailed(format!(
                "unexpected status code {} from {}: {}",
                status, url, body
            )));
        }

        let result: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::BackendError(format!("Invalid upload response: {}", e)))?;

        if let Some(error) = result.error.filter(|e| !e.is_empty()) {
            return Err(StorageError::UploadFailed(error));
        }

        tracing::info!(
            path = %path,
            name = ?result.name,
            size_bytes = result.size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Filer upload successful"
        );

        Ok(result.size)
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let (_, url) = self.url_for(path)?;

        let response = self
            .client
            .head(&url)
            .send()
            .await
            .map_err(|e| StorageError::BackendError(format!("HEAD {}: {}", url, e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(StorageError::BackendError(format!(
                "HEAD {} returned {}",
                url, status
            ))),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Filer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn reader(data: &[u8]) -> BlobReader {
        Box::pin(std::io::Cursor::new(data.to_vec()))
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(matches!(
            FilerStorage::new("ftp://filer", Duration::from_secs(5)),
            Err(StorageError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn download_returns_body_and_content_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/0b6c1f9e")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body("png bytes")
            .create_async()
            .await;

        let storage = FilerStorage::new(server.url(), Duration::from_secs(5)).unwrap();
        let download = storage.download_stream("0b6c1f9e").await.unwrap();
        assert_eq!(download.content_type.as_deref(), Some("image/png"));

        let mut stream = download.stream;
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(body, b"png bytes");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn slow_download_outlasting_the_timeout_completes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/large-video")
            .with_status(200)
            .with_chunked_body(|w| {
                use std::io::Write;
                for _ in 0..4 {
                    std::thread::sleep(Duration::from_millis(400));
                    w.write_all(b"frame")?;
                    w.flush()?;
                }
                Ok(())
            })
            .create_async()
            .await;

        let storage = FilerStorage::new(server.url(), Duration::from_secs(1)).unwrap();
        let mut stream = storage.download_stream("large-video").await.unwrap().stream;
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(body, b"frameframeframeframe");
    }

    #[tokio::test]
    async fn download_maps_404_to_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let storage = FilerStorage::new(server.url(), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            storage.download_stream("/missing").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn upload_posts_multipart_and_returns_size() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/assets/images/thumb_f1.png")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data; boundary=.+".to_string()),
            )
            .match_body(Matcher::Regex("thumbnail bytes".to_string()))
            .with_status(201)
            .with_body(r#"{"name":"thumb_f1.png","size":15}"#)
            .create_async()
            .await;

        let storage = FilerStorage::new(server.url(), Duration::from_secs(5)).unwrap();
        let size = storage
            .upload_stream(
                "/assets/images/thumb_f1.png",
                "image/png",
                Some(15),
                reader(b"thumbnail bytes"),
            )
            .await
            .unwrap();

        assert_eq!(size, 15);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upload_requires_created_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/assets/images/thumb_f1.png")
            .with_status(500)
            .with_body("volume full")
            .create_async()
            .await;

        let storage = FilerStorage::new(server.url(), Duration::from_secs(5)).unwrap();
        let result = storage
            .upload_stream("/assets/images/thumb_f1.png", "image/png", None, reader(b"x"))
            .await;

        match result {
            Err(StorageError::UploadFailed(msg)) => assert!(msg.contains("volume full")),
            other => panic!("expected upload failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn exists_uses_head() {
        let mut server = mockito::Server::new_async().await;
        server.mock("HEAD", "/present").with_status(200).create_async().await;
        server.mock("HEAD", "/absent").with_status(404).create_async().await;

        let storage = FilerStorage::new(server.url(), Duration::from_secs(5)).unwrap();
        assert!(storage.exists("present").await.unwrap());
        assert!(!storage.exists("absent").await.unwrap());
    }
}
