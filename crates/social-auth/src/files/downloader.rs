//! Remote file download into managed storage.
//!
//! Files are addressed by stream URIs such as `public://pictures/2024-03/a.jpg`.
//! [`HttpFileDownloader`] maps each scheme to a local root directory and
//! fetches remote files over HTTP.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

use crate::{AuthError, AuthResult};

/// A file saved into managed storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedFile {
    /// Unique file id.
    pub id: String,
    /// Stream URI of the stored file.
    pub uri: String,
    /// Base name of the stored file.
    pub filename: String,
    /// Size in bytes.
    pub filesize: u64,
    /// Content type reported by the remote server.
    pub mime: Option<String>,
    /// When the file was stored.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Downloads remote files into managed storage.
#[async_trait]
pub trait FileDownloader: Send + Sync {
    /// Ensure the directory at `uri` exists and is writable, creating it when
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::File`] if the directory cannot be created or is
    /// not writable.
    async fn prepare_directory(&self, uri: &str) -> AuthResult<()>;

    /// Fetch `url` and store it at `destination`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Download`] if the fetch fails and
    /// [`AuthError::File`] if the file cannot be written.
    async fn download(&self, url: &str, destination: &str) -> AuthResult<ManagedFile>;
}

/// Splits a stream URI into its scheme and target path.
pub fn split_uri(uri: &str) -> Option<(&str, &str)> {
    let (scheme, target) = uri.split_once("://")?;
    if scheme.is_empty() {
        return None;
    }
    Some((scheme, target.trim_start_matches('/')))
}

/// HTTP downloader writing into local directories.
pub struct HttpFileDownloader {
    http_client: reqwest::Client,
    roots: HashMap<String, PathBuf>,
    max_size: u64,
}

/// Largest remote file accepted unless configured otherwise.
pub const DEFAULT_MAX_DOWNLOAD_SIZE: u64 = 5 * 1024 * 1024;

impl HttpFileDownloader {
    /// Creates a downloader with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(timeout: Duration) -> AuthResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            roots: HashMap::new(),
            max_size: DEFAULT_MAX_DOWNLOAD_SIZE,
        })
    }

    /// Caps the size of downloaded files, in bytes.
    #[must_use]
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Maps `scheme://` URIs to files under `root`.
    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        self.roots.insert(scheme.into(), root.into());
        self
    }

    /// Resolves a stream URI to a local path.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::File`] for malformed URIs, unknown schemes and
    /// targets that try to leave the scheme root.
    pub fn local_path(&self, uri: &str) -> AuthResult<PathBuf> {
        let (scheme, target) =
            split_uri(uri).ok_or_else(|| AuthError::file(format!("Invalid file URI: {uri}")))?;

        let root = self
            .roots
            .get(scheme)
            .ok_or_else(|| AuthError::file(format!("Unknown file scheme: {scheme}")))?;

        if target.split('/').any(|segment| segment == "..") {
            return Err(AuthError::file(format!("Invalid file URI: {uri}")));
        }

        Ok(root.join(target))
    }

    async fn ensure_writable(path: &Path) -> AuthResult<()> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| AuthError::file(format!("{}: {e}", path.display())))?;

        if !metadata.is_dir() {
            return Err(AuthError::file(format!(
                "{} is not a directory",
                path.display()
            )));
        }
        if metadata.permissions().readonly() {
            return Err(AuthError::file(format!(
                "{} is not writable",
                path.display()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for HttpFileDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFileDownloader")
            .field("roots", &self.roots)
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl FileDownloader for HttpFileDownloader {
    async fn prepare_directory(&self, uri: &str) -> AuthResult<()> {
        let path = self.local_path(uri)?;

        tokio::fs::create_dir_all(&path).await.map_err(|e| {
            AuthError::file(format!("Failed to create {}: {e}", path.display()))
        })?;

        Self::ensure_writable(&path).await
    }

    async fn download(&self, url: &str, destination: &str) -> AuthResult<ManagedFile> {
        let parsed = Url::parse(url).map_err(|e| AuthError::download(url, e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AuthError::download(
                url,
                format!("unsupported scheme {}", parsed.scheme()),
            ));
        }

        let path = self.local_path(destination)?;

        tracing::debug!(url = %url, destination = %destination, "Downloading file");

        let mut response = self
            .http_client
            .get(parsed)
            .send()
            .await
            .map_err(|e| AuthError::download(url, e.to_string()))?
            .error_for_status()
            .map_err(|e| AuthError::download(url, e.to_string()))?;

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(length) = response.content_length()
            && length > self.max_size
        {
            return Err(AuthError::download(
                url,
                format!("file of {length} bytes exceeds limit of {} bytes", self.max_size),
            ));
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AuthError::download(url, e.to_string()))?
        {
            if bytes.len() as u64 + chunk.len() as u64 > self.max_size {
                return Err(AuthError::download(
                    url,
                    format!("file exceeds limit of {} bytes", self.max_size),
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| AuthError::file(format!("Failed to write {}: {e}", path.display())))?;

        let filename = destination
            .rsplit('/')
            .next()
            .unwrap_or(destination)
            .to_string();

        Ok(ManagedFile {
            id: Uuid::new_v4().to_string(),
            uri: destination.to_string(),
            filename,
            filesize: bytes.len() as u64,
            mime,
            created_at: OffsetDateTime::now_utc(),
        })
    }
}
