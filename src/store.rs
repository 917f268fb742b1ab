//! Filesystem side of the relay: the processed-artifact area served under
//! `/processed`, the transient upload spool, and the watched downloads
//! directory that feeds the latest-image endpoint.

use crate::error::RelayError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tokio_stream::wrappers::ReadDirStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Extensions eligible for forwarding from the downloads directory
const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    processed_dir: PathBuf,
    uploads_dir: PathBuf,
    downloads_dir: PathBuf,
}

/// A processed artifact on disk plus the URL it is served under
#[derive(Debug)]
pub struct SavedArtifact {
    pub filename: String,
    pub url: String,
}

/// One row of the downloads-directory listing
#[derive(Debug, Serialize)]
pub struct ImageEntry {
    pub name: String,
    pub modified: DateTime<Utc>,
    pub size: u64,
}

impl ArtifactStore {
    /// `public_dir` is the statically served root; artifacts land in
    /// `<public_dir>/processed`.
    pub fn new(
        public_dir: impl Into<PathBuf>,
        uploads_dir: impl Into<PathBuf>,
        downloads_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            processed_dir: public_dir.into().join("processed"),
            uploads_dir: uploads_dir.into(),
            downloads_dir: downloads_dir.into(),
        }
    }

    /// Create the working directories if missing. Called once at startup.
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.processed_dir).await?;
        fs::create_dir_all(&self.uploads_dir).await?;
        Ok(())
    }

    pub fn processed_dir(&self) -> &Path {
        &self.processed_dir
    }

    pub fn downloads_dir(&self) -> &Path {
        &self.downloads_dir
    }

    /// Persist one annotated image and return where it is served from.
    ///
    /// Artifacts are immutable once written and never cleaned up. Names only
    /// collide when two requests land in the same millisecond, in which case
    /// the later write wins; accepted limitation, not guarded against.
    pub async fn save(&self, image: &[u8]) -> Result<SavedArtifact, RelayError> {
        let filename = format!("detected_{}.png", Utc::now().timestamp_millis());
        let path = self.processed_dir.join(&filename);
        fs::write(&path, image).await?;
        debug!(%filename, bytes = image.len(), "artifact written");

        Ok(SavedArtifact {
            url: format!("/processed/{filename}"),
            filename,
        })
    }

    /// A fresh spool location for one incoming upload
    pub fn spool_path(&self) -> PathBuf {
        self.uploads_dir.join(Uuid::new_v4().to_string())
    }

    /// Best-effort removal of a spooled upload. Runs on success and failure
    /// paths alike; a failed unlink is logged and swallowed.
    pub async fn discard_upload(&self, path: &Path) {
        if let Err(e) = fs::remove_file(path).await {
            debug!(path = %path.display(), error = %e, "spooled upload not removed");
        }
    }

    /// Most-recently-modified image in the downloads directory, if any.
    ///
    /// The directory is a best-effort drop folder, not a consistent view:
    /// scan problems are logged and collapse to None.
    pub async fn latest_image(&self) -> Option<PathBuf> {
        let images = match self.scan_downloads().await {
            Ok(images) => images,
            Err(e) => {
                warn!(dir = %self.downloads_dir.display(), error = %e, "downloads scan failed");
                return None;
            }
        };

        images
            .into_iter()
            .max_by_key(|(_, modified, _)| *modified)
            .map(|(path, _, _)| path)
    }

    /// Listing for the downloads browser in the UI, newest first
    pub async fn list_images(&self) -> Result<Vec<ImageEntry>, RelayError> {
        let mut images = self.scan_downloads().await.map_err(RelayError::ScanFailed)?;
        images.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(images
            .into_iter()
            .map(|(path, modified, size)| ImageEntry {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                modified: DateTime::<Utc>::from(modified),
                size,
            })
            .collect())
    }

    async fn scan_downloads(&self) -> std::io::Result<Vec<(PathBuf, SystemTime, u64)>> {
        let read_dir = fs::read_dir(&self.downloads_dir).await?;
        let mut entries = ReadDirStream::new(read_dir);
        let mut images = Vec::new();

        while let Some(entry) = entries.next().await {
            let entry = entry?;
            let path = entry.path();
            if !has_image_extension(&path) {
                continue;
            }
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            images.push((path, meta.modified()?, meta.len()));
        }

        Ok(images)
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
