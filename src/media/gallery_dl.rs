use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, warn};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(180);

const MEDIA_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "mp4"];

/// A media file written by gallery-dl plus its sidecar metadata, correlated
/// by the post/tweet identifier embedded in the filename template.
#[derive(Debug)]
pub struct ArchivedDownload {
    pub file: PathBuf,
    pub sidecar: Option<Value>,
}

impl ArchivedDownload {
    pub fn is_image(&self) -> bool {
        self.file
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| !ext.eq_ignore_ascii_case("mp4"))
            .unwrap_or(true)
    }
}

/// Thin wrapper around the gallery-dl executable, used for image/gallery
/// posts that yt-dlp rejects. Structured argument lists throughout.
pub struct GalleryDl {
    bin: String,
}

impl GalleryDl {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    /// Archives a post into `downloads_dir` using a `<prefix>_{id}.{extension}`
    /// filename template, writing a sidecar metadata JSON alongside, then
    /// correlates the downloaded file with its sidecar by `post_id`.
    pub async fn archive(
        &self,
        url: &str,
        downloads_dir: &Path,
        filename_template: &str,
        post_id: &str,
    ) -> Result<ArchivedDownload> {
        let output = tokio::time::timeout(
            DOWNLOAD_TIMEOUT,
            Command::new(&self.bin)
                .arg(url)
                .arg("-D")
                .arg(downloads_dir)
                .arg("-f")
                .arg(filename_template)
                .arg("--write-metadata")
                .output(),
        )
        .await
        .context("gallery-dl timed out")?
        .context("failed to run gallery-dl")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "gallery-dl exited with {}: {}",
                output.status,
                stderr.trim()
            );
        }

        correlate_download(downloads_dir, post_id).await
    }
}

/// Finds the downloaded media file and its sidecar for one post id. A missing
/// sidecar is not an error; the caller gets a result with filename only.
pub async fn correlate_download(downloads_dir: &Path, post_id: &str) -> Result<ArchivedDownload> {
    let mut media_file = None;
    let mut sidecar_path = None;

    let mut entries = tokio::fs::read_dir(downloads_dir)
        .await
        .context("failed to read downloads directory")?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !name.contains(post_id) {
            continue;
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if extension == "json" {
            sidecar_path = Some(path);
        } else if MEDIA_EXTENSIONS.contains(&extension.as_str()) {
            media_file = Some(path);
        }
    }

    let file = media_file
        .with_context(|| format!("no media file found for post id {post_id}"))?;
    debug!(file = %file.display(), "correlated archived download");

    let sidecar = match sidecar_path {
        Some(path) => match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|error| warn!(%error, "unreadable sidecar metadata"))
                .ok(),
            Err(error) => {
                warn!(%error, "failed to read sidecar metadata");
                None
            }
        },
        None => None,
    };

    Ok(ArchivedDownload { file, sidecar })
}
