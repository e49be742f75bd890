use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use super::error::MediaError;

const INFO_TIMEOUT: Duration = Duration::from_secs(30);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(180);

/// Info-dump payload from `yt-dlp --dump-json`. Only the fields the
/// normalizers consume; everything else in the (huge) payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub channel: Option<String>,
    pub uploader_url: Option<String>,
    pub like_count: Option<u64>,
    pub view_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub repost_count: Option<u64>,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    pub description: Option<String>,
    pub upload_date: Option<String>,
    pub format_note: Option<String>,
    pub genre: Option<String>,
    pub game: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub formats: Vec<FormatInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormatInfo {
    pub format_id: Option<String>,
    pub ext: Option<String>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub height: Option<u32>,
    pub abr: Option<f64>,
    pub url: Option<String>,
}

impl FormatInfo {
    fn has_video(&self) -> bool {
        matches!(self.vcodec.as_deref(), Some(codec) if codec != "none")
    }

    fn has_audio(&self) -> bool {
        matches!(self.acodec.as_deref(), Some(codec) if codec != "none")
    }
}

/// Thin wrapper around the yt-dlp executable. Arguments are always passed as
/// a structured list, never interpolated into a shell string.
pub struct YtDlp {
    bin: String,
}

impl YtDlp {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    /// `yt-dlp <url> --dump-json`, parsed into `VideoInfo`. A non-zero exit
    /// is an attempt-level failure for the calling chain.
    pub async fn dump_json(&self, url: &str, cookies: Option<&Path>) -> Result<VideoInfo> {
        let mut command = Command::new(&self.bin);
        command
            .arg(url)
            .arg("--dump-json")
            .arg("--no-warnings")
            .arg("--no-playlist");
        if let Some(cookies) = cookies {
            command.arg("--cookies").arg(cookies);
        }

        let output = tokio::time::timeout(INFO_TIMEOUT, command.output())
            .await
            .context("yt-dlp metadata extraction timed out")?
            .context("failed to run yt-dlp")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp --dump-json failed: {}", last_line(&stderr));
        }

        let info: VideoInfo =
            serde_json::from_slice(&output.stdout).context("failed to parse yt-dlp json")?;
        debug!(id = ?info.id, title = ?info.title, "yt-dlp info dump");
        Ok(info)
    }

    /// `yt-dlp <url> -o <output> -f <format>`: materializes a file on disk.
    pub async fn download(
        &self,
        url: &str,
        output_path: &Path,
        format: &str,
        cookies: Option<&Path>,
    ) -> Result<()> {
        let mut command = Command::new(&self.bin);
        command
            .arg(url)
            .arg("-o")
            .arg(output_path)
            .arg("-f")
            .arg(format)
            .arg("--force-overwrites")
            .arg("--no-warnings")
            .arg("--no-playlist");
        if let Some(cookies) = cookies {
            command.arg("--cookies").arg(cookies);
        }

        self.run_download(command).await
    }

    /// Audio extraction path: best audio, re-encoded to mp3 at the highest
    /// quality, the way SoundCloud tracks are served.
    pub async fn download_audio(&self, url: &str, output_path: &Path) -> Result<()> {
        let mut command = Command::new(&self.bin);
        command
            .arg(url)
            .arg("-f")
            .arg("bestaudio")
            .arg("-x")
            .arg("--audio-format")
            .arg("mp3")
            .arg("--audio-quality")
            .arg("0")
            .arg("-o")
            .arg(output_path)
            .arg("--no-warnings")
            .arg("--no-playlist");

        self.run_download(command).await
    }

    async fn run_download(&self, mut command: Command) -> Result<()> {
        let output = tokio::time::timeout(DOWNLOAD_TIMEOUT, command.output())
            .await
            .context("yt-dlp download timed out")?
            .context("failed to run yt-dlp")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp download failed: {}", last_line(&stderr));
        }

        Ok(())
    }
}

fn last_line(stderr: &str) -> String {
    stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .next_back()
        .unwrap_or("yt-dlp produced no diagnostics")
        .to_string()
}

/// Rejects media longer than the configured ceiling before any download is
/// attempted. Media with no declared duration passes (images, some streams).
pub fn ensure_duration_within(duration: Option<f64>, limit_secs: u64) -> Result<(), MediaError> {
    match duration {
        Some(actual) if actual > limit_secs as f64 => Err(MediaError::DurationExceeded {
            actual,
            limit: limit_secs,
        }),
        _ => Ok(()),
    }
}

/// Picks the best progressive variant: mp4 container, both a video and an
/// audio track, vertical resolution capped at `max_height`, ties going to the
/// higher resolution.
pub fn select_video_format(formats: &[FormatInfo], max_height: u32) -> Option<&FormatInfo> {
    formats
        .iter()
        .filter(|format| {
            format.ext.as_deref() == Some("mp4")
                && format.has_video()
                && format.has_audio()
                && format.height.unwrap_or(0) <= max_height
        })
        .max_by_key(|format| format.height.unwrap_or(0))
}

/// Picks the mp3 variant with the highest declared bitrate.
pub fn select_audio_format(formats: &[FormatInfo]) -> Option<&FormatInfo> {
    formats
        .iter()
        .filter(|format| {
            format.ext.as_deref() == Some("mp3") || format.acodec.as_deref() == Some("mp3")
        })
        .max_by(|a, b| {
            a.abr
                .unwrap_or(0.0)
                .total_cmp(&b.abr.unwrap_or(0.0))
        })
}
