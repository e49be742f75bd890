use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::info;

const MUX_TIMEOUT: Duration = Duration::from_secs(120);

/// Combines a video-only and an audio-only file into one mp4, copying the
/// video stream and re-encoding audio to AAC.
pub async fn merge_tracks(video: &Path, audio: &Path, output: &Path, ffmpeg_bin: &str) -> Result<()> {
    info!(
        video = %video.display(),
        audio = %audio.display(),
        output = %output.display(),
        "muxing tracks"
    );

    let result = tokio::time::timeout(
        MUX_TIMEOUT,
        Command::new(ffmpeg_bin)
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(video)
            .arg("-i")
            .arg(audio)
            .arg("-c:v")
            .arg("copy")
            .arg("-c:a")
            .arg("aac")
            .arg("-strict")
            .arg("experimental")
            .arg("-y")
            .arg(output)
            .output(),
    )
    .await
    .context("ffmpeg mux timed out")?
    .context("failed to spawn ffmpeg")?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        anyhow::bail!("ffmpeg failed: {}", stderr.trim());
    }

    Ok(())
}
