use anyhow::Context;
use async_trait::async_trait;

use super::{ensure_file_exists, timestamped_filename, Strategy};
use crate::media::error::MediaError;
use crate::media::mux::merge_tracks;
use crate::media::normalize;
use crate::media::types::{MediaResult, MediaSource, Platform};
use crate::media::ytdlp::{ensure_duration_within, select_video_format};
use crate::media::StrategyContext;

const MAX_HEIGHT: u32 = 1080;

/// YouTube serves its best streams as separate video and audio tracks, so
/// both are downloaded concurrently into temp files and muxed with ffmpeg.
pub struct YouTubeStrategy;

#[async_trait]
impl Strategy for YouTubeStrategy {
    fn name(&self) -> &'static str {
        "youtube"
    }

    async fn extract(&self, cx: &StrategyContext, url: &str) -> Result<MediaResult, MediaError> {
        let info = cx.ytdlp.dump_json(url, None).await?;
        ensure_duration_within(info.duration, cx.max_duration_secs)?;

        let quality = select_video_format(&info.formats, MAX_HEIGHT)
            .and_then(|format| format.height)
            .map(|height| format!("{height}p"));

        // Temp files live next to the final output so the mux never crosses
        // filesystems; they are removed on drop whichever way this exits.
        let video_file = tempfile::Builder::new()
            .prefix("yt_video_")
            .suffix(".mp4")
            .tempfile_in(&cx.downloads_dir)
            .context("failed to create temp file")?;
        let audio_file = tempfile::Builder::new()
            .prefix("yt_audio_")
            .suffix(".m4a")
            .tempfile_in(&cx.downloads_dir)
            .context("failed to create temp file")?;

        let video_format = format!("bestvideo[ext=mp4][height<={MAX_HEIGHT}]");
        tokio::try_join!(
            cx.ytdlp
                .download(url, video_file.path(), &video_format, None),
            cx.ytdlp
                .download(url, audio_file.path(), "bestaudio[ext=m4a]/bestaudio", None),
        )?;

        let output = cx
            .downloads_dir
            .join(timestamped_filename("youtube", "mp4"));
        if let Err(mux_error) =
            merge_tracks(video_file.path(), audio_file.path(), &output, &cx.ffmpeg_bin).await
        {
            // A failed mux can leave a partial output behind.
            let _ = tokio::fs::remove_file(&output).await;
            return Err(mux_error.into());
        }
        ensure_file_exists(&output).await?;

        let mut result =
            normalize::video_from_info(Platform::YouTube, &info, MediaSource::Local(output));
        result.quality = quality.or(result.quality);
        Ok(result)
    }
}
