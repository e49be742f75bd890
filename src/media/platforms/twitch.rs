use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;

use super::{timestamped_filename, Strategy};
use crate::media::error::MediaError;
use crate::media::normalize;
use crate::media::types::{MediaResult, MediaSource};
use crate::media::ytdlp::{ensure_duration_within, select_video_format};
use crate::media::StrategyContext;

/// Twitch clips: yt-dlp resolves the CDN format URL, the file itself is
/// fetched directly with clip-player headers.
pub struct TwitchStrategy;

#[async_trait]
impl Strategy for TwitchStrategy {
    fn name(&self) -> &'static str {
        "twitch"
    }

    async fn extract(&self, cx: &StrategyContext, url: &str) -> Result<MediaResult, MediaError> {
        let info = cx.ytdlp.dump_json(url, None).await?;
        ensure_duration_within(info.duration, cx.max_duration_secs)?;

        let format = select_video_format(&info.formats, u32::MAX)
            .ok_or(MediaError::NoMediaFound)?;
        let media_url = format
            .url
            .clone()
            .ok_or(MediaError::NoMediaFound)?;
        let quality = format.height.map(|height| format!("{height}p"));
        debug!(%media_url, "downloading twitch clip");

        let response = cx
            .http
            .get(&media_url)
            .header("Accept", "*/*")
            .header("Origin", "https://www.twitch.tv")
            .header("Referer", "https://www.twitch.tv/")
            .send()
            .await
            .map_err(anyhow::Error::from)?;
        if !response.status().is_success() {
            return Err(MediaError::UpstreamApi(response.status()));
        }
        let bytes = response.bytes().await.map_err(anyhow::Error::from)?;

        let path = cx
            .downloads_dir
            .join(timestamped_filename("twitch_clip", "mp4"));
        tokio::fs::write(&path, &bytes)
            .await
            .context("failed to write twitch clip")?;

        Ok(normalize::twitch_clip(
            &info,
            MediaSource::Local(path),
            quality,
        ))
    }
}
