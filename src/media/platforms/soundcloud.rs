use async_trait::async_trait;

use super::{ensure_file_exists, timestamped_filename, Strategy};
use crate::media::error::MediaError;
use crate::media::normalize;
use crate::media::types::{MediaResult, MediaSource};
use crate::media::ytdlp::{ensure_duration_within, select_audio_format};
use crate::media::StrategyContext;

pub struct SoundCloudStrategy;

#[async_trait]
impl Strategy for SoundCloudStrategy {
    fn name(&self) -> &'static str {
        "soundcloud"
    }

    async fn extract(&self, cx: &StrategyContext, url: &str) -> Result<MediaResult, MediaError> {
        let info = cx.ytdlp.dump_json(url, None).await?;
        ensure_duration_within(info.duration, cx.max_duration_secs)?;

        // Quality label from the best mp3 variant; the actual download lets
        // yt-dlp extract and re-encode to mp3 at top quality.
        let quality = select_audio_format(&info.formats)
            .and_then(|format| format.abr)
            .map(|abr| format!("{}kbps", abr.round() as u32));

        let path = cx
            .downloads_dir
            .join(timestamped_filename("soundcloud", "mp3"));
        cx.ytdlp.download_audio(url, &path).await?;
        ensure_file_exists(&path).await?;

        Ok(normalize::soundcloud_track(
            &info,
            MediaSource::Local(path),
            quality,
        ))
    }
}
