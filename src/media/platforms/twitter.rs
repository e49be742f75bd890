use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{ensure_file_exists, timestamped_filename, Strategy};
use crate::media::error::MediaError;
use crate::media::fallback::FallbackChain;
use crate::media::normalize;
use crate::media::types::{MediaResult, MediaSource, Platform};
use crate::media::ytdlp::ensure_duration_within;
use crate::media::StrategyContext;

/// Video tweets go through yt-dlp; image tweets make it reject, so the
/// gallery-dl archiver is the second attempt.
pub struct TwitterStrategy;

/// Tweet id: the last path segment, query stripped.
pub(crate) fn tweet_id(url: &str) -> Result<String> {
    url.split('/')
        .next_back()
        .and_then(|segment| segment.split('?').next())
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .context("could not extract tweet id from url")
}

async fn ytdlp_video(cx: &StrategyContext, url: &str) -> Result<MediaResult, MediaError> {
    let info = cx.ytdlp.dump_json(url, None).await?;
    ensure_duration_within(info.duration, cx.max_duration_secs)?;

    let path = cx
        .downloads_dir
        .join(timestamped_filename("twitter", "mp4"));
    cx.ytdlp.download(url, &path, "best", None).await?;
    ensure_file_exists(&path).await?;

    Ok(normalize::video_from_info(
        Platform::Twitter,
        &info,
        MediaSource::Local(path),
    ))
}

async fn archived(cx: &StrategyContext, url: &str, id: &str) -> Result<MediaResult, MediaError> {
    let download = cx
        .gallery_dl
        .archive(url, &cx.downloads_dir, "twitter_{tweet_id}.{extension}", id)
        .await?;
    Ok(normalize::twitter_archived(&download))
}

#[async_trait]
impl Strategy for TwitterStrategy {
    fn name(&self) -> &'static str {
        "twitter"
    }

    async fn extract(&self, cx: &StrategyContext, url: &str) -> Result<MediaResult, MediaError> {
        let id = tweet_id(url)?;

        FallbackChain::new("twitter")
            .attempt("yt-dlp", ytdlp_video(cx, url))
            .attempt("gallery-dl", archived(cx, url, &id))
            .run()
            .await
    }
}
