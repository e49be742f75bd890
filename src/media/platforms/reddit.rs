use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{ensure_file_exists, timestamped_filename, Strategy};
use crate::media::error::MediaError;
use crate::media::fallback::FallbackChain;
use crate::media::normalize;
use crate::media::types::{MediaResult, MediaSource, Platform};
use crate::media::ytdlp::ensure_duration_within;
use crate::media::StrategyContext;

/// Three attempts: yt-dlp for video posts, the gallery-dl archiver for
/// everything it can grab, and finally Reddit's public `.json` listing API
/// for plain image posts.
pub struct RedditStrategy;

/// Post id: the segment after `/comments/`.
pub(crate) fn post_id(url: &str) -> Result<String> {
    url.split("/comments/")
        .nth(1)
        .and_then(|rest| rest.split('/').next())
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .context("could not extract post id from url")
}

async fn ytdlp_video(cx: &StrategyContext, url: &str) -> Result<MediaResult, MediaError> {
    let info = cx.ytdlp.dump_json(url, None).await?;
    ensure_duration_within(info.duration, cx.max_duration_secs)?;

    let path = cx.downloads_dir.join(timestamped_filename("reddit", "mp4"));
    cx.ytdlp.download(url, &path, "best", None).await?;
    ensure_file_exists(&path).await?;

    Ok(normalize::video_from_info(
        Platform::Reddit,
        &info,
        MediaSource::Local(path),
    ))
}

async fn archived(cx: &StrategyContext, url: &str, id: &str) -> Result<MediaResult, MediaError> {
    let download = cx
        .gallery_dl
        .archive(url, &cx.downloads_dir, "reddit_{id}.{extension}", id)
        .await?;
    Ok(normalize::reddit_archived(&download))
}

async fn api_image(cx: &StrategyContext, url: &str) -> Result<MediaResult, MediaError> {
    let api_url = format!("{}.json", url.trim_end_matches('/'));
    debug!(%api_url, "querying reddit listing api");

    let response = cx
        .http
        .get(&api_url)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(anyhow::Error::from)?;
    if !response.status().is_success() {
        return Err(MediaError::UpstreamApi(response.status()));
    }

    let listing: Value = response.json().await.map_err(anyhow::Error::from)?;
    let post = listing
        .pointer("/0/data/children/0/data")
        .context("could not fetch post data")
        .map_err(MediaError::Attempt)?;

    normalize::reddit_api_post(post)
}

#[async_trait]
impl Strategy for RedditStrategy {
    fn name(&self) -> &'static str {
        "reddit"
    }

    async fn extract(&self, cx: &StrategyContext, url: &str) -> Result<MediaResult, MediaError> {
        let id = post_id(url)?;

        FallbackChain::new("reddit")
            .attempt("yt-dlp", ytdlp_video(cx, url))
            .attempt("gallery-dl", archived(cx, url, &id))
            .attempt("listing-api", api_image(cx, url))
            .run()
            .await
    }
}
