use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use super::{ensure_file_exists, timestamped_filename, Strategy};
use crate::media::error::MediaError;
use crate::media::fallback::FallbackChain;
use crate::media::normalize;
use crate::media::types::{MediaResult, MediaSource, Platform};
use crate::media::ytdlp::ensure_duration_within;
use crate::media::StrategyContext;

/// Instagram rate-limits aggressively, so successful results are cached per
/// URL and a configured cookie jar gives a second, authenticated attempt.
pub struct InstagramStrategy;

async fn ytdlp_reel(
    cx: &StrategyContext,
    url: &str,
    cookies: Option<&Path>,
) -> Result<MediaResult, MediaError> {
    let info = cx.ytdlp.dump_json(url, cookies).await?;
    ensure_duration_within(info.duration, cx.max_duration_secs)?;

    let path = cx
        .downloads_dir
        .join(timestamped_filename("instagram", "mp4"));
    cx.ytdlp.download(url, &path, "best", cookies).await?;
    ensure_file_exists(&path).await?;

    Ok(normalize::video_from_info(
        Platform::Instagram,
        &info,
        MediaSource::Local(path),
    ))
}

#[async_trait]
impl Strategy for InstagramStrategy {
    fn name(&self) -> &'static str {
        "instagram"
    }

    async fn extract(&self, cx: &StrategyContext, url: &str) -> Result<MediaResult, MediaError> {
        if let Some(cached) = cx.cache.get(url) {
            info!(url, "serving instagram result from cache");
            return Ok(cached);
        }

        let mut chain =
            FallbackChain::new("instagram").attempt("yt-dlp", ytdlp_reel(cx, url, None));
        if let Some(cookies) = cx.instagram_cookies.as_deref() {
            chain = chain.attempt("yt-dlp-cookies", ytdlp_reel(cx, url, Some(cookies)));
        }

        let result = chain.run().await?;
        cx.cache.insert(url, result.clone());
        Ok(result)
    }
}
