use std::sync::OnceLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::{timestamped_filename, Strategy};
use crate::media::error::MediaError;
use crate::media::types::{MediaResult, MediaSource, MediaType, Platform};
use crate::media::StrategyContext;

/// Snapchat has no tool support at all. Spotlight pages and public stories
/// both embed direct CDN video URLs in their HTML, so this strategy scrapes
/// the page and fetches the first URL that actually serves video.
pub struct SnapchatStrategy;

fn video_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"https://[^"\s]+\.mp4[^"\s]*"#).expect("video url regex is valid")
    })
}

/// Candidate CDN URLs from a page, deduplicated in first-seen order.
pub(crate) fn extract_video_urls(html: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for capture in video_url_regex().find_iter(html) {
        let url = capture.as_str().replace("\\u002F", "/");
        if !seen.contains(&url) {
            seen.push(url);
        }
    }
    seen
}

/// Username for story URLs, either `/add/<user>` or the last path segment.
/// Usernames may contain periods; only the bare-host fallback rejects them
/// to avoid mistaking the domain for a username.
pub(crate) fn extract_username(url: &str) -> Result<String> {
    let path = url.split('?').next().unwrap_or(url);
    let segment = match path.split("/add/").nth(1) {
        Some(rest) => rest.split('/').next().filter(|name| !name.is_empty()),
        None => path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty() && !name.contains('.')),
    };
    segment
        .map(|name| name.trim_start_matches('@').to_string())
        .context("could not extract username from url")
}

/// Story pages expose no structured metadata beyond the account itself.
fn with_story_metadata(mut result: MediaResult, username: String) -> MediaResult {
    result.uploader = Some(username);
    result.quality = Some("original".to_string());
    result
}

impl SnapchatStrategy {
    async fn page_video_urls(cx: &StrategyContext, page_url: &str) -> Result<Vec<String>, MediaError> {
        debug!(%page_url, "fetching snapchat page");
        let response = cx
            .http
            .get(page_url)
            .header("Accept", "text/html")
            .send()
            .await
            .map_err(anyhow::Error::from)?;
        if !response.status().is_success() {
            return Err(MediaError::UpstreamApi(response.status()));
        }
        let html = response.text().await.map_err(anyhow::Error::from)?;
        Ok(extract_video_urls(&html))
    }

    async fn download_first_video(
        cx: &StrategyContext,
        candidates: &[String],
    ) -> Result<MediaResult, MediaError> {
        for candidate in candidates {
            let response = match cx.http.get(candidate).send().await {
                Ok(response) if response.status().is_success() => response,
                _ => continue,
            };

            let is_video = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.contains("video"))
                .unwrap_or(false);
            if !is_video {
                continue;
            }

            let bytes = response.bytes().await.map_err(anyhow::Error::from)?;
            let path = cx
                .downloads_dir
                .join(timestamped_filename("snapchat", "mp4"));
            tokio::fs::write(&path, &bytes)
                .await
                .context("failed to write snapchat video")?;

            return Ok(MediaResult::new(
                Platform::Snapchat,
                MediaType::Video,
                MediaSource::Local(path),
            ));
        }
        Err(MediaError::NoMediaFound)
    }
}

#[async_trait]
impl Strategy for SnapchatStrategy {
    fn name(&self) -> &'static str {
        "snapchat"
    }

    async fn extract(&self, cx: &StrategyContext, url: &str) -> Result<MediaResult, MediaError> {
        if url.contains("/spotlight/") {
            let candidates = Self::page_video_urls(cx, url).await?;
            Self::download_first_video(cx, &candidates).await
        } else {
            let username = extract_username(url)?;
            let story_url = format!("https://story.snapchat.com/s/{username}");
            let candidates = Self::page_video_urls(cx, &story_url).await?;
            let result = Self::download_first_video(cx, &candidates).await?;
            Ok(with_story_metadata(result, username))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_urls_dedupes_in_order() {
        let html = r#"
            <video src="https://cf-st.sc-cdn.net/d/one.mp4?mo=1"></video>
            <meta content="https://cf-st.sc-cdn.net/d/two.mp4">
            <link href="https://cf-st.sc-cdn.net/d/one.mp4?mo=1">
        "#;

        let urls = extract_video_urls(html);
        assert_eq!(
            urls,
            vec![
                "https://cf-st.sc-cdn.net/d/one.mp4?mo=1".to_string(),
                "https://cf-st.sc-cdn.net/d/two.mp4".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_video_urls_empty_page() {
        assert!(extract_video_urls("<html><body>no media</body></html>").is_empty());
    }

    #[test]
    fn test_extract_username() {
        assert_eq!(
            extract_username("https://www.snapchat.com/add/someuser?share_id=x").unwrap(),
            "someuser"
        );
        assert_eq!(
            extract_username("https://www.snapchat.com/@someuser").unwrap(),
            "someuser"
        );
        assert!(extract_username("https://www.snapchat.com/").is_err());
    }

    #[test]
    fn test_extract_username_allows_periods_in_add_path() {
        assert_eq!(
            extract_username("https://www.snapchat.com/add/jane.doe").unwrap(),
            "jane.doe"
        );
    }

    #[test]
    fn test_story_metadata_fills_uploader_and_quality() {
        let result = MediaResult::new(
            Platform::Snapchat,
            MediaType::Video,
            MediaSource::Local(std::path::PathBuf::from("downloads/snapchat_1.mp4")),
        );

        let result = with_story_metadata(result, "jane.doe".to_string());
        assert_eq!(result.uploader.as_deref(), Some("jane.doe"));
        assert_eq!(result.quality.as_deref(), Some("original"));
    }
}
