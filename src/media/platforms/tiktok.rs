use std::sync::OnceLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::Strategy;
use crate::media::error::MediaError;
use crate::media::normalize;
use crate::media::types::MediaResult;
use crate::media::StrategyContext;

/// TikTok photo posts carry their data in a rehydration script tag; there is
/// no tool support, so this strategy scrapes the page JSON directly.
pub struct TikTokPhotoStrategy;

fn rehydration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?s)<script id="__UNIVERSAL_DATA_FOR_REHYDRATION__" type="application/json">(.*?)</script>"#,
        )
        .expect("rehydration regex is valid")
    })
}

/// Post id from `/@user/photo/<id>`: the third path segment.
pub(crate) fn extract_aweme_id(url: &str) -> Result<String> {
    let parsed = Url::parse(url).context("invalid tiktok url")?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.nth(2))
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .context("could not extract post id from url")
}

/// Filenames carry the post id so two photo posts never overwrite each
/// other's served files.
pub(crate) fn photo_filename(aweme_id: &str, index: usize) -> String {
    format!("tiktok_photo_{aweme_id}_{}.jpg", index + 1)
}

/// The `itemStruct` record buried in the page's rehydration JSON.
pub(crate) fn extract_item_struct(html: &str) -> Result<Value> {
    let captures = rehydration_regex()
        .captures(html)
        .context("could not find tiktok data script")?;
    let data: Value =
        serde_json::from_str(&captures[1]).context("tiktok data script is not valid json")?;
    data.pointer("/__DEFAULT_SCOPE__/webapp.video-detail/itemInfo/itemStruct")
        .cloned()
        .context("could not find post data")
}

#[async_trait]
impl Strategy for TikTokPhotoStrategy {
    fn name(&self) -> &'static str {
        "tiktok-photo"
    }

    async fn extract(&self, cx: &StrategyContext, url: &str) -> Result<MediaResult, MediaError> {
        let aweme_id = extract_aweme_id(url)?;
        let api_url = format!("https://www.tiktok.com/@i/video/{aweme_id}");
        debug!(%api_url, "fetching tiktok post page");

        let response = cx
            .http
            .get(&api_url)
            .header("Accept", "text/html,application/json")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(anyhow::Error::from)?;
        if !response.status().is_success() {
            return Err(MediaError::UpstreamApi(response.status()));
        }
        let html = response.text().await.map_err(anyhow::Error::from)?;

        let item = extract_item_struct(&html)?;
        let image_urls = normalize::tiktok_image_urls(&item)?;

        let mut files = Vec::with_capacity(image_urls.len());
        for (index, image_url) in image_urls.iter().enumerate() {
            let bytes = cx
                .http
                .get(image_url)
                .send()
                .await
                .map_err(anyhow::Error::from)?
                .bytes()
                .await
                .map_err(anyhow::Error::from)?;

            let path = cx.downloads_dir.join(photo_filename(&aweme_id, index));
            tokio::fs::write(&path, &bytes)
                .await
                .context("failed to write tiktok image")?;
            files.push(path);
        }

        Ok(normalize::tiktok_photo_post(&item, files))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_aweme_id() {
        assert_eq!(
            extract_aweme_id("https://www.tiktok.com/@someone/photo/7301234567").unwrap(),
            "7301234567"
        );
        assert!(extract_aweme_id("https://www.tiktok.com/@someone").is_err());
    }

    #[test]
    fn test_extract_item_struct_from_page() {
        let payload = json!({
            "__DEFAULT_SCOPE__": {
                "webapp.video-detail": {
                    "itemInfo": {"itemStruct": {"desc": "hi", "imagePost": {"images": []}}}
                }
            }
        });
        let html = format!(
            "<html><script id=\"__UNIVERSAL_DATA_FOR_REHYDRATION__\" \
             type=\"application/json\">{payload}</script></html>"
        );

        let item = extract_item_struct(&html).unwrap();
        assert_eq!(item["desc"], "hi");
    }

    #[test]
    fn test_photo_filenames_are_unique_per_post() {
        assert_eq!(photo_filename("7301", 0), "tiktok_photo_7301_1.jpg");
        assert_eq!(photo_filename("7301", 1), "tiktok_photo_7301_2.jpg");
        assert_ne!(photo_filename("7301", 0), photo_filename("9999", 0));
    }

    #[test]
    fn test_extract_item_struct_without_script() {
        assert!(extract_item_struct("<html><body>nothing here</body></html>").is_err());
    }
}
