use std::path::Path;

use serde::Serialize;
use tracing::warn;

use crate::media::types::{MediaResult, MediaSource, MediaType, Platform};

/// The response body for a successful extraction. The shape is identical for
/// every platform: a type tag, the served URL(s) and a nested metadata block.
#[derive(Debug, Serialize)]
pub struct DownloadEnvelope {
    pub success: bool,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    pub metadata: Metadata,
    #[serde(rename = "fileInfo", skip_serializing_if = "Option::is_none")]
    pub file_info: Option<FileInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub platform: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader_handle: Option<String>,
    #[serde(skip_serializing_if = "crate::media::types::MediaStats::is_empty")]
    pub stats: crate::media::types::MediaStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    pub output_path: String,
    pub format: String,
}

/// Response type tag. Image-capable platforms split the tag on the actual
/// media type of the result.
pub fn response_tag(platform: Platform, media_type: MediaType) -> &'static str {
    match (platform, media_type) {
        (Platform::TikTokPhoto, _) => "photo",
        (Platform::Twitter, MediaType::Image) => "twitter_image",
        (Platform::Twitter, _) => "twitter_video",
        (Platform::Reddit, MediaType::Image) => "reddit_image",
        (Platform::Reddit, _) => "reddit_video",
        (Platform::Twitch, _) => "twitch_clip",
        (Platform::SoundCloud, _) => "soundcloud",
        (Platform::YouTube, _) => "youtube",
        (Platform::Instagram, _) => "instagram_reel",
        (Platform::Medal, _) => "medal_clip",
        (Platform::Streamable, _) => "streamable",
        (Platform::Vimeo, _) => "vimeo",
        (Platform::Kick, _) => "kick_clip",
        (Platform::Facebook, _) => "facebook",
        (Platform::Snapchat, _) => "snapchat",
        (Platform::Generic, _) => "video",
    }
}

fn platform_name(platform: Platform) -> &'static str {
    match platform {
        Platform::TikTokPhoto => "tiktok",
        Platform::Twitter => "twitter",
        Platform::Reddit => "reddit",
        Platform::Twitch => "twitch",
        Platform::SoundCloud => "soundcloud",
        Platform::YouTube => "youtube",
        Platform::Instagram => "instagram",
        Platform::Medal => "medal",
        Platform::Streamable => "streamable",
        Platform::Vimeo => "vimeo",
        Platform::Kick => "kick",
        Platform::Facebook => "facebook",
        Platform::Snapchat => "snapchat",
        Platform::Generic => "generic",
    }
}

fn served_url(base_url: &str, path: &Path) -> String {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    format!("{}/downloads/{file_name}", base_url.trim_end_matches('/'))
}

async fn file_info(path: &Path) -> FileInfo {
    let file_size = match tokio::fs::metadata(path).await {
        Ok(metadata) => Some(metadata.len()),
        Err(error) => {
            warn!(path = %path.display(), %error, "could not stat downloaded file");
            None
        }
    };

    FileInfo {
        file_name: path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string(),
        file_size,
        output_path: path.display().to_string(),
        format: path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_string(),
    }
}

impl DownloadEnvelope {
    pub async fn from_result(result: MediaResult, base_url: &str) -> Self {
        let kind = response_tag(result.platform, result.media_type);
        let metadata = Metadata {
            platform: platform_name(result.platform),
            title: result.title,
            uploader: result.uploader,
            uploader_handle: result.uploader_handle,
            stats: result.stats,
            thumbnail: result.thumbnail,
            description: result.description,
            duration: result.duration_secs,
            upload_date: result.upload_date,
            quality: result.quality,
            extra: result.extra,
        };

        let (url, urls, file_info) = match result.source {
            MediaSource::Remote(remote) => (Some(remote), None, None),
            MediaSource::Local(path) => (
                Some(served_url(base_url, &path)),
                None,
                Some(file_info(&path).await),
            ),
            MediaSource::LocalSet(paths) => {
                let urls = paths
                    .iter()
                    .map(|path| served_url(base_url, path))
                    .collect();
                (None, Some(urls), None)
            }
        };

        Self {
            success: true,
            kind,
            url,
            urls,
            metadata,
            file_info,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::media::types::MediaStats;

    #[tokio::test]
    async fn test_remote_result_has_url_and_no_file_info() {
        let mut result = MediaResult::new(
            Platform::Reddit,
            MediaType::Image,
            MediaSource::Remote("https://i.redd.it/abc.jpg".to_string()),
        );
        result.title = Some("A picture".to_string());
        result.stats = MediaStats {
            upvotes: Some(10),
            ..Default::default()
        };
        result
            .extra
            .insert("subreddit".to_string(), "pics".into());

        let envelope = DownloadEnvelope::from_result(result, "http://localhost:7700").await;
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["type"], "reddit_image");
        assert_eq!(json["url"], "https://i.redd.it/abc.jpg");
        assert!(json.get("urls").is_none());
        assert!(json.get("fileInfo").is_none());
        assert_eq!(json["metadata"]["platform"], "reddit");
        assert_eq!(json["metadata"]["title"], "A picture");
        assert_eq!(json["metadata"]["stats"]["upvotes"], 10);
        // Platform-specific fields flatten into the metadata block.
        assert_eq!(json["metadata"]["subreddit"], "pics");
        assert!(json["metadata"].get("uploader").is_none());
    }

    #[tokio::test]
    async fn test_local_result_serves_under_downloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("youtube_123.mp4");
        std::fs::write(&path, b"video bytes").unwrap();

        let mut result =
            MediaResult::new(Platform::YouTube, MediaType::Video, MediaSource::Local(path));
        result.duration_secs = Some(42.5);

        let envelope = DownloadEnvelope::from_result(result, "http://localhost:7700/").await;
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["type"], "youtube");
        assert_eq!(json["url"], "http://localhost:7700/downloads/youtube_123.mp4");
        assert_eq!(json["metadata"]["duration"], 42.5);
        assert_eq!(json["fileInfo"]["fileName"], "youtube_123.mp4");
        assert_eq!(json["fileInfo"]["fileSize"], 11);
        assert_eq!(json["fileInfo"]["format"], "mp4");
    }

    #[tokio::test]
    async fn test_image_set_lists_every_url() {
        let result = MediaResult::new(
            Platform::TikTokPhoto,
            MediaType::ImageSet,
            MediaSource::LocalSet(vec![
                PathBuf::from("downloads/tiktok_photo_1.jpg"),
                PathBuf::from("downloads/tiktok_photo_2.jpg"),
            ]),
        );

        let envelope = DownloadEnvelope::from_result(result, "http://localhost:7700").await;
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["type"], "photo");
        assert!(json.get("url").is_none());
        assert_eq!(
            json["urls"],
            serde_json::json!([
                "http://localhost:7700/downloads/tiktok_photo_1.jpg",
                "http://localhost:7700/downloads/tiktok_photo_2.jpg"
            ])
        );
    }

    #[test]
    fn test_tag_splits_on_media_type() {
        assert_eq!(
            response_tag(Platform::Twitter, MediaType::Image),
            "twitter_image"
        );
        assert_eq!(
            response_tag(Platform::Twitter, MediaType::Video),
            "twitter_video"
        );
        assert_eq!(
            response_tag(Platform::Reddit, MediaType::Video),
            "reddit_video"
        );
        assert_eq!(response_tag(Platform::Generic, MediaType::Video), "video");
    }
}
