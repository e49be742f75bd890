//! Pure payload-to-`MediaResult` transforms, one per upstream shape.
//!
//! Field presence is optional-safe: a missing upstream field stays absent
//! instead of decaying to zero or an empty string. Declared-zero counters
//! pass through as 0. Unix timestamps become ISO-8601; preformatted date
//! strings pass through unchanged.

use std::path::PathBuf;

use chrono::DateTime;
use serde_json::Value;

use super::error::MediaError;
use super::gallery_dl::ArchivedDownload;
use super::types::{MediaResult, MediaSource, MediaStats, MediaType, Platform};
use super::ytdlp::VideoInfo;

pub fn unix_to_iso(timestamp: i64) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|datetime| datetime.to_rfc3339())
}

pub fn unix_to_iso_date(timestamp: i64) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|datetime| datetime.format("%Y-%m-%d").to_string())
}

fn str_at(value: &Value, pointer: &str) -> Option<String> {
    value.pointer(pointer)?.as_str().map(ToString::to_string)
}

fn u64_at(value: &Value, pointer: &str) -> Option<u64> {
    value.pointer(pointer)?.as_u64()
}

/// Shared yt-dlp shape: the fields nearly every platform exposes the same
/// way. Platform-specific normalizers refine stats/extra on top of this.
fn ytdlp_common(
    platform: Platform,
    media_type: MediaType,
    source: MediaSource,
    info: &VideoInfo,
) -> MediaResult {
    let mut result = MediaResult::new(platform, media_type, source);
    result.title = info.title.clone();
    result.uploader = info.uploader.clone().or_else(|| info.channel.clone());
    result.thumbnail = info.thumbnail.clone();
    result.duration_secs = info.duration;
    result.description = info.description.clone();
    // yt-dlp's upload_date is already a formatted string; passed through.
    result.upload_date = info.upload_date.clone();
    result.quality = info.format_note.clone();
    result
}

/// Full-stats video shape shared by YouTube, Instagram, Facebook and the
/// Generic strategy.
pub fn video_from_info(platform: Platform, info: &VideoInfo, source: MediaSource) -> MediaResult {
    let mut result = ytdlp_common(platform, MediaType::Video, source, info);
    result.stats = MediaStats {
        likes: info.like_count,
        views: info.view_count,
        comments: info.comment_count,
        shares: info.repost_count,
        ..Default::default()
    };
    if let Some(uploader_url) = &info.uploader_url {
        result
            .extra
            .insert("creatorUrl".to_string(), Value::from(uploader_url.clone()));
    }
    result
}

pub fn twitch_clip(info: &VideoInfo, source: MediaSource, quality: Option<String>) -> MediaResult {
    let mut result = ytdlp_common(Platform::Twitch, MediaType::Video, source, info);
    result.stats.views = info.view_count;
    result.quality = quality.or(result.quality);
    if let Some(channel) = &info.channel {
        result
            .extra
            .insert("channel".to_string(), Value::from(channel.clone()));
    }
    result
        .extra
        .insert("game".to_string(), Value::from(info.game.clone().unwrap_or_else(|| "Unknown Game".to_string())));
    result
}

pub fn soundcloud_track(
    info: &VideoInfo,
    source: MediaSource,
    quality: Option<String>,
) -> MediaResult {
    let mut result = ytdlp_common(Platform::SoundCloud, MediaType::Audio, source, info);
    // SoundCloud reports plays through view_count.
    result.stats = MediaStats {
        likes: info.like_count,
        views: info.view_count,
        reposts: info.repost_count,
        comments: info.comment_count,
        ..Default::default()
    };
    result.quality = quality.or(result.quality);
    if let Some(genre) = &info.genre {
        result
            .extra
            .insert("genre".to_string(), Value::from(genre.clone()));
    }
    result
}

pub fn medal_clip(info: &VideoInfo, source: MediaSource) -> MediaResult {
    let mut result = ytdlp_common(Platform::Medal, MediaType::Video, source, info);
    result.stats.views = info.view_count;
    result.stats.likes = info.like_count;
    if let Some(game) = &info.game {
        result
            .extra
            .insert("game".to_string(), Value::from(game.clone()));
    }
    result
}

pub fn streamable_video(info: &VideoInfo, source: MediaSource) -> MediaResult {
    let mut result = ytdlp_common(Platform::Streamable, MediaType::Video, source, info);
    result.stats.views = info.view_count;
    result
}

pub fn vimeo_video(info: &VideoInfo, source: MediaSource) -> MediaResult {
    let mut result = ytdlp_common(Platform::Vimeo, MediaType::Video, source, info);
    result.stats.views = info.view_count;
    result.stats.likes = info.like_count;
    if !info.tags.is_empty() {
        result
            .extra
            .insert("tags".to_string(), Value::from(info.tags.clone()));
    }
    if let Some(category) = info.categories.first() {
        result
            .extra
            .insert("category".to_string(), Value::from(category.clone()));
    }
    result
}

pub fn kick_clip(info: &VideoInfo, source: MediaSource) -> MediaResult {
    let mut result = ytdlp_common(Platform::Kick, MediaType::Video, source, info);
    result.stats.views = info.view_count;
    result
}

/// TikTok photo post: the raw `itemStruct` from the page's rehydration JSON.
/// Takes the LAST entry of each image's `urlList`, the highest-quality
/// representative by TikTok's convention.
pub fn tiktok_image_urls(item: &Value) -> Result<Vec<String>, MediaError> {
    let images = item
        .pointer("/imagePost/images")
        .and_then(Value::as_array)
        .ok_or(MediaError::NoMediaFound)?;

    let urls: Vec<String> = images
        .iter()
        .filter_map(|image| {
            image
                .pointer("/imageURL/urlList")
                .and_then(Value::as_array)
                .and_then(|list| list.last())
                .and_then(Value::as_str)
                .map(ToString::to_string)
        })
        .collect();

    if urls.is_empty() {
        return Err(MediaError::NoMediaFound);
    }
    Ok(urls)
}

pub fn tiktok_photo_post(item: &Value, files: Vec<PathBuf>) -> MediaResult {
    let mut result = MediaResult::new(
        Platform::TikTokPhoto,
        MediaType::ImageSet,
        MediaSource::LocalSet(files),
    );
    result.title = str_at(item, "/desc").filter(|desc| !desc.is_empty());
    result.uploader = str_at(item, "/author/nickname");
    result.uploader_handle = str_at(item, "/author/uniqueId");
    result.stats = MediaStats {
        likes: u64_at(item, "/stats/diggCount"),
        views: u64_at(item, "/stats/playCount"),
        comments: u64_at(item, "/stats/commentCount"),
        shares: u64_at(item, "/stats/shareCount"),
        ..Default::default()
    };
    result.upload_date = item
        .pointer("/createTime")
        .and_then(Value::as_i64)
        .and_then(unix_to_iso);
    if let Some(handle) = &result.uploader_handle {
        result.extra.insert(
            "creatorUrl".to_string(),
            Value::from(format!("https://www.tiktok.com/@{handle}")),
        );
    }
    result
}

/// Picks the image URL out of a Reddit listing post, in the original's
/// precedence order: direct i.redd.it link, preview source (HTML-unescaped),
/// first gallery item.
pub fn reddit_image_url(post: &Value) -> Result<String, MediaError> {
    let direct = str_at(post, "/url").unwrap_or_default();
    let domain = str_at(post, "/domain").unwrap_or_default();

    let mut image_url = direct.clone();
    if domain != "i.redd.it" && !direct.contains("i.redd.it") {
        if let Some(preview) = str_at(post, "/preview/images/0/source/url") {
            image_url = preview.replace("&amp;", "&");
        } else if let Some(first_id) = str_at(post, "/gallery_data/items/0/media_id") {
            if let Some(gallery_url) = str_at(post, &format!("/media_metadata/{first_id}/s/u")) {
                image_url = gallery_url.replace("&amp;", "&");
            }
        }
    }

    // Preview and gallery URLs carry query params; the extension check runs
    // on the path alone.
    let path = image_url.split('?').next().unwrap_or_default();
    let acceptable = [".jpg", ".jpeg", ".png"]
        .iter()
        .any(|suffix| path.ends_with(suffix));
    if image_url.is_empty() || !acceptable {
        return Err(MediaError::NoMediaFound);
    }
    Ok(image_url)
}

/// Image post fetched through Reddit's `.json`-suffixed listing API.
pub fn reddit_api_post(post: &Value) -> Result<MediaResult, MediaError> {
    if post.pointer("/is_video").and_then(Value::as_bool) != Some(false) {
        return Err(MediaError::NoMediaFound);
    }

    let image_url = reddit_image_url(post)?;

    let mut result = MediaResult::new(
        Platform::Reddit,
        MediaType::Image,
        MediaSource::Remote(image_url),
    );
    result.title = str_at(post, "/title");
    result.uploader = str_at(post, "/author");
    result.thumbnail = str_at(post, "/thumbnail");
    result.description = str_at(post, "/selftext").filter(|text| !text.is_empty());
    result.stats = MediaStats {
        upvotes: u64_at(post, "/ups"),
        upvote_ratio: post.pointer("/upvote_ratio").and_then(Value::as_f64),
        views: u64_at(post, "/view_count"),
        ..Default::default()
    };
    result.upload_date = post
        .pointer("/created_utc")
        .and_then(Value::as_f64)
        .and_then(|seconds| unix_to_iso(seconds as i64));
    if let Some(subreddit) = str_at(post, "/subreddit") {
        result
            .extra
            .insert("subreddit".to_string(), Value::from(subreddit));
    }
    if let Some(nsfw) = post.pointer("/over_18").and_then(Value::as_bool) {
        result.extra.insert("nsfw".to_string(), Value::from(nsfw));
    }
    result.quality = Some("original".to_string());
    Ok(result)
}

/// Tweet archived by gallery-dl. Without a sidecar, only the file is known.
pub fn twitter_archived(archived: &ArchivedDownload) -> MediaResult {
    let media_type = if archived.is_image() {
        MediaType::Image
    } else {
        MediaType::Video
    };
    let mut result = MediaResult::new(
        Platform::Twitter,
        media_type,
        MediaSource::Local(archived.file.clone()),
    );

    let Some(sidecar) = &archived.sidecar else {
        return result;
    };

    result.title = str_at(sidecar, "/content");
    result.uploader = str_at(sidecar, "/author/name");
    result.uploader_handle = str_at(sidecar, "/author/username");
    result.stats = MediaStats {
        likes: u64_at(sidecar, "/favorite_count").or_else(|| u64_at(sidecar, "/like_count")),
        reposts: u64_at(sidecar, "/retweet_count"),
        comments: u64_at(sidecar, "/reply_count"),
        ..Default::default()
    };
    result.upload_date = str_at(sidecar, "/date");
    if archived.is_image() {
        result.quality = Some("original".to_string());
    }
    result
}

/// Reddit post archived by gallery-dl.
pub fn reddit_archived(archived: &ArchivedDownload) -> MediaResult {
    let media_type = if archived.is_image() {
        MediaType::Image
    } else {
        MediaType::Video
    };
    let mut result = MediaResult::new(
        Platform::Reddit,
        media_type,
        MediaSource::Local(archived.file.clone()),
    );
    result.quality = Some(if archived.is_image() { "original" } else { "unknown" }.to_string());

    let Some(sidecar) = &archived.sidecar else {
        return result;
    };

    result.title = str_at(sidecar, "/title");
    result.uploader = str_at(sidecar, "/author");
    result.thumbnail = str_at(sidecar, "/thumbnail");
    result.description = str_at(sidecar, "/selftext").filter(|text| !text.is_empty());
    result.stats = MediaStats {
        upvotes: u64_at(sidecar, "/score"),
        upvote_ratio: sidecar.pointer("/upvote_ratio").and_then(Value::as_f64),
        views: u64_at(sidecar, "/view_count"),
        ..Default::default()
    };
    result.upload_date = sidecar
        .pointer("/date")
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .or_else(|| {
            sidecar
                .pointer("/created_utc")
                .and_then(Value::as_f64)
                .and_then(|seconds| unix_to_iso_date(seconds as i64))
        });
    if let Some(subreddit) = str_at(sidecar, "/subreddit") {
        result
            .extra
            .insert("subreddit".to_string(), Value::from(subreddit));
    }
    if let Some(nsfw) = sidecar.pointer("/over_18").and_then(Value::as_bool) {
        result.extra.insert("nsfw".to_string(), Value::from(nsfw));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unix_to_iso() {
        assert_eq!(unix_to_iso(0).unwrap(), "1970-01-01T00:00:00+00:00");
        assert_eq!(unix_to_iso_date(86_400).unwrap(), "1970-01-02");
    }

    #[test]
    fn test_tiktok_image_urls_take_last_entry() {
        let item = json!({
            "imagePost": {
                "images": [
                    {"imageURL": {"urlList": ["low-1.jpg", "mid-1.jpg", "high-1.jpg"]}},
                    {"imageURL": {"urlList": ["low-2.jpg", "high-2.jpg"]}}
                ]
            }
        });

        let urls = tiktok_image_urls(&item).unwrap();
        assert_eq!(urls, vec!["high-1.jpg", "high-2.jpg"]);
    }

    #[test]
    fn test_tiktok_image_urls_without_image_post() {
        let item = json!({"desc": "a plain video"});
        assert!(matches!(
            tiktok_image_urls(&item),
            Err(MediaError::NoMediaFound)
        ));
    }

    #[test]
    fn test_tiktok_photo_post_maps_stats_and_date() {
        let item = json!({
            "desc": "cute cats",
            "createTime": 86_400,
            "author": {"nickname": "Cat Person", "uniqueId": "catperson"},
            "stats": {"diggCount": 10, "playCount": 0, "commentCount": 3}
        });

        let result = tiktok_photo_post(&item, vec![PathBuf::from("downloads/tiktok_photo_1.jpg")]);
        assert_eq!(result.media_type, MediaType::ImageSet);
        assert_eq!(result.title.as_deref(), Some("cute cats"));
        assert_eq!(result.uploader.as_deref(), Some("Cat Person"));
        assert_eq!(result.stats.likes, Some(10));
        // A declared zero is a real count, not a missing field.
        assert_eq!(result.stats.views, Some(0));
        assert_eq!(result.stats.comments, Some(3));
        assert!(result.stats.shares.is_none());
        assert_eq!(result.upload_date.as_deref(), Some("1970-01-02T00:00:00+00:00"));
        assert_eq!(
            result.extra["creatorUrl"],
            "https://www.tiktok.com/@catperson"
        );
    }

    #[test]
    fn test_reddit_image_url_prefers_direct_link() {
        let post = json!({
            "url": "https://i.redd.it/abc.jpg",
            "domain": "i.redd.it",
            "preview": {"images": [{"source": {"url": "https://preview.redd.it/x.png?a=1&amp;b=2"}}]}
        });
        assert_eq!(reddit_image_url(&post).unwrap(), "https://i.redd.it/abc.jpg");
    }

    #[test]
    fn test_reddit_image_url_unescapes_preview() {
        let post = json!({
            "url": "https://www.reddit.com/gallery/abc",
            "domain": "reddit.com",
            "preview": {"images": [{"source": {"url": "https://preview.redd.it/x.png?a=1&amp;b=2"}}]}
        });
        assert_eq!(
            reddit_image_url(&post).unwrap(),
            "https://preview.redd.it/x.png?a=1&b=2"
        );
    }

    #[test]
    fn test_reddit_image_url_falls_back_to_gallery_with_query_params() {
        let post = json!({
            "url": "https://www.reddit.com/gallery/abc",
            "domain": "reddit.com",
            "gallery_data": {"items": [{"media_id": "m1"}, {"media_id": "m2"}]},
            "media_metadata": {
                "m1": {"s": {"u": "https://preview.redd.it/m1.jpg?width=640&amp;s=sig"}}
            }
        });
        assert_eq!(
            reddit_image_url(&post).unwrap(),
            "https://preview.redd.it/m1.jpg?width=640&s=sig"
        );
    }

    #[test]
    fn test_reddit_image_url_rejects_non_image_extensions() {
        let post = json!({
            "url": "https://v.redd.it/clip",
            "domain": "v.redd.it"
        });
        assert!(reddit_image_url(&post).is_err());
    }

    #[test]
    fn test_reddit_api_post_requires_image_post() {
        let video_post = json!({"is_video": true, "url": "https://v.redd.it/x"});
        assert!(reddit_api_post(&video_post).is_err());

        let image_post = json!({
            "is_video": false,
            "url": "https://i.redd.it/abc.jpg",
            "domain": "i.redd.it",
            "title": "A picture",
            "author": "someone",
            "subreddit": "pics",
            "ups": 1234,
            "upvote_ratio": 0.98,
            "created_utc": 86_400.0,
            "over_18": false
        });
        let result = reddit_api_post(&image_post).unwrap();
        assert_eq!(result.media_type, MediaType::Image);
        assert_eq!(
            result.source,
            MediaSource::Remote("https://i.redd.it/abc.jpg".to_string())
        );
        assert_eq!(result.stats.upvotes, Some(1234));
        assert_eq!(result.stats.upvote_ratio, Some(0.98));
        assert!(result.stats.views.is_none());
        assert_eq!(result.extra["subreddit"], "pics");
        assert_eq!(result.extra["nsfw"], false);
        assert_eq!(result.upload_date.as_deref(), Some("1970-01-02T00:00:00+00:00"));
    }

    #[test]
    fn test_twitter_archived_without_sidecar_keeps_only_filename() {
        let archived = ArchivedDownload {
            file: PathBuf::from("downloads/twitter_123.jpg"),
            sidecar: None,
        };
        let result = twitter_archived(&archived);
        assert_eq!(result.media_type, MediaType::Image);
        assert!(result.title.is_none());
        assert!(result.stats.is_empty());
        assert!(result.extra.is_empty());
    }

    #[test]
    fn test_twitter_archived_with_sidecar() {
        let archived = ArchivedDownload {
            file: PathBuf::from("downloads/twitter_123.mp4"),
            sidecar: Some(json!({
                "content": "hello world",
                "author": {"name": "Some One", "username": "someone"},
                "favorite_count": 42,
                "retweet_count": 7,
                "reply_count": 0,
                "date": "2024-01-15 10:30:00"
            })),
        };
        let result = twitter_archived(&archived);
        assert_eq!(result.media_type, MediaType::Video);
        assert_eq!(result.title.as_deref(), Some("hello world"));
        assert_eq!(result.uploader_handle.as_deref(), Some("someone"));
        assert_eq!(result.stats.likes, Some(42));
        assert_eq!(result.stats.reposts, Some(7));
        assert_eq!(result.stats.comments, Some(0));
        // A preformatted date string passes through unchanged.
        assert_eq!(result.upload_date.as_deref(), Some("2024-01-15 10:30:00"));
        assert!(result.quality.is_none());
    }

    #[test]
    fn test_video_from_info_omits_missing_fields() {
        let info: VideoInfo = serde_json::from_value(json!({
            "title": "A video",
            "view_count": 0
        }))
        .unwrap();

        let result = video_from_info(
            Platform::Generic,
            &info,
            MediaSource::Remote("https://cdn/x.mp4".to_string()),
        );
        assert_eq!(result.title.as_deref(), Some("A video"));
        assert_eq!(result.stats.views, Some(0));
        assert!(result.stats.likes.is_none());
        assert!(result.uploader.is_none());
        assert!(result.upload_date.is_none());
        assert!(result.extra.is_empty());
    }

    #[test]
    fn test_soundcloud_track_maps_plays_and_genre() {
        let info: VideoInfo = serde_json::from_value(json!({
            "title": "A track",
            "uploader": "artist",
            "view_count": 5000,
            "repost_count": 12,
            "genre": "Electronic"
        }))
        .unwrap();

        let result = soundcloud_track(
            &info,
            MediaSource::Local(PathBuf::from("downloads/soundcloud_1.mp3")),
            Some("320kbps".to_string()),
        );
        assert_eq!(result.media_type, MediaType::Audio);
        assert_eq!(result.stats.views, Some(5000));
        assert_eq!(result.stats.reposts, Some(12));
        assert_eq!(result.quality.as_deref(), Some("320kbps"));
        assert_eq!(result.extra["genre"], "Electronic");
    }

    #[test]
    fn test_twitch_clip_fills_game_fallback() {
        let info: VideoInfo = serde_json::from_value(json!({
            "title": "A clip",
            "uploader": "streamer",
            "view_count": 100
        }))
        .unwrap();

        let result = twitch_clip(
            &info,
            MediaSource::Local(PathBuf::from("downloads/twitch_clip_1.mp4")),
            Some("1080p".to_string()),
        );
        assert_eq!(result.extra["game"], "Unknown Game");
        assert_eq!(result.quality.as_deref(), Some("1080p"));
        assert_eq!(result.stats.views, Some(100));
        assert!(result.stats.likes.is_none());
    }
}
