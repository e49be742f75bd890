use std::path::PathBuf;

use serde::Serialize;

/// Platform a canonical URL was classified into. Assignment is total:
/// `Generic` always applies when nothing else matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    TikTokPhoto,
    Twitter,
    Reddit,
    Twitch,
    SoundCloud,
    YouTube,
    Instagram,
    Medal,
    Streamable,
    Vimeo,
    Kick,
    Facebook,
    Snapchat,
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Video,
    Image,
    ImageSet,
    Audio,
}

/// Where the extracted media lives: a remote URL to relay as-is, or one or
/// more files already materialized in the downloads directory.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSource {
    Remote(String),
    Local(PathBuf),
    LocalSet(Vec<PathBuf>),
}

/// Counters exposed by a platform. Each one is optional: a platform only
/// populates what its payload actually declares, and a declared zero stays 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reposts: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upvotes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upvote_ratio: Option<f64>,
}

impl MediaStats {
    pub fn is_empty(&self) -> bool {
        self.likes.is_none()
            && self.views.is_none()
            && self.comments.is_none()
            && self.shares.is_none()
            && self.reposts.is_none()
            && self.upvotes.is_none()
            && self.upvote_ratio.is_none()
    }
}

/// Canonical output of every extraction strategy, regardless of which attempt
/// in the fallback chain produced it.
#[derive(Debug, Clone)]
pub struct MediaResult {
    pub platform: Platform,
    pub media_type: MediaType,
    pub source: MediaSource,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub uploader_handle: Option<String>,
    pub stats: MediaStats,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub duration_secs: Option<f64>,
    pub upload_date: Option<String>,
    pub quality: Option<String>,
    /// Fields outside the common schema (subreddit, game, nsfw, genre, ...).
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MediaResult {
    pub fn new(platform: Platform, media_type: MediaType, source: MediaSource) -> Self {
        Self {
            platform,
            media_type,
            source,
            title: None,
            uploader: None,
            uploader_handle: None,
            stats: MediaStats::default(),
            thumbnail: None,
            description: None,
            duration_secs: None,
            upload_date: None,
            quality: None,
            extra: serde_json::Map::new(),
        }
    }
}
