use async_trait::async_trait;
use uuid::Uuid;

use super::{ensure_file_exists, timestamped_filename, Strategy};
use crate::media::error::MediaError;
use crate::media::normalize;
use crate::media::types::{MediaResult, MediaSource, Platform};
use crate::media::ytdlp::ensure_duration_within;
use crate::media::StrategyContext;

/// Single-attempt yt-dlp pipeline shared by every platform that needs no
/// scraping, archiving or muxing of its own.
pub struct SimpleStrategy {
    platform: Platform,
    name: &'static str,
    prefix: &'static str,
    format: &'static str,
}

pub static MEDAL: SimpleStrategy = SimpleStrategy {
    platform: Platform::Medal,
    name: "medal",
    prefix: "medal_clip",
    format: "best",
};

pub static STREAMABLE: SimpleStrategy = SimpleStrategy {
    platform: Platform::Streamable,
    name: "streamable",
    prefix: "streamable",
    format: "best",
};

pub static VIMEO: SimpleStrategy = SimpleStrategy {
    platform: Platform::Vimeo,
    name: "vimeo",
    prefix: "vimeo",
    format: "bestvideo+bestaudio/best",
};

pub static KICK: SimpleStrategy = SimpleStrategy {
    platform: Platform::Kick,
    name: "kick",
    prefix: "kick_clip",
    format: "best",
};

pub static FACEBOOK: SimpleStrategy = SimpleStrategy {
    platform: Platform::Facebook,
    name: "facebook",
    prefix: "facebook",
    format: "best",
};

pub static GENERIC: SimpleStrategy = SimpleStrategy {
    platform: Platform::Generic,
    name: "generic",
    prefix: "",
    format: "best",
};

impl SimpleStrategy {
    fn filename(&self) -> String {
        if self.prefix.is_empty() {
            // Unrecognized hosts get a collision-free name with no hint of
            // their origin.
            format!("{}.mp4", Uuid::new_v4())
        } else {
            timestamped_filename(self.prefix, "mp4")
        }
    }
}

#[async_trait]
impl Strategy for SimpleStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn extract(&self, cx: &StrategyContext, url: &str) -> Result<MediaResult, MediaError> {
        let info = cx.ytdlp.dump_json(url, None).await?;
        ensure_duration_within(info.duration, cx.max_duration_secs)?;

        let path = cx.downloads_dir.join(self.filename());
        cx.ytdlp.download(url, &path, self.format, None).await?;
        ensure_file_exists(&path).await?;

        let source = MediaSource::Local(path);
        Ok(match self.platform {
            Platform::Medal => normalize::medal_clip(&info, source),
            Platform::Streamable => normalize::streamable_video(&info, source),
            Platform::Vimeo => normalize::vimeo_video(&info, source),
            Platform::Kick => normalize::kick_clip(&info, source),
            _ => normalize::video_from_info(self.platform, &info, source),
        })
    }
}
