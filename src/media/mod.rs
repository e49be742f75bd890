pub mod cache;
pub mod classify;
pub mod error;
pub mod fallback;
pub mod gallery_dl;
pub mod mux;
pub mod normalize;
pub mod platforms;
pub mod resolver;
pub mod types;
pub mod ytdlp;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::config::Config;
use cache::ResultCache;
use classify::classify;
use error::MediaError;
use gallery_dl::GalleryDl;
use platforms::strategy_for;
use resolver::UrlResolver;
use types::MediaResult;
use ytdlp::YtDlp;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.124 Safari/537.36";

/// Everything a platform strategy needs: tool wrappers, the shared HTTP
/// client, the downloads directory and the extraction limits.
pub struct StrategyContext {
    pub ytdlp: YtDlp,
    pub gallery_dl: GalleryDl,
    pub http: reqwest::Client,
    pub cache: ResultCache,
    pub downloads_dir: PathBuf,
    pub max_duration_secs: u64,
    pub instagram_cookies: Option<PathBuf>,
    pub ffmpeg_bin: String,
}

/// The full extraction pipeline: resolve redirects, classify, run the
/// platform strategy. One dispatcher is shared across all requests.
pub struct MediaDispatcher {
    resolver: UrlResolver,
    context: StrategyContext,
}

impl MediaDispatcher {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        let context = StrategyContext {
            ytdlp: YtDlp::new(&config.tools.ytdlp),
            gallery_dl: GalleryDl::new(&config.tools.gallery_dl),
            http,
            cache: ResultCache::new(
                Duration::from_secs(config.downloads.cache_ttl_secs),
                config.downloads.cache_capacity,
            ),
            downloads_dir: PathBuf::from(&config.downloads.dir),
            max_duration_secs: config.downloads.max_duration_secs,
            instagram_cookies: config.tools.instagram_cookies.clone(),
            ffmpeg_bin: config.tools.ffmpeg.clone(),
        };

        Ok(Self {
            resolver: UrlResolver::new()?,
            context,
        })
    }

    pub async fn dispatch(&self, url: &str) -> Result<MediaResult, MediaError> {
        let resolved = self.resolver.resolve(url).await?;
        let platform = classify(&resolved);
        let strategy = strategy_for(platform);
        info!(url = %resolved, ?platform, strategy = strategy.name(), "dispatching");

        strategy.extract(&self.context, &resolved).await
    }
}
