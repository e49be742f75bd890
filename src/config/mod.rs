use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub downloads: DownloadsConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Requests must carry this token when set; unset disables auth.
    pub auth_token: Option<String>,
    /// Base URL prefixed to served file paths. Falls back to the bind
    /// address when unset.
    pub public_base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:7700".to_string(),
            auth_token: None,
            public_base_url: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DownloadsConfig {
    pub dir: String,
    pub max_duration_secs: u64,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub cleanup_interval_secs: u64,
    pub max_file_age_secs: u64,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            dir: "downloads".to_string(),
            max_duration_secs: 300,
            cache_ttl_secs: 3600,
            cache_capacity: 64,
            cleanup_interval_secs: 1800,
            max_file_age_secs: 43200,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ToolsConfig {
    pub ytdlp: String,
    pub gallery_dl: String,
    pub ffmpeg: String,
    /// Netscape cookie jar for authenticated Instagram fallback attempts.
    pub instagram_cookies: Option<PathBuf>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp: "yt-dlp".to_string(),
            gallery_dl: "gallery-dl".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            instagram_cookies: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn get_logging_format(&self) -> &str {
        &self.logging.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_gets_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:7700");
        assert!(config.server.auth_token.is_none());
        assert_eq!(config.downloads.max_duration_secs, 300);
        assert_eq!(config.downloads.cache_ttl_secs, 3600);
        assert_eq!(config.tools.ytdlp, "yt-dlp");
        assert_eq!(config.get_logging_format(), "json");
    }

    #[test]
    fn test_partial_config_overrides_only_named_fields() {
        let config: Config = toml::from_str(
            r#"
            [server]
            bind_addr = "127.0.0.1:8080"
            auth_token = "secret"

            [downloads]
            max_duration_secs = 600

            [logging]
            format = "text"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.server.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.downloads.max_duration_secs, 600);
        assert_eq!(config.downloads.dir, "downloads");
        assert_eq!(config.get_logging_format(), "text");
    }
}
