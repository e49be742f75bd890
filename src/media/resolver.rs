use std::time::Duration;

use anyhow::Result;
use tracing::debug;

use super::error::MediaError;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.124 Safari/537.36";

/// Follows redirects so short links (vm.tiktok.com, redd.it, fb.watch, ...)
/// classify against their canonical form.
pub struct UrlResolver {
    client: reqwest::Client,
}

impl UrlResolver {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }

    /// Single GET with redirect following; returns the final responded URL.
    /// No retries.
    pub async fn resolve(&self, url: &str) -> Result<String, MediaError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "text/html,application/json")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(MediaError::Resolution)?;

        let resolved = response.url().to_string();
        debug!(original = url, %resolved, "resolved url");
        Ok(resolved)
    }
}
