use thiserror::Error;

/// Errors surfaced by the dispatch pipeline.
///
/// Attempt-level failures inside a fallback chain are swallowed and logged;
/// only chain exhaustion (`ExtractionFailed`) or a duration-cap rejection
/// reaches the caller. Classification cannot fail: `Platform::Generic` is an
/// unconditional catch-all, so no "no platform matched" variant exists.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("could not resolve url: {0}")]
    Resolution(#[source] reqwest::Error),

    #[error("media duration {actual:.0}s exceeds the {limit}s cap")]
    DurationExceeded { actual: f64, limit: u64 },

    #[error("all extraction attempts failed: {0}")]
    ExtractionFailed(String),

    #[error("no usable media found for this url")]
    NoMediaFound,

    #[error("upstream api returned status {0}")]
    UpstreamApi(reqwest::StatusCode),

    #[error(transparent)]
    Attempt(#[from] anyhow::Error),
}
