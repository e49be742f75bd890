use std::future::Future;
use std::pin::Pin;

use tracing::{info, warn};

use super::error::MediaError;
use super::types::MediaResult;

type AttemptFuture<'a> = Pin<Box<dyn Future<Output = Result<MediaResult, MediaError>> + Send + 'a>>;

/// An ordered sequence of extraction attempts for one platform.
///
/// Attempts run strictly in order; the first success wins and later attempts
/// are never polled. Attempt failures are logged and swallowed, except a
/// duration-cap rejection, which aborts the chain immediately: the media will
/// not get shorter on retry. Exhausting every attempt yields a single
/// `ExtractionFailed` carrying each attempt's error.
pub struct FallbackChain<'a> {
    label: &'static str,
    attempts: Vec<(&'static str, AttemptFuture<'a>)>,
}

impl<'a> FallbackChain<'a> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            attempts: Vec::new(),
        }
    }

    pub fn attempt<F>(mut self, name: &'static str, fut: F) -> Self
    where
        F: Future<Output = Result<MediaResult, MediaError>> + Send + 'a,
    {
        self.attempts.push((name, Box::pin(fut)));
        self
    }

    pub async fn run(self) -> Result<MediaResult, MediaError> {
        let mut errors = Vec::new();

        for (name, fut) in self.attempts {
            match fut.await {
                Ok(result) => {
                    info!(strategy = self.label, attempt = name, "extraction succeeded");
                    return Ok(result);
                }
                Err(error @ MediaError::DurationExceeded { .. }) => {
                    warn!(strategy = self.label, attempt = name, %error, "aborting chain");
                    return Err(error);
                }
                Err(error) => {
                    warn!(strategy = self.label, attempt = name, %error, "attempt failed");
                    errors.push(format!("{name}: {error}"));
                }
            }
        }

        if errors.is_empty() {
            Err(MediaError::NoMediaFound)
        } else {
            Err(MediaError::ExtractionFailed(errors.join(". ")))
        }
    }
}
