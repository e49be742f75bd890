pub mod response;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::media::error::MediaError;
use crate::media::MediaDispatcher;
use response::DownloadEnvelope;

#[derive(Clone)]
struct AppState {
    dispatcher: Arc<MediaDispatcher>,
    auth_token: Option<String>,
    public_base_url: String,
}

#[derive(Debug, Deserialize)]
struct DownloadRequest {
    #[serde(default)]
    url: String,
}

pub async fn run(config: Config) -> Result<()> {
    let downloads_dir = PathBuf::from(&config.downloads.dir);
    tokio::fs::create_dir_all(&downloads_dir)
        .await
        .context("failed to create downloads directory")?;

    if config.server.auth_token.is_none() {
        warn!("no auth token configured, requests will not be authenticated");
    }

    let state = AppState {
        dispatcher: Arc::new(MediaDispatcher::new(&config)?),
        auth_token: config.server.auth_token.clone(),
        public_base_url: config
            .server
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}", config.server.bind_addr)),
    };

    tokio::spawn(cleanup_loop(
        downloads_dir.clone(),
        Duration::from_secs(config.downloads.cleanup_interval_secs),
        Duration::from_secs(config.downloads.max_file_age_secs),
    ));

    let app = Router::new()
        .route("/download", post(download))
        .nest_service("/downloads", ServeDir::new(&downloads_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    info!(addr = %config.server.bind_addr, "listening");

    axum::serve(listener, app)
        .await
        .context("server exited with an error")
}

async fn download(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<DownloadRequest>,
) -> Response {
    if let Some(expected) = &state.auth_token {
        let provided = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        if !token_matches(provided, expected) {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "provide the configured token in the Authorization header",
            );
        }
    }

    let url = request.url.trim();
    if url.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "missing url",
            "the request body must carry a non-empty \"url\" field",
        );
    }

    match state.dispatcher.dispatch(url).await {
        Ok(result) => {
            let envelope = DownloadEnvelope::from_result(result, &state.public_base_url).await;
            (StatusCode::OK, Json(envelope)).into_response()
        }
        Err(media_error) => {
            error!(url, error = %media_error, "extraction failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &media_error.to_string(),
                remediation_hint(&media_error),
            )
        }
    }
}

/// Accepts the configured token either bare or with a `Bearer ` prefix.
fn token_matches(provided: Option<&str>, expected: &str) -> bool {
    match provided {
        Some(token) => {
            token == expected || token.strip_prefix("Bearer ") == Some(expected)
        }
        None => false,
    }
}

fn remediation_hint(error: &MediaError) -> &'static str {
    match error {
        MediaError::Resolution(_) => "the url could not be reached, check that it is public",
        MediaError::DurationExceeded { .. } => "only short-form media is supported",
        MediaError::NoMediaFound => "the post may be private, deleted or contain no media",
        MediaError::UpstreamApi(_) => "the platform rejected the request, try again later",
        MediaError::ExtractionFailed(_) | MediaError::Attempt(_) => {
            "the media could not be extracted, the post may be unsupported"
        }
    }
}

fn error_response(status: StatusCode, message: &str, details: &str) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "error": message,
            "details": details,
        })),
    )
        .into_response()
}

/// Periodically deletes served files past the age limit so the downloads
/// directory does not grow without bound.
async fn cleanup_loop(downloads_dir: PathBuf, interval: Duration, max_age: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match cleanup_once(&downloads_dir, max_age).await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "cleaned up old downloads"),
            Err(cleanup_error) => warn!(error = %cleanup_error, "downloads cleanup failed"),
        }
    }
}

async fn cleanup_once(downloads_dir: &Path, max_age: Duration) -> Result<usize> {
    let mut removed = 0;
    let now = SystemTime::now();

    let mut entries = tokio::fs::read_dir(downloads_dir)
        .await
        .context("failed to read downloads directory")?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }

        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        if matches!(age, Some(age) if age > max_age) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(remove_error) => {
                    warn!(path = %path.display(), error = %remove_error, "could not remove file")
                }
            }
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_matches_bare_and_bearer() {
        assert!(token_matches(Some("secret"), "secret"));
        assert!(token_matches(Some("Bearer secret"), "secret"));
        assert!(!token_matches(Some("Bearer wrong"), "secret"));
        assert!(!token_matches(Some("bearer secret"), "secret"));
        assert!(!token_matches(None, "secret"));
    }

    #[tokio::test]
    async fn test_cleanup_keeps_fresh_files() {
        let dir = tempfile::tempdir().unwrap();
        let fresh = dir.path().join("fresh.mp4");
        std::fs::write(&fresh, b"fresh").unwrap();

        let removed = cleanup_once(dir.path(), Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(removed, 0);
        assert!(fresh.exists());
    }

    #[tokio::test]
    async fn test_cleanup_removes_expired_files() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.mp4");
        std::fs::write(&old, b"old").unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        let removed = cleanup_once(dir.path(), Duration::from_millis(1))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(!old.exists());
    }

    #[tokio::test]
    async fn test_cleanup_of_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let removed = cleanup_once(dir.path(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }
}
