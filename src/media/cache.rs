use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use super::types::MediaResult;

/// Best-effort per-URL result cache with a fixed TTL and capacity bound.
/// Only the Instagram strategy consults it; a miss is never an error.
pub struct ResultCache {
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<String, (Instant, MediaResult)>>,
}

impl ResultCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, url: &str) -> Option<MediaResult> {
        let entries = self.entries.lock().expect("cache lock poisoned");
        let (inserted_at, result) = entries.get(url)?;
        if inserted_at.elapsed() >= self.ttl {
            return None;
        }
        debug!(url, "cache hit");
        Some(result.clone())
    }

    pub fn insert(&self, url: &str, result: MediaResult) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let ttl = self.ttl;
        entries.retain(|_, (inserted_at, _)| inserted_at.elapsed() < ttl);

        if entries.len() >= self.capacity {
            // Evict the oldest entry to stay within the bound.
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, (inserted_at, _))| *inserted_at)
                .map(|(key, _)| key.clone())
            {
                entries.remove(&oldest);
            }
        }

        entries.insert(url.to_string(), (Instant::now(), result));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::types::{MediaSource, MediaType, Platform};

    fn result(url: &str) -> MediaResult {
        MediaResult::new(
            Platform::Instagram,
            MediaType::Video,
            MediaSource::Remote(url.to_string()),
        )
    }

    #[test]
    fn test_hit_within_ttl() {
        let cache = ResultCache::new(Duration::from_secs(3600), 16);
        cache.insert("https://a", result("https://cdn/a.mp4"));

        let hit = cache.get("https://a").expect("expected a cache hit");
        assert_eq!(
            hit.source,
            MediaSource::Remote("https://cdn/a.mp4".to_string())
        );
        assert!(cache.get("https://b").is_none());
    }

    #[test]
    fn test_expired_entries_miss() {
        let cache = ResultCache::new(Duration::ZERO, 16);
        cache.insert("https://a", result("https://cdn/a.mp4"));
        assert!(cache.get("https://a").is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = ResultCache::new(Duration::from_secs(3600), 2);
        cache.insert("https://a", result("a"));
        std::thread::sleep(Duration::from_millis(5));
        cache.insert("https://b", result("b"));
        std::thread::sleep(Duration::from_millis(5));
        cache.insert("https://c", result("c"));

        assert!(cache.get("https://a").is_none());
        assert!(cache.get("https://b").is_some());
        assert!(cache.get("https://c").is_some());
    }
}
