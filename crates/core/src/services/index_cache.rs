//! Short-lived cache for rendered index pages.
//!
//! The global index is the hottest page, so its rendered body is kept for a
//! fixed TTL keyed by the raw `page` query value. New posts show up once the
//! entry expires or the cache is cleared. At most [`MAX_ENTRIES`] bodies are
//! held; when full, expired entries go first, then the oldest.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::RwLock;
use tokio::time::Instant;
use yatube_common::AppResult;

/// Upper bound on cached bodies.
pub const MAX_ENTRIES: usize = 300;

#[derive(Debug, Clone)]
struct CacheEntry {
    body: Bytes,
    expires_at: Instant,
}

/// Rendered index page cache.
#[derive(Clone)]
pub struct IndexCache {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl IndexCache {
    /// Create a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Fresh body cached under `key`, if any.
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.body.clone())
    }

    /// Cache `body` under `key` for one TTL.
    pub async fn insert(&self, key: String, body: Bytes) {
        let entry = CacheEntry {
            body,
            expires_at: Instant::now() + self.ttl,
        };

        let mut entries = self.entries.write().await;
        if !entries.contains_key(&key) && entries.len() >= MAX_ENTRIES {
            make_room(&mut entries);
        }
        entries.insert(key, entry);
    }

    /// Return the cached body for `key`, rendering and caching it on a miss.
    ///
    /// Render errors are returned and nothing is cached.
    pub async fn get_or_render<F, Fut>(&self, key: &str, render: F) -> AppResult<Bytes>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<Bytes>>,
    {
        if let Some(body) = self.get(key).await {
            tracing::debug!(key = %key, "Index cache hit");
            return Ok(body);
        }

        let body = render().await?;
        self.insert(key.to_string(), body.clone()).await;
        Ok(body)
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        tracing::info!("Index cache cleared");
    }
}

/// Free at least one slot in a full map.
fn make_room(entries: &mut HashMap<String, CacheEntry>) {
    let now = Instant::now();
    entries.retain(|_, v| v.expires_at > now);

    if entries.len() >= MAX_ENTRIES {
        // Every entry shares one TTL, so the earliest expiry is the oldest insert
        let oldest = entries
            .iter()
            .min_by_key(|(_, v)| v.expires_at)
            .map(|(k, _)| k.clone());
        if let Some(oldest) = oldest {
            tracing::debug!(key = %oldest, "Index cache full, evicting oldest entry");
            entries.remove(&oldest);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use yatube_common::AppError;

    fn body(s: &'static str) -> Bytes {
        Bytes::from_static(s.as_bytes())
    }

    #[tokio::test]
    async fn test_get_or_render_caches_first_render() {
        let cache = IndexCache::new(Duration::from_secs(20));

        let first = cache
            .get_or_render("", || async { Ok(body("C1")) })
            .await
            .unwrap();
        let second = cache
            .get_or_render("", || async { Ok(body("C2")) })
            .await
            .unwrap();

        assert_eq!(first, body("C1"));
        assert_eq!(second, body("C1"));
    }

    #[tokio::test]
    async fn test_clear_shows_new_content() {
        let cache = IndexCache::new(Duration::from_secs(20));
        cache.insert(String::new(), body("C1")).await;

        cache.clear().await;

        let after = cache
            .get_or_render("", || async { Ok(body("C2")) })
            .await
            .unwrap();
        assert_eq!(after, body("C2"));
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache = IndexCache::new(Duration::from_secs(20));
        cache.insert("1".to_string(), body("page one")).await;

        assert!(cache.get("2").await.is_none());
        assert_eq!(cache.get("1").await.unwrap(), body("page one"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = IndexCache::new(Duration::from_secs(20));
        cache.insert(String::new(), body("C1")).await;

        tokio::time::advance(Duration::from_secs(19)).await;
        assert!(cache.get("").await.is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_stay_bounded() {
        let cache = IndexCache::new(Duration::from_secs(20));

        for i in 0..5_000 {
            cache.insert(format!("a{i}"), body("page")).await;
            tokio::time::advance(Duration::from_millis(1)).await;
        }

        let entries = cache.entries.read().await;
        assert_eq!(entries.len(), MAX_ENTRIES);
        // The newest keys survive, the oldest were evicted
        assert!(entries.contains_key("a4999"));
        assert!(!entries.contains_key("a0"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_cache_drops_expired_entries_first() {
        let cache = IndexCache::new(Duration::from_secs(20));
        for i in 0..MAX_ENTRIES {
            cache.insert(format!("old{i}"), body("stale")).await;
        }

        tokio::time::advance(Duration::from_secs(21)).await;
        cache.insert("1".to_string(), body("fresh")).await;

        let entries = cache.entries.read().await;
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("1"));
    }

    #[tokio::test]
    async fn test_overwriting_key_in_full_cache_evicts_nothing() {
        let cache = IndexCache::new(Duration::from_secs(20));
        for i in 0..MAX_ENTRIES {
            cache.insert(i.to_string(), body("page")).await;
        }

        cache.insert("0".to_string(), body("again")).await;

        assert_eq!(cache.entries.read().await.len(), MAX_ENTRIES);
        assert_eq!(cache.get("0").await.unwrap(), body("again"));
    }

    #[tokio::test]
    async fn test_render_error_is_not_cached() {
        let cache = IndexCache::new(Duration::from_secs(20));

        let result = cache
            .get_or_render("", || async { Err(AppError::Internal("boom".to_string())) })
            .await;
        assert!(result.is_err());
        assert!(cache.get("").await.is_none());
    }
}
