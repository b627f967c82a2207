use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

/// Key/value store with a fixed time-to-live and explicit invalidation.
#[derive(Clone)]
pub struct FeedCache {
    entries: Arc<DashMap<String, (String, Instant)>>,
    ttl: Duration,
}

impl FeedCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                let (value, inserted_at) = entry.value();
                if inserted_at.elapsed() < self.ttl {
                    debug!("Cache hit for {}", key);
                    return Some(value.clone());
                }
                true
            }
            None => false,
        };

        if expired {
            debug!("Cache entry {} expired", key);
            self.entries.remove(key);
        }
        None
    }

    /// Stores `value` and drops every entry that has outlived the TTL.
    pub fn insert(&self, key: impl Into<String>, value: String) {
        let ttl = self.ttl;
        self.entries.retain(|_, (_, inserted_at)| inserted_at.elapsed() < ttl);
        self.entries.insert(key.into(), (value, Instant::now()));
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        debug!("Clearing {} cached entries", self.entries.len());
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = FeedCache::new(Duration::from_secs(20));
        cache.insert("index:1", "page".to_string());

        tokio::time::advance(Duration::from_secs(19)).await;
        assert_eq!(cache.get("index:1").as_deref(), Some("page"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("index:1"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn insert_sweeps_expired_entries() {
        let cache = FeedCache::new(Duration::from_secs(20));
        for i in 0..100 {
            cache.insert(format!("stale:{i}"), "old".to_string());
        }

        tokio::time::advance(Duration::from_secs(21)).await;
        cache.insert("fresh", "new".to_string());

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fresh").as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn invalidate_removes_only_that_key() {
        let cache = FeedCache::new(Duration::from_secs(60));
        cache.insert("index:1", "one".to_string());
        cache.insert("index:2", "two".to_string());

        cache.invalidate("index:1");

        assert_eq!(cache.get("index:1"), None);
        assert_eq!(cache.get("index:2").as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let cache = FeedCache::new(Duration::from_secs(60));
        cache.insert("a", "1".to_string());
        cache.insert("b", "2".to_string());

        cache.clear();

        assert_eq!(cache.len(), 0);
    }
}
