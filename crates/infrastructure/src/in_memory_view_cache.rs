use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use scholaris_application::ViewCacheInvalidator;
use scholaris_core::AppResult;
use scholaris_domain::ViewPath;
use tokio::sync::RwLock;

/// In-process invalidator used when Redis is not configured.
///
/// Keeps one stale marker per path that expires like the Redis adapter's
/// `SET EX` keys, so repeated invalidations never grow the map.
pub struct InMemoryViewCache {
    stale: RwLock<HashMap<ViewPath, Instant>>,
    ttl: Duration,
}

impl InMemoryViewCache {
    /// Creates an empty marker set whose entries live `stale_ttl_seconds`.
    #[must_use]
    pub fn new(stale_ttl_seconds: u64) -> Self {
        Self {
            stale: RwLock::new(HashMap::new()),
            ttl: Duration::from_secs(stale_ttl_seconds.max(1)),
        }
    }

    /// Paths currently marked stale, sorted.
    pub async fn stale_paths(&self) -> Vec<ViewPath> {
        let now = Instant::now();
        let mut paths: Vec<ViewPath> = self
            .stale
            .read()
            .await
            .iter()
            .filter(|(_, expires_at)| **expires_at > now)
            .map(|(path, _)| path.clone())
            .collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl ViewCacheInvalidator for InMemoryViewCache {
    async fn invalidate(&self, paths: &[ViewPath]) -> AppResult<()> {
        if paths.is_empty() {
            return Ok(());
        }

        let now = Instant::now();
        let expires_at = now.checked_add(self.ttl).unwrap_or(now);

        let mut stale = self.stale.write().await;
        stale.retain(|_, marker| *marker > now);
        for path in paths {
            stale.insert(path.clone(), expires_at);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use scholaris_application::ViewCacheInvalidator;
    use scholaris_domain::ViewPath;

    use super::InMemoryViewCache;

    #[tokio::test]
    async fn repeated_invalidations_keep_one_marker_per_path() {
        let cache = InMemoryViewCache::new(300);

        for _ in 0..3 {
            let result = cache
                .invalidate(&[ViewPath::admin_journals(), ViewPath::site_root()])
                .await;
            assert!(result.is_ok());
        }

        assert_eq!(
            cache.stale_paths().await,
            vec![ViewPath::site_root(), ViewPath::admin_journals()]
        );
        assert_eq!(cache.stale.read().await.len(), 2);
    }

    #[tokio::test]
    async fn markers_expire_and_are_pruned_on_the_next_write() {
        let mut cache = InMemoryViewCache::new(1);
        cache.ttl = Duration::from_millis(20);

        assert!(cache.invalidate(&[ViewPath::admin_users()]).await.is_ok());
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(cache.stale_paths().await.is_empty());

        assert!(cache.invalidate(&[ViewPath::admin_plugins()]).await.is_ok());
        assert_eq!(cache.stale_paths().await, vec![ViewPath::admin_plugins()]);
        assert_eq!(cache.stale.read().await.len(), 1);
    }
}
