use async_trait::async_trait;
use scholaris_core::AppResult;
use scholaris_domain::ViewPath;

/// Port notifying the presentation layer that cached views are stale.
#[async_trait]
pub trait ViewCacheInvalidator: Send + Sync {
    /// Marks each path stale.
    async fn invalidate(&self, paths: &[ViewPath]) -> AppResult<()>;
}
