//! Redis-backed view cache invalidation.
//!
//! Each stale path gets a marker key that expires after the configured TTL,
//! and the batch is published on `{prefix}:invalidations` so renderers can
//! drop their copies immediately.

use async_trait::async_trait;
use redis::AsyncCommands;
use scholaris_application::ViewCacheInvalidator;
use scholaris_core::{AppError, AppResult};
use scholaris_domain::ViewPath;
use tracing::debug;

/// Redis implementation of the view cache invalidation port.
#[derive(Clone)]
pub struct RedisViewCacheInvalidator {
    client: redis::Client,
    key_prefix: String,
    stale_ttl_seconds: u64,
}

impl RedisViewCacheInvalidator {
    /// Creates an invalidator with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>, stale_ttl_seconds: u64) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
            stale_ttl_seconds: stale_ttl_seconds.max(1),
        }
    }

    fn stale_key(&self, path: &ViewPath) -> String {
        format!("{}:stale:{}", self.key_prefix, path.as_str())
    }

    fn channel(&self) -> String {
        format!("{}:invalidations", self.key_prefix)
    }
}

#[async_trait]
impl ViewCacheInvalidator for RedisViewCacheInvalidator {
    async fn invalidate(&self, paths: &[ViewPath]) -> AppResult<()> {
        if paths.is_empty() {
            return Ok(());
        }

        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))?;

        for path in paths {
            connection
                .set_ex::<_, _, ()>(self.stale_key(path), path.as_str(), self.stale_ttl_seconds)
                .await
                .map_err(|error| {
                    AppError::Internal(format!(
                        "failed to mark view '{}' stale: {error}",
                        path.as_str()
                    ))
                })?;
        }

        let payload = paths
            .iter()
            .map(ViewPath::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        let receivers = connection
            .publish::<_, _, i64>(self.channel(), payload)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to publish view invalidations: {error}"))
            })?;

        debug!(paths = paths.len(), receivers, "published view invalidations");
        Ok(())
    }
}
