use std::sync::Arc;

use scholaris_application::ViewCacheInvalidator;
use scholaris_core::AppError;
use scholaris_infrastructure::{
    InMemoryViewCache, PostgresApiKeyRepository, PostgresAuditLogRepository,
    PostgresAuditRepository, PostgresAuthorizationRepository, PostgresConfigurationRepository,
    PostgresEditorialRepository, PostgresReportingRepository, PostgresUserRepository,
    RedisViewCacheInvalidator, detect_capabilities,
};
use sqlx::PgPool;
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::{AppState, StorageAdapters};

use super::redis::build_redis_client;

pub async fn build_app_state(pool: PgPool, config: &ApiConfig) -> Result<AppState, AppError> {
    let redis_client = config
        .redis_url
        .as_deref()
        .map(build_redis_client)
        .transpose()?;

    let views: Arc<dyn ViewCacheInvalidator> = match redis_client.clone() {
        Some(client) => Arc::new(RedisViewCacheInvalidator::new(
            client,
            config.view_cache_key_prefix.clone(),
            config.view_cache_stale_ttl_seconds,
        )),
        None => {
            info!("REDIS_URL is not set; view invalidations stay in process");
            Arc::new(InMemoryViewCache::new(
                config.view_cache_stale_ttl_seconds,
            ))
        }
    };

    let capabilities = detect_capabilities(&pool).await?;

    let authorization = Arc::new(PostgresAuthorizationRepository::new(pool.clone()));
    let editorial = Arc::new(PostgresEditorialRepository::new(pool.clone()));
    let configuration = Arc::new(PostgresConfigurationRepository::new(pool.clone()));
    let reporting = Arc::new(PostgresReportingRepository::new(pool.clone()));

    let adapters = StorageAdapters {
        actors: authorization.clone(),
        roles: authorization,
        audit: Arc::new(PostgresAuditRepository::new(pool.clone())),
        audit_log: Arc::new(PostgresAuditLogRepository::new(pool.clone())),
        journals: editorial.clone(),
        issues: editorial.clone(),
        submissions: editorial.clone(),
        reviews: editorial,
        users: Arc::new(PostgresUserRepository::new(pool.clone())),
        api_keys: Arc::new(PostgresApiKeyRepository::new(pool.clone())),
        settings: configuration.clone(),
        navigation: configuration.clone(),
        templates: configuration.clone(),
        plugins: configuration,
        backups: reporting.clone(),
        dashboard: reporting,
        views,
    };

    let mut state = AppState::from_adapters(adapters, capabilities);
    state.postgres_pool = Some(pool);
    state.redis_client = redis_client;
    Ok(state)
}
