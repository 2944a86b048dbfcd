//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_store;
mod in_memory_view_cache;
mod postgres_api_key_repository;
mod postgres_audit_log_repository;
mod postgres_audit_repository;
mod postgres_authorization_repository;
mod postgres_configuration_repository;
mod postgres_editorial_repository;
mod postgres_reporting_repository;
mod postgres_user_repository;
mod redis_view_cache_invalidator;

pub use in_memory_store::InMemoryStore;
pub use in_memory_view_cache::InMemoryViewCache;
pub use postgres_api_key_repository::PostgresApiKeyRepository;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_configuration_repository::PostgresConfigurationRepository;
pub use postgres_editorial_repository::PostgresEditorialRepository;
pub use postgres_reporting_repository::{PostgresReportingRepository, detect_capabilities};
pub use postgres_user_repository::PostgresUserRepository;
pub use redis_view_cache_invalidator::RedisViewCacheInvalidator;

#[cfg(test)]
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Connects to `DATABASE_URL` and migrates it; `None` skips database tests.
#[cfg(test)]
pub(crate) async fn test_pool() -> Option<sqlx::PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres tests: {error}");
    }

    Some(pool)
}
