//! Site settings, navigation menus, email templates and plugin rows.

mod navigation;
mod plugins;
mod settings;
mod templates;

use sqlx::PgPool;

/// PostgreSQL-backed repository for configuration tables.
#[derive(Clone)]
pub struct PostgresConfigurationRepository {
    pool: PgPool,
}

impl PostgresConfigurationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
