use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use scholaris_application::ApiKeyRepository;
use scholaris_core::{AppError, AppResult, UserId};
use scholaris_domain::{ApiKey, ApiKeyId};

/// PostgreSQL-backed repository for API keys.
#[derive(Clone)]
pub struct PostgresApiKeyRepository {
    pool: PgPool,
}

impl PostgresApiKeyRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ApiKeyRow {
    id: uuid::Uuid,
    user_id: uuid::Uuid,
    name: String,
    permissions: Json<Vec<String>>,
    display_prefix: String,
    expires_at: Option<DateTime<Utc>>,
    is_enabled: bool,
    last_used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<ApiKeyRow> for ApiKey {
    fn from(row: ApiKeyRow) -> Self {
        Self {
            api_key_id: ApiKeyId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            name: row.name,
            permissions: row.permissions.0,
            display_prefix: row.display_prefix,
            expires_at: row.expires_at,
            is_enabled: row.is_enabled,
            last_used_at: row.last_used_at,
            created_at: row.created_at,
        }
    }
}

const API_KEY_COLUMNS: &str = "id, user_id, name, permissions, display_prefix, expires_at, \
     is_enabled, last_used_at, created_at";

fn duplicate_secret_or_internal(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict("an API key with this secret already exists".to_owned());
    }

    AppError::Internal(format!("failed to store API key secret: {error}"))
}

#[async_trait]
impl ApiKeyRepository for PostgresApiKeyRepository {
    async fn list_api_keys(&self, user_id: Option<UserId>) -> AppResult<Vec<ApiKey>> {
        let rows = sqlx::query_as::<_, ApiKeyRow>(&format!(
            "SELECT {API_KEY_COLUMNS} FROM api_keys \
             WHERE $1::UUID IS NULL OR user_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(user_id.map(|user_id| user_id.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list API keys: {error}")))?;

        Ok(rows.into_iter().map(ApiKey::from).collect())
    }

    async fn find_api_key(&self, api_key_id: ApiKeyId) -> AppResult<Option<ApiKey>> {
        let row = sqlx::query_as::<_, ApiKeyRow>(&format!(
            "SELECT {API_KEY_COLUMNS} FROM api_keys WHERE id = $1"
        ))
        .bind(api_key_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find API key: {error}")))?;

        Ok(row.map(ApiKey::from))
    }

    async fn insert_api_key(&self, api_key: &ApiKey, secret_hash: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO api_keys (
                id,
                user_id,
                name,
                permissions,
                display_prefix,
                secret_hash,
                expires_at,
                is_enabled,
                last_used_at,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(api_key.api_key_id.as_uuid())
        .bind(api_key.user_id.as_uuid())
        .bind(api_key.name.as_str())
        .bind(Json(&api_key.permissions))
        .bind(api_key.display_prefix.as_str())
        .bind(secret_hash)
        .bind(api_key.expires_at)
        .bind(api_key.is_enabled)
        .bind(api_key.last_used_at)
        .bind(api_key.created_at)
        .execute(&self.pool)
        .await
        .map_err(duplicate_secret_or_internal)?;

        Ok(())
    }

    async fn rotate_api_key_secret(
        &self,
        api_key_id: ApiKeyId,
        display_prefix: &str,
        secret_hash: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE api_keys
            SET display_prefix = $2, secret_hash = $3
            WHERE id = $1
            "#,
        )
        .bind(api_key_id.as_uuid())
        .bind(display_prefix)
        .bind(secret_hash)
        .execute(&self.pool)
        .await
        .map_err(duplicate_secret_or_internal)?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_api_key_enabled(&self, api_key_id: ApiKeyId, is_enabled: bool) -> AppResult<bool> {
        let result = sqlx::query("UPDATE api_keys SET is_enabled = $2 WHERE id = $1")
            .bind(api_key_id.as_uuid())
            .bind(is_enabled)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to update API key enabled flag: {error}"))
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_api_key(&self, api_key_id: ApiKeyId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1")
            .bind(api_key_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete API key: {error}")))?;

        Ok(result.rows_affected() > 0)
    }
}
