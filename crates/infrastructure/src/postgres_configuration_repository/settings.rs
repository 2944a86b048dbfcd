use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use scholaris_application::SiteSettingsRepository;
use scholaris_core::{AppError, AppResult, JournalId};
use scholaris_domain::{SettingScope, SiteSetting};

use super::PostgresConfigurationRepository;

#[derive(Debug, FromRow)]
struct SiteSettingRow {
    journal_id: Option<uuid::Uuid>,
    key: String,
    value: serde_json::Value,
    updated_at: DateTime<Utc>,
}

impl From<SiteSettingRow> for SiteSetting {
    fn from(row: SiteSettingRow) -> Self {
        Self {
            scope: SettingScope::from_journal(row.journal_id.map(JournalId::from_uuid)),
            key: row.key,
            value: row.value,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl SiteSettingsRepository for PostgresConfigurationRepository {
    async fn list_site_settings(&self, scope: SettingScope) -> AppResult<Vec<SiteSetting>> {
        let rows = sqlx::query_as::<_, SiteSettingRow>(
            r#"
            SELECT journal_id, key, value, updated_at
            FROM site_settings
            WHERE journal_id IS NOT DISTINCT FROM $1
            ORDER BY key
            "#,
        )
        .bind(scope.journal_id().map(|journal_id| journal_id.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list site settings: {error}")))?;

        Ok(rows.into_iter().map(SiteSetting::from).collect())
    }

    async fn upsert_site_setting(&self, setting: &SiteSetting) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO site_settings (journal_id, key, value, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT ON CONSTRAINT site_settings_scope_key
            DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(setting.scope.journal_id().map(|journal_id| journal_id.as_uuid()))
        .bind(setting.key.as_str())
        .bind(&setting.value)
        .bind(setting.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to save site setting: {error}")))?;

        Ok(())
    }
}
