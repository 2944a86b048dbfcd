use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use scholaris_application::PluginRepository;
use scholaris_core::{AppError, AppResult, JournalId};
use scholaris_domain::{PluginSetting, SettingScope};

use super::PostgresConfigurationRepository;

#[derive(Debug, FromRow)]
struct PluginRow {
    plugin_name: String,
    journal_id: Option<uuid::Uuid>,
    is_enabled: bool,
    settings: serde_json::Value,
    updated_at: DateTime<Utc>,
}

impl From<PluginRow> for PluginSetting {
    fn from(row: PluginRow) -> Self {
        Self {
            plugin_name: row.plugin_name,
            scope: SettingScope::from_journal(row.journal_id.map(JournalId::from_uuid)),
            is_enabled: row.is_enabled,
            settings: row.settings,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl PluginRepository for PostgresConfigurationRepository {
    async fn list_plugins(&self, scope: SettingScope) -> AppResult<Vec<PluginSetting>> {
        let rows = sqlx::query_as::<_, PluginRow>(
            r#"
            SELECT plugin_name, journal_id, is_enabled, settings, updated_at
            FROM plugin_settings
            WHERE journal_id IS NOT DISTINCT FROM $1
            ORDER BY plugin_name
            "#,
        )
        .bind(scope.journal_id().map(|journal_id| journal_id.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list plugins: {error}")))?;

        Ok(rows.into_iter().map(PluginSetting::from).collect())
    }

    async fn find_plugin(
        &self,
        plugin_name: &str,
        scope: SettingScope,
    ) -> AppResult<Option<PluginSetting>> {
        let row = sqlx::query_as::<_, PluginRow>(
            r#"
            SELECT plugin_name, journal_id, is_enabled, settings, updated_at
            FROM plugin_settings
            WHERE plugin_name = $1 AND journal_id IS NOT DISTINCT FROM $2
            "#,
        )
        .bind(plugin_name)
        .bind(scope.journal_id().map(|journal_id| journal_id.as_uuid()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find plugin: {error}")))?;

        Ok(row.map(PluginSetting::from))
    }

    async fn upsert_plugin(&self, plugin: &PluginSetting) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO plugin_settings (plugin_name, journal_id, is_enabled, settings, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT ON CONSTRAINT plugin_settings_scope_name
            DO UPDATE SET
                is_enabled = EXCLUDED.is_enabled,
                settings = EXCLUDED.settings,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(plugin.plugin_name.as_str())
        .bind(plugin.scope.journal_id().map(|journal_id| journal_id.as_uuid()))
        .bind(plugin.is_enabled)
        .bind(&plugin.settings)
        .bind(plugin.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to save plugin: {error}")))?;

        Ok(())
    }
}
