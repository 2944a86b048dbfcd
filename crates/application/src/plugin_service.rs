use std::sync::Arc;

use chrono::Utc;
use scholaris_core::{AppError, AppResult, Credential, FieldErrors, JournalId};
use scholaris_domain::{AuditAction, PluginSetting, SettingScope, ViewPath};
use serde::Deserialize;
use validator::Validate;

use crate::validation::finish_fields;
use crate::{
    AccessRequirement, ActionEnvelope, ActionOutcome, AuditDraft, Completed, InputSchema,
    PluginRepository,
};

const PLUGIN_SETTINGS_MAX_BYTES: usize = 64 * 1024;

fn check_plugin_name(errors: &mut FieldErrors, plugin_name: &str) {
    let well_formed = !plugin_name.is_empty()
        && plugin_name.len() <= 100
        && plugin_name.chars().all(|character| {
            character.is_ascii_lowercase() || character.is_ascii_digit() || character == '-'
        });
    if !well_formed {
        errors.push(
            "plugin_name",
            "plugin name must be 1 to 100 lowercase letters, digits or dashes",
        );
    }
}

/// Listing request for the plugin rows of one scope.
#[derive(Debug, Clone, Copy, Default, Deserialize, Validate)]
pub struct ListPluginsRequest {
    /// Journal scope; site-wide rows when absent.
    pub journal_id: Option<JournalId>,
}

impl InputSchema for ListPluginsRequest {
    type Valid = SettingScope;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(SettingScope::from_journal(self.journal_id))
    }
}

/// Request switching a plugin on or off.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetPluginEnabledRequest {
    /// Installed plugin name.
    pub plugin_name: String,
    /// Journal scope; site-wide when absent.
    pub journal_id: Option<JournalId>,
    /// Target state.
    pub is_enabled: bool,
}

/// Request replacing the settings object of a plugin.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePluginSettingsRequest {
    /// Installed plugin name.
    pub plugin_name: String,
    /// Journal scope; site-wide when absent.
    pub journal_id: Option<JournalId>,
    /// JSON object of plugin settings.
    pub settings: serde_json::Value,
}

/// Sanitized plugin change.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginChange<T> {
    plugin_name: String,
    scope: SettingScope,
    change: T,
}

impl InputSchema for SetPluginEnabledRequest {
    type Valid = PluginChange<bool>;

    fn into_valid(self) -> AppResult<Self::Valid> {
        let plugin_name = self.plugin_name.trim().to_owned();
        let mut errors = FieldErrors::default();
        check_plugin_name(&mut errors, &plugin_name);
        finish_fields(errors)?;

        Ok(PluginChange {
            plugin_name,
            scope: SettingScope::from_journal(self.journal_id),
            change: self.is_enabled,
        })
    }
}

impl InputSchema for UpdatePluginSettingsRequest {
    type Valid = PluginChange<serde_json::Value>;

    fn into_valid(self) -> AppResult<Self::Valid> {
        let plugin_name = self.plugin_name.trim().to_owned();
        let mut errors = FieldErrors::default();
        check_plugin_name(&mut errors, &plugin_name);
        if !self.settings.is_object() {
            errors.push("settings", "settings must be a JSON object");
        } else if self.settings.to_string().len() > PLUGIN_SETTINGS_MAX_BYTES {
            errors.push("settings", "settings must not exceed 64 KiB once serialized");
        }
        finish_fields(errors)?;

        Ok(PluginChange {
            plugin_name,
            scope: SettingScope::from_journal(self.journal_id),
            change: self.settings,
        })
    }
}

/// Plugin installation state per scope.
#[derive(Clone)]
pub struct PluginService {
    envelope: ActionEnvelope,
    plugins: Arc<dyn PluginRepository>,
}

impl PluginService {
    /// Creates the service.
    #[must_use]
    pub fn new(envelope: ActionEnvelope, plugins: Arc<dyn PluginRepository>) -> Self {
        Self { envelope, plugins }
    }

    /// Lists plugin rows of one scope ordered by name.
    pub async fn list_plugins(
        &self,
        credential: Option<&Credential>,
        request: ListPluginsRequest,
    ) -> ActionOutcome<Vec<PluginSetting>> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |_, scope| self.list_plugins_impl(scope),
            )
            .await
    }

    /// Enables or disables an installed plugin.
    pub async fn set_plugin_enabled(
        &self,
        credential: Option<&Credential>,
        request: SetPluginEnabledRequest,
    ) -> ActionOutcome<PluginSetting> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |_, change| self.set_plugin_enabled_impl(change),
            )
            .await
    }

    /// Replaces the settings object of an installed plugin.
    pub async fn update_plugin_settings(
        &self,
        credential: Option<&Credential>,
        request: UpdatePluginSettingsRequest,
    ) -> ActionOutcome<PluginSetting> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |_, change| self.update_plugin_settings_impl(change),
            )
            .await
    }

    /// Returns the row of `scope`, seeded from the site-wide row when a
    /// journal has no row of its own yet.
    async fn installed(&self, plugin_name: &str, scope: SettingScope) -> AppResult<PluginSetting> {
        if let Some(plugin) = self.plugins.find_plugin(plugin_name, scope).await? {
            return Ok(plugin);
        }

        if scope != SettingScope::Global
            && let Some(global) = self
                .plugins
                .find_plugin(plugin_name, SettingScope::Global)
                .await?
        {
            return Ok(PluginSetting { scope, ..global });
        }

        Err(AppError::NotFound(format!(
            "plugin '{plugin_name}' is not installed"
        )))
    }

    async fn list_plugins_impl(
        &self,
        scope: SettingScope,
    ) -> AppResult<Completed<Vec<PluginSetting>>> {
        let plugins = self.plugins.list_plugins(scope).await?;
        Ok(Completed::read(plugins))
    }

    async fn set_plugin_enabled_impl(
        &self,
        change: PluginChange<bool>,
    ) -> AppResult<Completed<PluginSetting>> {
        let mut plugin = self.installed(&change.plugin_name, change.scope).await?;
        if plugin.is_enabled == change.change {
            return Ok(Completed::read(plugin));
        }

        plugin.is_enabled = change.change;
        plugin.updated_at = Utc::now();
        self.plugins.upsert_plugin(&plugin).await?;

        let action = if plugin.is_enabled {
            AuditAction::PluginEnabled
        } else {
            AuditAction::PluginDisabled
        };
        let audit = AuditDraft::new(action, "plugin", &plugin.plugin_name).with_details(
            serde_json::json!({ "journal_id": plugin.scope.journal_id() }),
        );
        Ok(Completed::changed(plugin, audit).invalidating([ViewPath::admin_plugins()]))
    }

    async fn update_plugin_settings_impl(
        &self,
        change: PluginChange<serde_json::Value>,
    ) -> AppResult<Completed<PluginSetting>> {
        let mut plugin = self.installed(&change.plugin_name, change.scope).await?;
        if plugin.settings == change.change {
            return Ok(Completed::read(plugin));
        }

        plugin.settings = change.change;
        plugin.updated_at = Utc::now();
        self.plugins.upsert_plugin(&plugin).await?;

        let keys: Vec<&String> = plugin
            .settings
            .as_object()
            .map(|settings| settings.keys().collect())
            .unwrap_or_default();
        let audit = AuditDraft::new(AuditAction::PluginSettingsUpdated, "plugin", &plugin.plugin_name)
            .with_details(serde_json::json!({
                "journal_id": plugin.scope.journal_id(),
                "keys": keys,
            }));
        Ok(Completed::changed(plugin, audit).invalidating([ViewPath::admin_plugins()]))
    }
}
