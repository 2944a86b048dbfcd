use std::sync::Arc;

use chrono::Utc;
use scholaris_core::{AppResult, Credential, FieldErrors, JournalId};
use scholaris_domain::{AuditAction, SettingScope, SiteSetting, ViewPath, validate_setting_key};
use serde::Deserialize;
use validator::Validate;

use crate::validation::{check_field, finish_fields};
use crate::{
    AccessRequirement, ActionEnvelope, ActionOutcome, AuditDraft, Completed, InputSchema,
    SiteSettingsRepository,
};

const SETTING_VALUE_MAX_BYTES: usize = 64 * 1024;

/// Request reading the settings of one scope.
#[derive(Debug, Clone, Copy, Default, Deserialize, Validate)]
pub struct GetSiteSettingsRequest {
    /// Journal scope; site-wide settings when absent.
    pub journal_id: Option<JournalId>,
}

impl InputSchema for GetSiteSettingsRequest {
    type Valid = SettingScope;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(SettingScope::from_journal(self.journal_id))
    }
}

/// Request writing one setting.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSiteSettingRequest {
    /// Journal scope; site-wide when absent.
    pub journal_id: Option<JournalId>,
    /// Dotted key such as `site.title`.
    pub key: String,
    /// JSON value.
    pub value: serde_json::Value,
}

/// Sanitized setting write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingWrite {
    scope: SettingScope,
    key: String,
    value: serde_json::Value,
}

impl InputSchema for UpdateSiteSettingRequest {
    type Valid = SettingWrite;

    fn into_valid(self) -> AppResult<Self::Valid> {
        let key = self.key.trim().to_owned();

        let mut errors = FieldErrors::default();
        check_field(&mut errors, "key", validate_setting_key(&key));
        if self.value.to_string().len() > SETTING_VALUE_MAX_BYTES {
            errors.push("value", "value must not exceed 64 KiB once serialized");
        }
        finish_fields(errors)?;

        Ok(SettingWrite {
            scope: SettingScope::from_journal(self.journal_id),
            key,
            value: self.value,
        })
    }
}

/// Site and journal key/value configuration.
#[derive(Clone)]
pub struct SiteSettingsService {
    envelope: ActionEnvelope,
    settings: Arc<dyn SiteSettingsRepository>,
}

impl SiteSettingsService {
    /// Creates the service.
    #[must_use]
    pub fn new(envelope: ActionEnvelope, settings: Arc<dyn SiteSettingsRepository>) -> Self {
        Self { envelope, settings }
    }

    /// Lists the settings of one scope, ordered by key.
    pub async fn get_site_settings(
        &self,
        credential: Option<&Credential>,
        request: GetSiteSettingsRequest,
    ) -> ActionOutcome<Vec<SiteSetting>> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |_, scope| self.get_site_settings_impl(scope),
            )
            .await
    }

    /// Creates or replaces one setting.
    pub async fn update_site_setting(
        &self,
        credential: Option<&Credential>,
        request: UpdateSiteSettingRequest,
    ) -> ActionOutcome<SiteSetting> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |_, write| self.update_site_setting_impl(write),
            )
            .await
    }

    async fn get_site_settings_impl(
        &self,
        scope: SettingScope,
    ) -> AppResult<Completed<Vec<SiteSetting>>> {
        let settings = self.settings.list_site_settings(scope).await?;
        Ok(Completed::read(settings))
    }

    async fn update_site_setting_impl(
        &self,
        write: SettingWrite,
    ) -> AppResult<Completed<SiteSetting>> {
        let setting = SiteSetting {
            scope: write.scope,
            key: write.key,
            value: write.value,
            updated_at: Utc::now(),
        };
        self.settings.upsert_site_setting(&setting).await?;

        let audit = AuditDraft::new(AuditAction::SiteSettingUpdated, "site_setting", &setting.key)
            .with_details(serde_json::json!({
                "journal_id": setting.scope.journal_id(),
                "value": setting.value,
            }));
        Ok(Completed::changed(setting, audit)
            .invalidating([ViewPath::admin_settings(), ViewPath::site_root()]))
    }
}
