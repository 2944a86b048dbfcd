//! Configuration rows: site settings, email templates and plugin settings.

use chrono::{DateTime, Utc};
use scholaris_core::{AppError, AppResult, JournalId};
use serde::{Deserialize, Serialize};

record_identifier!(
    /// Email template identifier.
    EmailTemplateId
);

const SETTING_KEY_MAX_LENGTH: usize = 128;

/// Scope of a configuration row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SettingScope {
    /// Applies to the whole site.
    Global,
    /// Applies to one journal.
    Journal(JournalId),
}

impl SettingScope {
    /// Journal the row belongs to, if any.
    #[must_use]
    pub fn journal_id(&self) -> Option<JournalId> {
        match self {
            Self::Global => None,
            Self::Journal(journal_id) => Some(*journal_id),
        }
    }

    /// Rebuilds the scope from a nullable journal column.
    #[must_use]
    pub fn from_journal(journal_id: Option<JournalId>) -> Self {
        journal_id.map_or(Self::Global, Self::Journal)
    }
}

/// Validates a dotted setting key such as `site.title` or `mail.from_address`.
pub fn validate_setting_key(key: &str) -> AppResult<()> {
    if key.is_empty() || key.len() > SETTING_KEY_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "setting key must be 1 to {SETTING_KEY_MAX_LENGTH} characters"
        )));
    }

    let segments_valid = key.split('.').all(|segment| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|character| character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_')
    });
    if !segments_valid {
        return Err(AppError::Validation(format!(
            "setting key '{key}' must be dot-separated lowercase segments"
        )));
    }

    Ok(())
}

/// Key/value site setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSetting {
    /// Scope of the setting.
    pub scope: SettingScope,
    /// Dotted key.
    pub key: String,
    /// JSON value.
    pub value: serde_json::Value,
    /// Last write timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Transactional email template; the default text is kept for resets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplate {
    /// Template identifier.
    pub template_id: EmailTemplateId,
    /// Owning journal; `None` for site defaults.
    pub journal_id: Option<JournalId>,
    /// Template key, e.g. `REVIEW_REQUEST`.
    pub key: String,
    /// Current subject.
    pub subject: String,
    /// Current body.
    pub body: String,
    /// Shipped subject.
    pub default_subject: String,
    /// Shipped body.
    pub default_body: String,
    /// Disabled templates are not sent.
    pub is_enabled: bool,
    /// Last write timestamp.
    pub updated_at: DateTime<Utc>,
}

impl EmailTemplate {
    /// Returns whether the current text differs from the shipped default.
    #[must_use]
    pub fn is_customized(&self) -> bool {
        self.subject != self.default_subject || self.body != self.default_body
    }

    /// Restores the shipped subject and body.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.subject.clone_from(&self.default_subject);
        self.body.clone_from(&self.default_body);
        self.is_enabled = true;
        self.updated_at = now;
    }
}

/// Installation state of a plugin in one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSetting {
    /// Plugin name, e.g. `doi-pubid`.
    pub plugin_name: String,
    /// Scope of the row.
    pub scope: SettingScope,
    /// Whether the plugin runs.
    pub is_enabled: bool,
    /// Plugin-specific configuration.
    pub settings: serde_json::Value,
    /// Last write timestamp.
    pub updated_at: DateTime<Utc>,
}
