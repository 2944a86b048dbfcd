use std::str::FromStr;

use chrono::{DateTime, Utc};
use scholaris_core::{AppError, UserId};
use serde::{Deserialize, Serialize};

record_identifier!(
    /// Audit record identifier.
    AuditRecordId
);

macro_rules! audit_actions {
    ($($(#[$meta:meta])* $variant:ident => $value:literal,)+) => {
        /// Privileged state change recorded in the activity log.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum AuditAction {
            $($(#[$meta])* #[serde(rename = $value)] $variant,)+
        }

        impl AuditAction {
            /// Returns a stable storage value for this action.
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            /// Returns all known actions.
            #[must_use]
            pub fn all() -> &'static [Self] {
                &[$(Self::$variant,)+]
            }
        }
    };
}

audit_actions! {
    /// Journal created.
    JournalCreated => "journal.created",
    /// Journal metadata changed.
    JournalUpdated => "journal.updated",
    /// Journal switched on.
    JournalActivated => "journal.activated",
    /// Journal switched off.
    JournalDeactivated => "journal.deactivated",
    /// Journal removed.
    JournalDeleted => "journal.deleted",
    /// Issue created.
    IssueCreated => "issue.created",
    /// Issue metadata changed.
    IssueUpdated => "issue.updated",
    /// Issue published.
    IssuePublished => "issue.published",
    /// Issue withdrawn.
    IssueUnpublished => "issue.unpublished",
    /// Issue removed.
    IssueDeleted => "issue.deleted",
    /// Submission moved through its lifecycle.
    SubmissionStatusChanged => "submission.status_changed",
    /// Submission placed in an issue.
    SubmissionScheduled => "submission.scheduled",
    /// Reviewer invited.
    ReviewAssigned => "review.assigned",
    /// Review delivered.
    ReviewCompleted => "review.completed",
    /// User enabled.
    UserActivated => "user.activated",
    /// User disabled.
    UserDeactivated => "user.deactivated",
    /// Role granted.
    UserRoleAssigned => "user.role_assigned",
    /// Role withdrawn.
    UserRoleRevoked => "user.role_revoked",
    /// API key issued.
    ApiKeyCreated => "api_key.created",
    /// API key secret rotated.
    ApiKeyRegenerated => "api_key.regenerated",
    /// API key enabled.
    ApiKeyEnabled => "api_key.enabled",
    /// API key disabled.
    ApiKeyDisabled => "api_key.disabled",
    /// API key removed.
    ApiKeyDeleted => "api_key.deleted",
    /// Site setting written.
    SiteSettingUpdated => "site_setting.updated",
    /// Navigation menu created.
    NavigationMenuCreated => "navigation.menu_created",
    /// Navigation menu removed with its items.
    NavigationMenuDeleted => "navigation.menu_deleted",
    /// Navigation item added.
    NavigationItemCreated => "navigation.item_created",
    /// Navigation items reordered.
    NavigationItemsReordered => "navigation.items_reordered",
    /// Email template edited.
    EmailTemplateUpdated => "email_template.updated",
    /// Email template restored to its default.
    EmailTemplateReset => "email_template.reset",
    /// Plugin switched on.
    PluginEnabled => "plugin.enabled",
    /// Plugin switched off.
    PluginDisabled => "plugin.disabled",
    /// Plugin settings written.
    PluginSettingsUpdated => "plugin.settings_updated",
    /// Old activity records purged.
    ActivityLogPurged => "activity_log.purged",
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown audit action '{value}'")))
    }
}

/// Immutable who-did-what-to-what record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Record identifier.
    pub record_id: AuditRecordId,
    /// Recorded action.
    pub action: AuditAction,
    /// Kind of entity touched, e.g. `issue`.
    pub entity_type: String,
    /// Identifier of the touched entity.
    pub entity_id: String,
    /// Free-form structured details.
    pub details: serde_json::Value,
    /// Acting user.
    pub actor_id: Option<UserId>,
    /// Append timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::str::FromStr;

    use super::AuditAction;

    #[test]
    fn storage_values_are_unique_and_parse_back() {
        let mut seen = HashSet::new();
        for action in AuditAction::all() {
            assert!(seen.insert(action.as_str()));
            assert_eq!(AuditAction::from_str(action.as_str()).ok(), Some(*action));
        }
    }

    #[test]
    fn serde_uses_storage_value() {
        let encoded = serde_json::to_string(&AuditAction::ActivityLogPurged).unwrap_or_default();
        assert_eq!(encoded, "\"activity_log.purged\"");
    }
}
