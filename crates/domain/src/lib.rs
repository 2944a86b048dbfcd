//! Domain entities and invariants.

#![forbid(unsafe_code)]

macro_rules! record_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Creates a random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID value.
            #[must_use]
            pub fn from_uuid(value: uuid::Uuid) -> Self {
                Self(value)
            }

            /// Returns the underlying UUID value.
            #[must_use]
            pub fn as_uuid(&self) -> uuid::Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

mod api_key;
mod audit;
mod backup;
mod issue;
mod journal;
mod navigation;
mod role;
mod settings;
mod submission;
mod user;
mod view;

pub use api_key::{
    API_KEY_DISPLAY_FRAGMENT_LENGTH, API_KEY_PREFIX, API_KEY_SECRET_HEX_LENGTH, ApiKey, ApiKeyId,
    display_prefix_for_secret,
};
pub use audit::{AuditAction, AuditRecord, AuditRecordId};
pub use backup::{Backup, BackupId};
pub use issue::{Issue, IssueId};
pub use journal::{Journal, JournalContact, validate_issn, validate_journal_path};
pub use navigation::{
    MenuItemSequence, NavigationMenu, NavigationMenuId, NavigationMenuItem, NavigationMenuItemId,
};
pub use role::{RoleAssignment, RoleAssignmentId, RoleKind, RoleScope};
pub use settings::{
    EmailTemplate, EmailTemplateId, PluginSetting, SettingScope, SiteSetting,
    validate_setting_key,
};
pub use submission::{
    ReviewAssignment, ReviewAssignmentId, ReviewRecommendation, ReviewStatus, Submission,
    SubmissionId, SubmissionStatus,
};
pub use user::{EmailAddress, UserAccount};
pub use view::ViewPath;
