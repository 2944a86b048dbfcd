//! Application services and ports.

#![forbid(unsafe_code)]

mod admin_ports;
mod api_key_service;
mod audit_logger;
mod audit_service;
mod authorization;
mod backup_service;
mod capabilities;
mod dashboard_service;
mod editorial_ports;
mod email_template_service;
mod envelope;
mod issue_service;
mod journal_service;
mod navigation_service;
mod plugin_service;
mod review_service;
mod site_settings_service;
mod submission_service;
mod user_service;
mod validation;
mod view_cache;

#[cfg(test)]
mod test_support;

pub use admin_ports::{
    ApiKeyRepository, BackupRepository, DashboardRepository, DashboardStats,
    EmailTemplateRepository, NavigationRepository, PluginRepository, SiteSettingsRepository,
    UserListQuery, UserRepository,
};
pub use api_key_service::{
    ApiKeyService, ApiKeyTarget, ApiKeyView, CreateApiKeyRequest, IssuedApiKey,
    ListApiKeysRequest, SetApiKeyEnabledRequest,
};
pub use audit_logger::{AuditEvent, AuditLogQuery, AuditLogRepository, AuditLogger, AuditRepository};
pub use audit_service::{AuditService, ListActivityRequest, PurgeActivityRequest, PurgeSummary};
pub use authorization::{
    AccessRequirement, ActorResolver, AuthorizationDecision, AuthorizationGuard,
    EDITORIAL_ROLES, ISSUE_MANAGER_ROLES, JOURNAL_ADMIN_ROLES, RoleAssignmentRepository,
};
pub use backup_service::BackupService;
pub use capabilities::FeatureCapabilities;
pub use dashboard_service::DashboardService;
pub use editorial_ports::{
    IssueListQuery, IssueRepository, JournalListQuery, JournalRepository, ReviewRepository,
    SubmissionListQuery, SubmissionRepository,
};
pub use email_template_service::{
    EmailTemplateService, EmailTemplateTarget, ListEmailTemplatesRequest,
    UpdateEmailTemplateRequest,
};
pub use envelope::{
    ActionEnvelope, ActionErrorKind, ActionOutcome, AuditDraft, Completed, UNAUTHORIZED_MESSAGE,
};
pub use issue_service::{
    CreateIssueRequest, IssueService, IssueTarget, ListIssuesRequest, UpdateIssueRequest,
};
pub use journal_service::{
    CreateJournalRequest, JournalService, JournalTarget, ListJournalsRequest,
    SetJournalActiveRequest, UpdateJournalRequest,
};
pub use navigation_service::{
    CreateMenuItemRequest, CreateMenuRequest, ListMenusRequest, MenuTarget, MenuWithItems,
    NavigationService, ReorderMenuItemsRequest, SequenceEntry,
};
pub use plugin_service::{
    ListPluginsRequest, PluginService, SetPluginEnabledRequest, UpdatePluginSettingsRequest,
};
pub use review_service::{
    AssignReviewerRequest, CompleteReviewRequest, ListReviewAssignmentsRequest, ReviewService,
};
pub use site_settings_service::{
    GetSiteSettingsRequest, SiteSettingsService, UpdateSiteSettingRequest,
};
pub use submission_service::{
    AssignSubmissionToIssueRequest, ChangeSubmissionStatusRequest, ListSubmissionsRequest,
    SubmissionService,
};
pub use user_service::{
    AssignRoleRequest, ListUsersRequest, RevokeRoleRequest, SetUserActiveRequest, UserService,
};
pub use validation::{
    DEFAULT_PAGE_LIMIT, InputSchema, MAX_PAGE_LIMIT, NoInput, PageQuery, PageRequest,
    field_errors_from, validate_input,
};
pub use view_cache::ViewCacheInvalidator;
