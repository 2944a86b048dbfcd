use std::sync::Arc;

use scholaris_application::{
    ActionEnvelope, ActorResolver, ApiKeyRepository, ApiKeyService, AuditLogRepository,
    AuditLogger, AuditRepository, AuditService, AuthorizationGuard, BackupRepository,
    BackupService, DashboardRepository, DashboardService, EmailTemplateRepository,
    EmailTemplateService, FeatureCapabilities, IssueRepository, IssueService, JournalRepository,
    JournalService, NavigationRepository, NavigationService, PluginRepository, PluginService,
    ReviewRepository, ReviewService, RoleAssignmentRepository, SiteSettingsRepository,
    SiteSettingsService, SubmissionRepository, SubmissionService, UserRepository, UserService,
    ViewCacheInvalidator,
};

/// Port implementations the services are built from.
#[derive(Clone)]
pub struct StorageAdapters {
    pub actors: Arc<dyn ActorResolver>,
    pub roles: Arc<dyn RoleAssignmentRepository>,
    pub audit: Arc<dyn AuditRepository>,
    pub audit_log: Arc<dyn AuditLogRepository>,
    pub journals: Arc<dyn JournalRepository>,
    pub issues: Arc<dyn IssueRepository>,
    pub submissions: Arc<dyn SubmissionRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub users: Arc<dyn UserRepository>,
    pub api_keys: Arc<dyn ApiKeyRepository>,
    pub settings: Arc<dyn SiteSettingsRepository>,
    pub navigation: Arc<dyn NavigationRepository>,
    pub templates: Arc<dyn EmailTemplateRepository>,
    pub plugins: Arc<dyn PluginRepository>,
    pub backups: Arc<dyn BackupRepository>,
    pub dashboard: Arc<dyn DashboardRepository>,
    pub views: Arc<dyn ViewCacheInvalidator>,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub journal_service: JournalService,
    pub issue_service: IssueService,
    pub submission_service: SubmissionService,
    pub review_service: ReviewService,
    pub user_service: UserService,
    pub api_key_service: ApiKeyService,
    pub site_settings_service: SiteSettingsService,
    pub navigation_service: NavigationService,
    pub email_template_service: EmailTemplateService,
    pub plugin_service: PluginService,
    pub audit_service: AuditService,
    pub backup_service: BackupService,
    pub dashboard_service: DashboardService,
    pub postgres_pool: Option<sqlx::PgPool>,
    pub redis_client: Option<redis::Client>,
}

impl AppState {
    pub fn from_adapters(adapters: StorageAdapters, capabilities: FeatureCapabilities) -> Self {
        let guard = AuthorizationGuard::new(adapters.actors, adapters.roles);
        let envelope = ActionEnvelope::new(
            guard,
            AuditLogger::new(adapters.audit),
            adapters.views,
        );

        Self {
            journal_service: JournalService::new(envelope.clone(), adapters.journals.clone()),
            issue_service: IssueService::new(
                envelope.clone(),
                adapters.issues.clone(),
                adapters.journals.clone(),
            ),
            submission_service: SubmissionService::new(
                envelope.clone(),
                adapters.submissions.clone(),
                adapters.issues,
                adapters.journals.clone(),
            ),
            review_service: ReviewService::new(
                envelope.clone(),
                adapters.submissions,
                adapters.reviews,
                adapters.users.clone(),
            ),
            user_service: UserService::new(
                envelope.clone(),
                adapters.users.clone(),
                adapters.journals.clone(),
            ),
            api_key_service: ApiKeyService::new(
                envelope.clone(),
                adapters.api_keys,
                adapters.users,
            ),
            site_settings_service: SiteSettingsService::new(envelope.clone(), adapters.settings),
            navigation_service: NavigationService::new(
                envelope.clone(),
                adapters.navigation,
                adapters.journals,
            ),
            email_template_service: EmailTemplateService::new(
                envelope.clone(),
                adapters.templates,
            ),
            plugin_service: PluginService::new(envelope.clone(), adapters.plugins),
            audit_service: AuditService::new(envelope.clone(), adapters.audit_log),
            backup_service: BackupService::new(envelope.clone(), adapters.backups, capabilities),
            dashboard_service: DashboardService::new(envelope, adapters.dashboard),
            postgres_pool: None,
            redis_client: None,
        }
    }
}
