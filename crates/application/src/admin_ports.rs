mod api_keys;
mod configuration;
mod reporting;
mod users;

pub use api_keys::ApiKeyRepository;
pub use configuration::{
    EmailTemplateRepository, NavigationRepository, PluginRepository, SiteSettingsRepository,
};
pub use reporting::{BackupRepository, DashboardRepository, DashboardStats};
pub use users::{UserListQuery, UserRepository};
