use std::future::Future;

use axum::response::Response;
use scholaris_application::{ActionOutcome, NoInput};
use scholaris_core::{AppError, Credential, FieldErrors};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::AppState;
use crate::transport::Transport;

/// Every privileged operation reachable from a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Procedure {
    ListJournals,
    CreateJournal,
    UpdateJournal,
    SetJournalActive,
    DeleteJournal,
    ListIssues,
    CreateIssue,
    UpdateIssue,
    PublishIssue,
    UnpublishIssue,
    DeleteIssue,
    ListSubmissions,
    ChangeSubmissionStatus,
    AssignSubmissionToIssue,
    ListReviewAssignments,
    AssignReviewer,
    CompleteReview,
    ListUsers,
    SetUserActive,
    AssignRole,
    RevokeRole,
    ListApiKeys,
    CreateApiKey,
    RegenerateApiKey,
    SetApiKeyEnabled,
    DeleteApiKey,
    GetSiteSettings,
    UpdateSiteSetting,
    ListMenus,
    CreateMenu,
    DeleteMenu,
    CreateMenuItem,
    ReorderMenuItems,
    ListEmailTemplates,
    UpdateEmailTemplate,
    ResetEmailTemplate,
    ListPlugins,
    SetPluginEnabled,
    UpdatePluginSettings,
    ListActivity,
    PurgeActivity,
    ListBackups,
    DashboardStats,
}

impl Procedure {
    /// Resolves a snake_case procedure name such as `list_journals`.
    pub fn from_name(name: &str) -> Option<Self> {
        serde_json::from_value(Value::String(name.to_owned())).ok()
    }
}

/// Decodes the payload into the operation's request type and renders its outcome.
async fn call<R, T, F, Fut>(payload: Value, transport: Transport, operation: F) -> Response
where
    R: DeserializeOwned,
    T: Serialize,
    F: FnOnce(R) -> Fut,
    Fut: Future<Output = ActionOutcome<T>>,
{
    match serde_path_to_error::deserialize::<_, R>(payload) {
        Ok(request) => transport.render(operation(request).await),
        Err(error) => transport.render(ActionOutcome::<()>::from_error(payload_error(&error))),
    }
}

/// Attributes a decode failure to the field it happened in. Missing fields
/// fail at the root, so their name is taken from the message.
fn payload_error(error: &serde_path_to_error::Error<serde_json::Error>) -> AppError {
    let message = error.inner().to_string();
    let path = error.path().to_string();
    let field = if path == "." {
        missing_field(&message).unwrap_or("payload").to_owned()
    } else {
        path
    };

    let mut fields = FieldErrors::default();
    fields.push(field, message);
    AppError::InvalidInput(fields)
}

fn missing_field(message: &str) -> Option<&str> {
    message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
}

pub async fn invoke(
    state: &AppState,
    procedure: Procedure,
    credential: Option<&Credential>,
    payload: Value,
    transport: Transport,
) -> Response {
    use Procedure as P;

    match procedure {
        P::ListJournals => {
            call(payload, transport, move |request| {
                state.journal_service.list_journals(credential, request)
            })
            .await
        }
        P::CreateJournal => {
            call(payload, transport, move |request| {
                state.journal_service.create_journal(credential, request)
            })
            .await
        }
        P::UpdateJournal => {
            call(payload, transport, move |request| {
                state.journal_service.update_journal(credential, request)
            })
            .await
        }
        P::SetJournalActive => {
            call(payload, transport, move |request| {
                state.journal_service.set_journal_active(credential, request)
            })
            .await
        }
        P::DeleteJournal => {
            call(payload, transport, move |request| {
                state.journal_service.delete_journal(credential, request)
            })
            .await
        }
        P::ListIssues => {
            call(payload, transport, move |request| {
                state.issue_service.list_issues(credential, request)
            })
            .await
        }
        P::CreateIssue => {
            call(payload, transport, move |request| {
                state.issue_service.create_issue(credential, request)
            })
            .await
        }
        P::UpdateIssue => {
            call(payload, transport, move |request| {
                state.issue_service.update_issue(credential, request)
            })
            .await
        }
        P::PublishIssue => {
            call(payload, transport, move |request| {
                state.issue_service.publish_issue(credential, request)
            })
            .await
        }
        P::UnpublishIssue => {
            call(payload, transport, move |request| {
                state.issue_service.unpublish_issue(credential, request)
            })
            .await
        }
        P::DeleteIssue => {
            call(payload, transport, move |request| {
                state.issue_service.delete_issue(credential, request)
            })
            .await
        }
        P::ListSubmissions => {
            call(payload, transport, move |request| {
                state.submission_service.list_submissions(credential, request)
            })
            .await
        }
        P::ChangeSubmissionStatus => {
            call(payload, transport, move |request| {
                state
                    .submission_service
                    .change_submission_status(credential, request)
            })
            .await
        }
        P::AssignSubmissionToIssue => {
            call(payload, transport, move |request| {
                state
                    .submission_service
                    .assign_submission_to_issue(credential, request)
            })
            .await
        }
        P::ListReviewAssignments => {
            call(payload, transport, move |request| {
                state
                    .review_service
                    .list_review_assignments(credential, request)
            })
            .await
        }
        P::AssignReviewer => {
            call(payload, transport, move |request| {
                state.review_service.assign_reviewer(credential, request)
            })
            .await
        }
        P::CompleteReview => {
            call(payload, transport, move |request| {
                state.review_service.complete_review(credential, request)
            })
            .await
        }
        P::ListUsers => {
            call(payload, transport, move |request| {
                state.user_service.list_users(credential, request)
            })
            .await
        }
        P::SetUserActive => {
            call(payload, transport, move |request| {
                state.user_service.set_user_active(credential, request)
            })
            .await
        }
        P::AssignRole => {
            call(payload, transport, move |request| {
                state.user_service.assign_role(credential, request)
            })
            .await
        }
        P::RevokeRole => {
            call(payload, transport, move |request| {
                state.user_service.revoke_role(credential, request)
            })
            .await
        }
        P::ListApiKeys => {
            call(payload, transport, move |request| {
                state.api_key_service.list_api_keys(credential, request)
            })
            .await
        }
        P::CreateApiKey => {
            call(payload, transport, move |request| {
                state.api_key_service.create_api_key(credential, request)
            })
            .await
        }
        P::RegenerateApiKey => {
            call(payload, transport, move |request| {
                state.api_key_service.regenerate_api_key(credential, request)
            })
            .await
        }
        P::SetApiKeyEnabled => {
            call(payload, transport, move |request| {
                state.api_key_service.set_api_key_enabled(credential, request)
            })
            .await
        }
        P::DeleteApiKey => {
            call(payload, transport, move |request| {
                state.api_key_service.delete_api_key(credential, request)
            })
            .await
        }
        P::GetSiteSettings => {
            call(payload, transport, move |request| {
                state
                    .site_settings_service
                    .get_site_settings(credential, request)
            })
            .await
        }
        P::UpdateSiteSetting => {
            call(payload, transport, move |request| {
                state
                    .site_settings_service
                    .update_site_setting(credential, request)
            })
            .await
        }
        P::ListMenus => {
            call(payload, transport, move |request| {
                state.navigation_service.list_menus(credential, request)
            })
            .await
        }
        P::CreateMenu => {
            call(payload, transport, move |request| {
                state.navigation_service.create_menu(credential, request)
            })
            .await
        }
        P::DeleteMenu => {
            call(payload, transport, move |request| {
                state.navigation_service.delete_menu(credential, request)
            })
            .await
        }
        P::CreateMenuItem => {
            call(payload, transport, move |request| {
                state.navigation_service.create_menu_item(credential, request)
            })
            .await
        }
        P::ReorderMenuItems => {
            call(payload, transport, move |request| {
                state
                    .navigation_service
                    .reorder_menu_items(credential, request)
            })
            .await
        }
        P::ListEmailTemplates => {
            call(payload, transport, move |request| {
                state
                    .email_template_service
                    .list_email_templates(credential, request)
            })
            .await
        }
        P::UpdateEmailTemplate => {
            call(payload, transport, move |request| {
                state
                    .email_template_service
                    .update_email_template(credential, request)
            })
            .await
        }
        P::ResetEmailTemplate => {
            call(payload, transport, move |request| {
                state
                    .email_template_service
                    .reset_email_template(credential, request)
            })
            .await
        }
        P::ListPlugins => {
            call(payload, transport, move |request| {
                state.plugin_service.list_plugins(credential, request)
            })
            .await
        }
        P::SetPluginEnabled => {
            call(payload, transport, move |request| {
                state.plugin_service.set_plugin_enabled(credential, request)
            })
            .await
        }
        P::UpdatePluginSettings => {
            call(payload, transport, move |request| {
                state
                    .plugin_service
                    .update_plugin_settings(credential, request)
            })
            .await
        }
        P::ListActivity => {
            call(payload, transport, move |request| {
                state.audit_service.list_activity(credential, request)
            })
            .await
        }
        P::PurgeActivity => {
            call(payload, transport, move |request| {
                state.audit_service.purge_activity(credential, request)
            })
            .await
        }
        P::ListBackups => {
            call(payload, transport, move |request| {
                state.backup_service.list_backups(credential, request)
            })
            .await
        }
        P::DashboardStats => {
            call(payload, transport, move |_: NoInput| {
                state.dashboard_service.dashboard_stats(credential)
            })
            .await
        }
    }
}
