mod cors;

use axum::Router;
use axum::routing::{MethodFilter, get, post};
use scholaris_core::AppError;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, rest, rpc};
use crate::procedure::Procedure as P;
use crate::state::AppState;

use self::cors::build_cors_layer;

const POST: MethodFilter = MethodFilter::POST;
const PUT: MethodFilter = MethodFilter::PUT;
const DELETE: MethodFilter = MethodFilter::DELETE;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    Ok(Router::new()
        .route("/health", get(health::health_handler))
        .route("/rpc/{procedure}", post(rpc::rpc_handler))
        .merge(rest_routes())
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(frontend_url)?)
        .with_state(app_state))
}

fn rest_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/journals",
            rest::read(P::ListJournals).merge(rest::write(POST, P::CreateJournal)),
        )
        .route(
            "/api/journals/{journal_id}",
            rest::write_at(PUT, P::UpdateJournal).merge(rest::write_at(DELETE, P::DeleteJournal)),
        )
        .route(
            "/api/journals/{journal_id}/active",
            rest::write_at(PUT, P::SetJournalActive),
        )
        .route(
            "/api/journals/{journal_id}/issues",
            rest::read_at(P::ListIssues).merge(rest::write_at(POST, P::CreateIssue)),
        )
        .route(
            "/api/issues/{issue_id}",
            rest::write_at(PUT, P::UpdateIssue).merge(rest::write_at(DELETE, P::DeleteIssue)),
        )
        .route(
            "/api/issues/{issue_id}/publish",
            rest::write_at(POST, P::PublishIssue),
        )
        .route(
            "/api/issues/{issue_id}/unpublish",
            rest::write_at(POST, P::UnpublishIssue),
        )
        .route(
            "/api/journals/{journal_id}/submissions",
            rest::read_at(P::ListSubmissions),
        )
        .route(
            "/api/submissions/{submission_id}/status",
            rest::write_at(PUT, P::ChangeSubmissionStatus),
        )
        .route(
            "/api/submissions/{submission_id}/issue",
            rest::write_at(PUT, P::AssignSubmissionToIssue),
        )
        .route(
            "/api/submissions/{submission_id}/reviews",
            rest::read_at(P::ListReviewAssignments).merge(rest::write_at(POST, P::AssignReviewer)),
        )
        .route(
            "/api/reviews/{review_id}/complete",
            rest::write_at(POST, P::CompleteReview),
        )
        .route("/api/users", rest::read(P::ListUsers))
        .route(
            "/api/users/{user_id}/active",
            rest::write_at(PUT, P::SetUserActive),
        )
        .route(
            "/api/users/{user_id}/roles",
            rest::write_at(POST, P::AssignRole),
        )
        .route(
            "/api/role-assignments/{assignment_id}",
            rest::write_at(DELETE, P::RevokeRole),
        )
        .route(
            "/api/api-keys",
            rest::read(P::ListApiKeys).merge(rest::write(POST, P::CreateApiKey)),
        )
        .route(
            "/api/api-keys/{api_key_id}",
            rest::write_at(DELETE, P::DeleteApiKey),
        )
        .route(
            "/api/api-keys/{api_key_id}/regenerate",
            rest::write_at(POST, P::RegenerateApiKey),
        )
        .route(
            "/api/api-keys/{api_key_id}/enabled",
            rest::write_at(PUT, P::SetApiKeyEnabled),
        )
        .route(
            "/api/settings",
            rest::read(P::GetSiteSettings).merge(rest::write(PUT, P::UpdateSiteSetting)),
        )
        .route(
            "/api/navigation/menus",
            rest::read(P::ListMenus).merge(rest::write(POST, P::CreateMenu)),
        )
        .route(
            "/api/navigation/menus/{menu_id}",
            rest::write_at(DELETE, P::DeleteMenu),
        )
        .route(
            "/api/navigation/menus/{menu_id}/items",
            rest::write_at(POST, P::CreateMenuItem),
        )
        .route(
            "/api/navigation/menus/{menu_id}/items/order",
            rest::write_at(PUT, P::ReorderMenuItems),
        )
        .route("/api/email-templates", rest::read(P::ListEmailTemplates))
        .route(
            "/api/email-templates/{template_id}",
            rest::write_at(PUT, P::UpdateEmailTemplate),
        )
        .route(
            "/api/email-templates/{template_id}/reset",
            rest::write_at(POST, P::ResetEmailTemplate),
        )
        .route("/api/plugins", rest::read(P::ListPlugins))
        .route(
            "/api/plugins/{plugin_name}/enabled",
            rest::write_at(PUT, P::SetPluginEnabled),
        )
        .route(
            "/api/plugins/{plugin_name}/settings",
            rest::write_at(PUT, P::UpdatePluginSettings),
        )
        .route("/api/activity", rest::read(P::ListActivity))
        .route("/api/activity/purge", rest::write(POST, P::PurgeActivity))
        .route("/api/backups", rest::read(P::ListBackups))
        .route("/api/dashboard", rest::read(P::DashboardStats))
}

#[cfg(test)]
mod tests;
