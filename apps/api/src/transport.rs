use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use scholaris_application::{ActionErrorKind, ActionOutcome};
use serde::Serialize;

/// How an envelope reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// REST routes: failures carry a matching status code.
    Http,
    /// Procedure calls: the envelope alone reports the outcome.
    DirectCall,
}

impl Transport {
    pub fn status_for(self, kind: Option<ActionErrorKind>) -> StatusCode {
        match (self, kind) {
            (Self::DirectCall, _) | (Self::Http, None) => StatusCode::OK,
            (Self::Http, Some(kind)) => http_status(kind),
        }
    }

    pub fn render<T: Serialize>(self, outcome: ActionOutcome<T>) -> Response {
        let status = self.status_for(outcome.error_kind);
        (status, Json(outcome)).into_response()
    }
}

fn http_status(kind: ActionErrorKind) -> StatusCode {
    match kind {
        ActionErrorKind::Validation => StatusCode::BAD_REQUEST,
        ActionErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ActionErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ActionErrorKind::NotFound => StatusCode::NOT_FOUND,
        ActionErrorKind::Conflict => StatusCode::CONFLICT,
        ActionErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
