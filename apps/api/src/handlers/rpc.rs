use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use scholaris_application::{ActionErrorKind, ActionOutcome};
use serde_json::Value;
use tracing::debug;

use super::{bearer_credential, body_object};
use crate::procedure::{Procedure, invoke};
use crate::state::AppState;
use crate::transport::Transport;

/// `POST /rpc/{procedure}`: the envelope always travels with status 200.
pub async fn rpc_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let transport = Transport::DirectCall;
    let Some(procedure) = Procedure::from_name(name.as_str()) else {
        debug!(procedure = %name, "unknown procedure");
        return transport.render(ActionOutcome::<()>::failure(
            ActionErrorKind::NotFound,
            format!("unknown procedure '{name}'"),
        ));
    };

    let payload = match body_object(&body) {
        Ok(object) => Value::Object(object),
        Err(error) => return transport.render(ActionOutcome::<()>::from_error(error)),
    };

    let credential = bearer_credential(&headers);
    invoke(&state, procedure, credential.as_ref(), payload, transport).await
}
