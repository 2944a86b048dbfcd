//! Resource-style routes over the same procedures the RPC endpoint exposes.
//!
//! Path parameters and query strings are folded into one JSON payload, so a
//! REST call and a procedure call with the same fields run identical code.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::{MethodFilter, MethodRouter, on};
use scholaris_application::ActionOutcome;
use serde_json::{Map, Value};

use super::{bearer_credential, body_object};
use crate::procedure::{Procedure, invoke};
use crate::state::AppState;
use crate::transport::Transport;

const NUMERIC_QUERY_KEYS: [&str; 3] = ["limit", "offset", "days"];
const BOOLEAN_QUERY_KEYS: [&str; 3] = ["published", "include_inactive", "is_active"];

/// `GET` route reading its input from the query string.
pub fn read(procedure: Procedure) -> MethodRouter<AppState> {
    on(
        MethodFilter::GET,
        move |State(state): State<AppState>,
              Query(query): Query<HashMap<String, String>>,
              headers: HeaderMap| async move {
            dispatch(&state, procedure, &headers, coerce_query(query)).await
        },
    )
}

/// `GET` route that also reads path parameters.
pub fn read_at(procedure: Procedure) -> MethodRouter<AppState> {
    on(
        MethodFilter::GET,
        move |State(state): State<AppState>,
              Path(params): Path<HashMap<String, String>>,
              Query(query): Query<HashMap<String, String>>,
              headers: HeaderMap| async move {
            let mut payload = coerce_query(query);
            merge_path(&mut payload, params);
            dispatch(&state, procedure, &headers, payload).await
        },
    )
}

/// Mutating route reading its input from a JSON body.
pub fn write(method: MethodFilter, procedure: Procedure) -> MethodRouter<AppState> {
    on(
        method,
        move |State(state): State<AppState>, headers: HeaderMap, body: Bytes| async move {
            match body_object(&body) {
                Ok(payload) => dispatch(&state, procedure, &headers, payload).await,
                Err(error) => Transport::Http.render(ActionOutcome::<()>::from_error(error)),
            }
        },
    )
}

/// Mutating route whose path parameters override body fields.
pub fn write_at(method: MethodFilter, procedure: Procedure) -> MethodRouter<AppState> {
    on(
        method,
        move |State(state): State<AppState>,
              Path(params): Path<HashMap<String, String>>,
              headers: HeaderMap,
              body: Bytes| async move {
            match body_object(&body) {
                Ok(mut payload) => {
                    merge_path(&mut payload, params);
                    dispatch(&state, procedure, &headers, payload).await
                }
                Err(error) => Transport::Http.render(ActionOutcome::<()>::from_error(error)),
            }
        },
    )
}

async fn dispatch(
    state: &AppState,
    procedure: Procedure,
    headers: &HeaderMap,
    payload: Map<String, Value>,
) -> Response {
    let credential = bearer_credential(headers);
    invoke(
        state,
        procedure,
        credential.as_ref(),
        Value::Object(payload),
        Transport::Http,
    )
    .await
}

fn merge_path(payload: &mut Map<String, Value>, params: HashMap<String, String>) {
    for (name, value) in params {
        payload.insert(name, Value::String(value));
    }
}

/// Turns query parameters into JSON fields, typing the known numeric and
/// boolean keys. Values that do not parse stay strings and fail validation.
pub(crate) fn coerce_query(query: HashMap<String, String>) -> Map<String, Value> {
    query
        .into_iter()
        .map(|(name, raw)| {
            let value = if NUMERIC_QUERY_KEYS.contains(&name.as_str()) {
                raw.trim()
                    .parse::<u64>()
                    .map_or_else(|_| Value::String(raw.clone()), Value::from)
            } else if BOOLEAN_QUERY_KEYS.contains(&name.as_str()) {
                match raw.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => Value::Bool(true),
                    "false" | "0" => Value::Bool(false),
                    _ => Value::String(raw.clone()),
                }
            } else {
                Value::String(raw)
            };
            (name, value)
        })
        .collect()
}
