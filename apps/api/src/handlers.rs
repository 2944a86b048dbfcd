pub mod health;
pub mod rest;
pub mod rpc;

use axum::body::Bytes;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use scholaris_core::{AppError, Credential};
use serde_json::{Map, Value};

/// Reads the bearer credential from the `Authorization` header, if any.
pub(crate) fn bearer_credential(headers: &HeaderMap) -> Option<Credential> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(Credential::from_authorization_header)
}

/// Parses a JSON object body. An empty body is an empty object.
pub(crate) fn body_object(body: &Bytes) -> Result<Map<String, Value>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(AppError::Validation(
            "request body must be a JSON object".to_owned(),
        )),
        Err(error) => Err(AppError::Validation(format!(
            "request body is not valid JSON: {error}"
        ))),
    }
}
