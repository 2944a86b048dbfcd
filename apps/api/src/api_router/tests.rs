use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use proptest::prelude::*;
use scholaris_application::FeatureCapabilities;
use scholaris_core::{Credential, TenantId};
use scholaris_domain::{RoleKind, RoleScope, ViewPath};
use scholaris_infrastructure::{InMemoryStore, InMemoryViewCache};
use serde_json::{Value, json};
use tower::ServiceExt;

use super::build_router;
use crate::handlers::rest::coerce_query;
use crate::state::{AppState, StorageAdapters};

struct Harness {
    router: Router,
    store: Arc<InMemoryStore>,
    views: Arc<InMemoryViewCache>,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let views = Arc::new(InMemoryViewCache::new(300));
    let adapters = StorageAdapters {
        actors: store.clone(),
        roles: store.clone(),
        audit: store.clone(),
        audit_log: store.clone(),
        journals: store.clone(),
        issues: store.clone(),
        submissions: store.clone(),
        reviews: store.clone(),
        users: store.clone(),
        api_keys: store.clone(),
        settings: store.clone(),
        navigation: store.clone(),
        templates: store.clone(),
        plugins: store.clone(),
        backups: store.clone(),
        dashboard: store.clone(),
        views: views.clone(),
    };
    let state = AppState::from_adapters(adapters, FeatureCapabilities::default());
    let Ok(router) = build_router(state, "http://localhost:3000") else {
        panic!("router must build with a valid frontend origin");
    };

    Harness {
        router,
        store,
        views,
    }
}

impl Harness {
    async fn signed_in(&self, token: &str, expires_at: Option<chrono::DateTime<Utc>>) -> String {
        let Some(credential) = Credential::bearer(token) else {
            panic!("test token must not be blank");
        };
        let Ok(user_id) = self
            .store
            .insert_user("Site Admin", &format!("{token}@journals.test"))
            .await
        else {
            panic!("seed user must insert");
        };
        self.store.issue_token(user_id, &credential, expires_at).await;
        self.store
            .grant_role(user_id, RoleKind::SuperAdmin, RoleScope::Global)
            .await;
        format!("Bearer {token}")
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(authorization) = authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }
        let body = match body {
            Some(body) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        let Ok(request) = builder.body(body) else {
            panic!("request must build");
        };

        let Ok(response) = self.router.clone().oneshot(request).await else {
            panic!("router is infallible");
        };
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("response body must be readable");
        };
        let payload = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, payload)
    }
}

#[tokio::test]
async fn anonymous_rest_calls_are_rejected_with_401() {
    let harness = harness();

    let (status, body) = harness.send("GET", "/api/journals", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({ "success": false, "data": null, "error": "Unauthorized" })
    );
}

#[tokio::test]
async fn procedure_calls_carry_failures_in_the_envelope() {
    let harness = harness();

    let (status, body) = harness
        .send("POST", "/rpc/list_journals", None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Unauthorized"));
}

#[tokio::test]
async fn unknown_procedures_answer_with_a_not_found_envelope() {
    let harness = harness();

    let (status, body) = harness
        .send("POST", "/rpc/drop_everything", None, Some(json!({})))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("unknown procedure 'drop_everything'"));
}

#[tokio::test]
async fn expired_tokens_are_treated_as_anonymous() {
    let harness = harness();
    let authorization = harness
        .signed_in("stale-token", Some(Utc::now() - Duration::minutes(5)))
        .await;

    let (status, body) = harness
        .send("GET", "/api/users", Some(authorization.as_str()), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("Unauthorized"));
}

#[tokio::test]
async fn super_admin_creates_and_deactivates_a_journal() {
    let harness = harness();
    let authorization = harness
        .signed_in("admin-token", Some(Utc::now() + Duration::hours(1)))
        .await;

    let (status, created) = harness
        .send(
            "POST",
            "/api/journals",
            Some(authorization.as_str()),
            Some(json!({
                "tenant_id": TenantId::new(),
                "path": "  jsys  ",
                "title": "Journal of Systems",
                "contact_email": "office@jsys.test",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["success"], json!(true));
    assert_eq!(created["data"]["path"], json!("jsys"));
    assert!(
        harness
            .views
            .stale_paths()
            .await
            .contains(&ViewPath::admin_journals())
    );

    let Some(journal_id) = created["data"]["journal_id"].as_str() else {
        panic!("created journal must carry an id");
    };
    let (status, updated) = harness
        .send(
            "PUT",
            &format!("/api/journals/{journal_id}/active"),
            Some(authorization.as_str()),
            Some(json!({ "is_active": false })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["is_active"], json!(false));

    let (_, listed) = harness
        .send(
            "GET",
            "/api/journals?include_inactive=false",
            Some(authorization.as_str()),
            None,
        )
        .await;
    assert_eq!(listed["data"], json!([]));
}

#[tokio::test]
async fn invalid_input_returns_400_with_field_details() {
    let harness = harness();
    let authorization = harness.signed_in("editor-token", None).await;

    let (status, body) = harness
        .send(
            "POST",
            "/api/journals",
            Some(authorization.as_str()),
            Some(json!({
                "tenant_id": TenantId::new(),
                "path": "",
                "title": "",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert!(body["details"]["title"].is_array());
    assert!(body["details"]["path"].is_array());
}

#[tokio::test]
async fn malformed_payloads_are_validation_failures() {
    let harness = harness();
    let authorization = harness.signed_in("payload-token", None).await;

    let (status, body) = harness
        .send(
            "POST",
            "/rpc/set_journal_active",
            Some(authorization.as_str()),
            Some(json!({ "journal_id": "not-a-uuid", "is_active": true })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Validation failed"));
    assert!(body["details"]["journal_id"].is_array());

    let (status, body) = harness
        .send(
            "POST",
            "/api/journals",
            Some(authorization.as_str()),
            Some(json!({ "path": "jsys", "title": "Journal of Systems" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["tenant_id"].is_array());
}

#[tokio::test]
async fn health_reports_disabled_dependencies() {
    let harness = harness();

    let (status, body) = harness.send("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["postgres"]["status"], json!("disabled"));
    assert_eq!(body["redis"]["status"], json!("disabled"));
}

proptest! {
    #[test]
    fn numeric_query_values_become_numbers(limit in 1_u32..=200, offset in 0_u32..10_000) {
        let query = HashMap::from([
            ("limit".to_owned(), limit.to_string()),
            ("offset".to_owned(), offset.to_string()),
            ("search".to_owned(), offset.to_string()),
        ]);

        let payload = coerce_query(query);

        prop_assert_eq!(payload.get("limit"), Some(&json!(limit)));
        prop_assert_eq!(payload.get("offset"), Some(&json!(offset)));
        prop_assert_eq!(payload.get("search"), Some(&json!(offset.to_string())));
    }
}
