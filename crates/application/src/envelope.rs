//! Uniform wrapper around every privileged operation.
//!
//! Steps run in a fixed order: validate, authorize, execute, audit, invalidate
//! cached views, respond. A step that fails stops the ones after it, except
//! for the audit write and the cache signal, whose failures are only logged.

use std::future::Future;
use std::sync::Arc;

use scholaris_core::{Actor, AppError, AppResult, Credential, UserId};
use scholaris_domain::{AuditAction, ViewPath};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    AccessRequirement, AuditEvent, AuditLogger, AuthorizationDecision, AuthorizationGuard,
    InputSchema, ViewCacheInvalidator, validate_input,
};

/// Message returned for every guard denial.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Failure category carried next to the envelope for transport mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionErrorKind {
    /// Rejected input.
    Validation,
    /// No valid credential.
    Unauthorized,
    /// Insufficient role.
    Forbidden,
    /// Missing entity.
    NotFound,
    /// Domain conflict.
    Conflict,
    /// Data layer or unexpected failure.
    Internal,
}

/// Result envelope serialized as `{success, data, error?, details?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionOutcome<T> {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Payload, `null` on failure.
    pub data: Option<T>,
    /// Human-readable failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Structured failure details, such as per-field messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Failure category; not part of the wire shape.
    #[serde(skip)]
    pub error_kind: Option<ActionErrorKind>,
}

impl<T> ActionOutcome<T> {
    /// Successful outcome.
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
            error_kind: None,
        }
    }

    /// Failed outcome with a message.
    #[must_use]
    pub fn failure(kind: ActionErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            details: None,
            error_kind: Some(kind),
        }
    }

    /// Guard denial; both denial kinds share one message.
    #[must_use]
    pub fn denied(kind: ActionErrorKind) -> Self {
        Self::failure(kind, UNAUTHORIZED_MESSAGE)
    }

    /// Converts an application error into a failed outcome.
    #[must_use]
    pub fn from_error(error: AppError) -> Self {
        match error {
            AppError::Validation(message) => Self::failure(ActionErrorKind::Validation, message),
            AppError::InvalidInput(fields) => Self {
                details: serde_json::to_value(&fields).ok(),
                ..Self::failure(ActionErrorKind::Validation, "Validation failed")
            },
            AppError::NotFound(message) => Self::failure(ActionErrorKind::NotFound, message),
            AppError::Conflict(message) => Self::failure(ActionErrorKind::Conflict, message),
            AppError::Unauthorized(_) => Self::denied(ActionErrorKind::Unauthorized),
            AppError::Forbidden(_) => Self::denied(ActionErrorKind::Forbidden),
            AppError::Internal(message) => Self::failure(ActionErrorKind::Internal, message),
        }
    }

    /// Maps the payload of a successful outcome.
    pub fn map<U>(self, mapper: impl FnOnce(T) -> U) -> ActionOutcome<U> {
        ActionOutcome {
            success: self.success,
            data: self.data.map(mapper),
            error: self.error,
            details: self.details,
            error_kind: self.error_kind,
        }
    }
}

/// Audit record an operation asks the envelope to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditDraft {
    action: AuditAction,
    entity_type: &'static str,
    entity_id: String,
    details: serde_json::Value,
}

impl AuditDraft {
    /// Creates a draft without details.
    #[must_use]
    pub fn new(action: AuditAction, entity_type: &'static str, entity_id: impl ToString) -> Self {
        Self {
            action,
            entity_type,
            entity_id: entity_id.to_string(),
            details: serde_json::Value::Null,
        }
    }

    /// Attaches structured details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    fn into_event(self, actor_id: UserId) -> AuditEvent {
        AuditEvent {
            action: self.action,
            entity_type: self.entity_type.to_owned(),
            entity_id: self.entity_id,
            details: self.details,
            actor_id: Some(actor_id),
        }
    }
}

/// Successful operation result with its side-effect requests.
#[derive(Debug)]
pub struct Completed<T> {
    data: T,
    audit: Option<AuditDraft>,
    invalidate: Vec<ViewPath>,
}

impl<T> Completed<T> {
    /// Read-only result: no audit record, no invalidation.
    #[must_use]
    pub fn read(data: T) -> Self {
        Self {
            data,
            audit: None,
            invalidate: Vec::new(),
        }
    }

    /// State change recorded in the activity log.
    #[must_use]
    pub fn changed(data: T, audit: AuditDraft) -> Self {
        Self {
            data,
            audit: Some(audit),
            invalidate: Vec::new(),
        }
    }

    /// Adds view paths made stale by the change.
    #[must_use]
    pub fn invalidating(mut self, paths: impl IntoIterator<Item = ViewPath>) -> Self {
        for path in paths {
            if !self.invalidate.contains(&path) {
                self.invalidate.push(path);
            }
        }
        self
    }
}

/// Runs operations through validation, the guard, audit and cache signalling.
#[derive(Clone)]
pub struct ActionEnvelope {
    guard: AuthorizationGuard,
    audit_logger: AuditLogger,
    view_cache: Arc<dyn ViewCacheInvalidator>,
}

impl ActionEnvelope {
    /// Creates an envelope from its collaborators.
    #[must_use]
    pub fn new(
        guard: AuthorizationGuard,
        audit_logger: AuditLogger,
        view_cache: Arc<dyn ViewCacheInvalidator>,
    ) -> Self {
        Self {
            guard,
            audit_logger,
            view_cache,
        }
    }

    /// Runs an operation whose requirement follows from the input alone.
    pub async fn run<S, T, R, Op, Fut>(
        &self,
        credential: Option<&Credential>,
        input: S,
        requirement: R,
        operation: Op,
    ) -> ActionOutcome<T>
    where
        S: InputSchema,
        R: FnOnce(&S::Valid) -> AccessRequirement,
        Op: FnOnce(Actor, S::Valid) -> Fut,
        Fut: Future<Output = AppResult<Completed<T>>>,
    {
        self.run_scoped(
            credential,
            input,
            |valid| std::future::ready(Ok(requirement(valid))),
            operation,
        )
        .await
    }

    /// Runs an operation whose requirement needs a lookup, e.g. issue to journal.
    ///
    /// The lookup only runs for authenticated callers. If it fails, only a
    /// global super admin may continue, so missing entities never leak to
    /// other actors.
    pub async fn run_scoped<S, T, R, RFut, Op, Fut>(
        &self,
        credential: Option<&Credential>,
        input: S,
        requirement: R,
        operation: Op,
    ) -> ActionOutcome<T>
    where
        S: InputSchema,
        R: FnOnce(&S::Valid) -> RFut,
        RFut: Future<Output = AppResult<AccessRequirement>>,
        Op: FnOnce(Actor, S::Valid) -> Fut,
        Fut: Future<Output = AppResult<Completed<T>>>,
    {
        let valid = match validate_input(input) {
            Ok(valid) => valid,
            Err(error) => {
                debug!(%error, "input rejected");
                return ActionOutcome::from_error(error);
            }
        };

        let Some(actor) = self.guard.authenticate(credential).await else {
            return ActionOutcome::denied(ActionErrorKind::Unauthorized);
        };

        let requirement = match requirement(&valid).await {
            Ok(requirement) => requirement,
            Err(error) => {
                debug!(%error, "access scope unresolved; requiring super admin");
                AccessRequirement::super_admin()
            }
        };

        let actor = match self.guard.check(actor, &requirement).await {
            AuthorizationDecision::Authorized(actor) => actor,
            AuthorizationDecision::Unauthorized => {
                return ActionOutcome::denied(ActionErrorKind::Unauthorized);
            }
            AuthorizationDecision::Forbidden => {
                return ActionOutcome::denied(ActionErrorKind::Forbidden);
            }
        };

        let actor_id = actor.user_id();
        let completed = match operation(actor, valid).await {
            Ok(completed) => completed,
            Err(error) => {
                if matches!(error, AppError::Internal(_)) {
                    warn!(%error, actor_id = %actor_id, "operation failed in the data layer");
                } else {
                    debug!(%error, actor_id = %actor_id, "operation rejected");
                }
                return ActionOutcome::from_error(error);
            }
        };

        if let Some(draft) = completed.audit {
            info!(
                action = draft.action.as_str(),
                actor_id = %actor_id,
                entity_type = draft.entity_type,
                entity_id = %draft.entity_id,
                "action completed"
            );
            self.audit_logger.record(draft.into_event(actor_id)).await;
        }

        if !completed.invalidate.is_empty()
            && let Err(error) = self.view_cache.invalidate(&completed.invalidate).await
        {
            warn!(%error, paths = completed.invalidate.len(), "failed to signal view invalidation");
        }

        ActionOutcome::success(completed.data)
    }
}
