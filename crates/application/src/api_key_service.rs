//! API key administration.
//!
//! The plaintext secret exists only in the create and regenerate responses.
//! Storage keeps its SHA-256 hash and the `sk_live_xxxxxxxx` display prefix.

mod secret;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use scholaris_core::{AppError, AppResult, Credential, FieldErrors, UserId};
use scholaris_domain::{ApiKey, ApiKeyId, AuditAction, ViewPath};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::{finish_fields, trimmed_required};
use crate::{
    AccessRequirement, ActionEnvelope, ActionOutcome, ApiKeyRepository, AuditDraft, Completed,
    InputSchema, UserRepository,
};

use self::secret::generate_secret;

/// API key as shown in listings; never carries the secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiKeyView {
    /// Key identifier.
    pub api_key_id: ApiKeyId,
    /// Owning user.
    pub user_id: UserId,
    /// Label.
    pub name: String,
    /// Granted permissions.
    pub permissions: Vec<String>,
    /// Masked secret such as `sk_live_abcd1234…`.
    pub masked_key: String,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the key is enabled.
    pub is_enabled: bool,
    /// Whether the key has expired.
    pub is_expired: bool,
    /// Last successful use.
    pub last_used_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ApiKeyView {
    fn from_key(api_key: ApiKey, now: DateTime<Utc>) -> Self {
        Self {
            masked_key: api_key.masked(),
            is_expired: api_key.is_expired(now),
            api_key_id: api_key.api_key_id,
            user_id: api_key.user_id,
            name: api_key.name,
            permissions: api_key.permissions,
            expires_at: api_key.expires_at,
            is_enabled: api_key.is_enabled,
            last_used_at: api_key.last_used_at,
            created_at: api_key.created_at,
        }
    }
}

/// Create/regenerate payload: the only place the full secret appears.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct IssuedApiKey {
    /// Key metadata with the masked secret.
    pub api_key: ApiKeyView,
    /// Full plaintext secret.
    pub secret: String,
}

impl fmt::Debug for IssuedApiKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("IssuedApiKey")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Listing request for API keys.
#[derive(Debug, Clone, Copy, Default, Deserialize, Validate)]
pub struct ListApiKeysRequest {
    /// Restrict to one owner.
    pub user_id: Option<UserId>,
}

impl InputSchema for ListApiKeysRequest {
    type Valid = Option<UserId>;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(self.user_id)
    }
}

/// Request addressing one API key.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct ApiKeyTarget {
    /// Key identifier.
    pub api_key_id: ApiKeyId,
}

impl InputSchema for ApiKeyTarget {
    type Valid = ApiKeyId;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(self.api_key_id)
    }
}

/// Request issuing a new API key.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateApiKeyRequest {
    /// Owning user.
    pub user_id: UserId,
    /// Label.
    #[validate(length(min = 1, max = 100, message = "name must be 1 to 100 characters"))]
    pub name: String,
    /// Permissions such as `journals:read`.
    #[serde(default)]
    #[validate(length(max = 32, message = "at most 32 permissions are allowed"))]
    pub permissions: Vec<String>,
    /// Optional expiry, must lie in the future.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Sanitized key creation values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApiKey {
    user_id: UserId,
    name: String,
    permissions: Vec<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl InputSchema for CreateApiKeyRequest {
    type Valid = NewApiKey;

    fn into_valid(self) -> AppResult<Self::Valid> {
        let mut errors = FieldErrors::default();
        let mut permissions = Vec::with_capacity(self.permissions.len());
        for (index, permission) in self.permissions.iter().enumerate() {
            let permission = permission.trim().to_lowercase();
            if !is_permission(&permission) {
                errors.push(
                    format!("permissions[{index}]"),
                    "permission must look like 'resource:action'",
                );
            } else if !permissions.contains(&permission) {
                permissions.push(permission);
            }
        }
        if self.expires_at.is_some_and(|expires_at| expires_at <= Utc::now()) {
            errors.push("expires_at", "expiry must be in the future");
        }
        finish_fields(errors)?;

        Ok(NewApiKey {
            user_id: self.user_id,
            name: trimmed_required("name", self.name)?,
            permissions,
            expires_at: self.expires_at,
        })
    }
}

fn is_permission(value: &str) -> bool {
    let Some((resource, action)) = value.split_once(':') else {
        return false;
    };
    let segment = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|character| character.is_ascii_lowercase() || character == '_')
    };
    segment(resource) && (action == "*" || segment(action))
}

/// Request enabling or disabling an API key.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct SetApiKeyEnabledRequest {
    /// Key identifier.
    pub api_key_id: ApiKeyId,
    /// Desired state.
    pub is_enabled: bool,
}

impl InputSchema for SetApiKeyEnabledRequest {
    type Valid = Self;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(self)
    }
}

fn api_key_not_found(api_key_id: ApiKeyId) -> AppError {
    AppError::NotFound(format!("API key '{api_key_id}' was not found"))
}

/// Super-admin API key management.
#[derive(Clone)]
pub struct ApiKeyService {
    envelope: ActionEnvelope,
    api_keys: Arc<dyn ApiKeyRepository>,
    users: Arc<dyn UserRepository>,
}

impl ApiKeyService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        envelope: ActionEnvelope,
        api_keys: Arc<dyn ApiKeyRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            envelope,
            api_keys,
            users,
        }
    }

    /// Lists keys with masked secrets.
    pub async fn list_api_keys(
        &self,
        credential: Option<&Credential>,
        request: ListApiKeysRequest,
    ) -> ActionOutcome<Vec<ApiKeyView>> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |_, user_id| self.list_api_keys_impl(user_id),
            )
            .await
    }

    /// Issues a key and returns its secret once.
    pub async fn create_api_key(
        &self,
        credential: Option<&Credential>,
        request: CreateApiKeyRequest,
    ) -> ActionOutcome<IssuedApiKey> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |_, new_key| self.create_api_key_impl(new_key),
            )
            .await
    }

    /// Replaces the secret of an existing key and returns the new one once.
    pub async fn regenerate_api_key(
        &self,
        credential: Option<&Credential>,
        request: ApiKeyTarget,
    ) -> ActionOutcome<IssuedApiKey> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |_, api_key_id| self.regenerate_api_key_impl(api_key_id),
            )
            .await
    }

    /// Enables or disables a key.
    pub async fn set_api_key_enabled(
        &self,
        credential: Option<&Credential>,
        request: SetApiKeyEnabledRequest,
    ) -> ActionOutcome<ApiKeyView> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |_, request| self.set_api_key_enabled_impl(request),
            )
            .await
    }

    /// Deletes a key.
    pub async fn delete_api_key(
        &self,
        credential: Option<&Credential>,
        request: ApiKeyTarget,
    ) -> ActionOutcome<ApiKeyId> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |_, api_key_id| self.delete_api_key_impl(api_key_id),
            )
            .await
    }

    async fn find_api_key(&self, api_key_id: ApiKeyId) -> AppResult<ApiKey> {
        self.api_keys
            .find_api_key(api_key_id)
            .await?
            .ok_or_else(|| api_key_not_found(api_key_id))
    }

    async fn list_api_keys_impl(
        &self,
        user_id: Option<UserId>,
    ) -> AppResult<Completed<Vec<ApiKeyView>>> {
        let now = Utc::now();
        let keys = self
            .api_keys
            .list_api_keys(user_id)
            .await?
            .into_iter()
            .map(|api_key| ApiKeyView::from_key(api_key, now))
            .collect();
        Ok(Completed::read(keys))
    }

    async fn create_api_key_impl(&self, new_key: NewApiKey) -> AppResult<Completed<IssuedApiKey>> {
        if self.users.find_user(new_key.user_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "user '{}' was not found",
                new_key.user_id
            )));
        }

        let generated = generate_secret()?;
        let now = Utc::now();
        let api_key = ApiKey {
            api_key_id: ApiKeyId::new(),
            user_id: new_key.user_id,
            name: new_key.name,
            permissions: new_key.permissions,
            display_prefix: generated.display_prefix,
            expires_at: new_key.expires_at,
            is_enabled: true,
            last_used_at: None,
            created_at: now,
        };
        self.api_keys
            .insert_api_key(&api_key, &generated.hash)
            .await?;

        let audit = AuditDraft::new(AuditAction::ApiKeyCreated, "api_key", api_key.api_key_id)
            .with_details(serde_json::json!({
                "name": api_key.name,
                "user_id": api_key.user_id,
                "permissions": api_key.permissions,
            }));
        let issued = IssuedApiKey {
            api_key: ApiKeyView::from_key(api_key, now),
            secret: generated.secret,
        };
        Ok(Completed::changed(issued, audit).invalidating([ViewPath::admin_api_keys()]))
    }

    async fn regenerate_api_key_impl(
        &self,
        api_key_id: ApiKeyId,
    ) -> AppResult<Completed<IssuedApiKey>> {
        let mut api_key = self.find_api_key(api_key_id).await?;
        let generated = generate_secret()?;
        if !self
            .api_keys
            .rotate_api_key_secret(api_key_id, &generated.display_prefix, &generated.hash)
            .await?
        {
            return Err(api_key_not_found(api_key_id));
        }
        api_key.display_prefix = generated.display_prefix;

        let audit = AuditDraft::new(AuditAction::ApiKeyRegenerated, "api_key", api_key_id)
            .with_details(serde_json::json!({ "name": api_key.name }));
        let issued = IssuedApiKey {
            api_key: ApiKeyView::from_key(api_key, Utc::now()),
            secret: generated.secret,
        };
        Ok(Completed::changed(issued, audit).invalidating([ViewPath::admin_api_keys()]))
    }

    async fn set_api_key_enabled_impl(
        &self,
        request: SetApiKeyEnabledRequest,
    ) -> AppResult<Completed<ApiKeyView>> {
        let mut api_key = self.find_api_key(request.api_key_id).await?;
        if api_key.is_enabled == request.is_enabled {
            return Ok(Completed::read(ApiKeyView::from_key(api_key, Utc::now())));
        }

        if !self
            .api_keys
            .set_api_key_enabled(request.api_key_id, request.is_enabled)
            .await?
        {
            return Err(api_key_not_found(request.api_key_id));
        }
        api_key.is_enabled = request.is_enabled;

        let action = if api_key.is_enabled {
            AuditAction::ApiKeyEnabled
        } else {
            AuditAction::ApiKeyDisabled
        };
        let audit = AuditDraft::new(action, "api_key", api_key.api_key_id);
        Ok(
            Completed::changed(ApiKeyView::from_key(api_key, Utc::now()), audit)
                .invalidating([ViewPath::admin_api_keys()]),
        )
    }

    async fn delete_api_key_impl(&self, api_key_id: ApiKeyId) -> AppResult<Completed<ApiKeyId>> {
        let api_key = self.find_api_key(api_key_id).await?;
        if !self.api_keys.delete_api_key(api_key_id).await? {
            return Err(api_key_not_found(api_key_id));
        }

        let audit = AuditDraft::new(AuditAction::ApiKeyDeleted, "api_key", api_key_id)
            .with_details(serde_json::json!({ "name": api_key.name }));
        Ok(Completed::changed(api_key_id, audit).invalidating([ViewPath::admin_api_keys()]))
    }
}
