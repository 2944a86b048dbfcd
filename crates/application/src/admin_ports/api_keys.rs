use async_trait::async_trait;
use scholaris_core::{AppResult, UserId};
use scholaris_domain::{ApiKey, ApiKeyId};

/// Repository port for API keys. Only secret hashes are stored.
#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    /// Lists keys, optionally for one owner, newest first.
    async fn list_api_keys(&self, user_id: Option<UserId>) -> AppResult<Vec<ApiKey>>;

    /// Finds one key.
    async fn find_api_key(&self, api_key_id: ApiKeyId) -> AppResult<Option<ApiKey>>;

    /// Inserts a key with the SHA-256 hash of its secret.
    async fn insert_api_key(&self, api_key: &ApiKey, secret_hash: &str) -> AppResult<()>;

    /// Replaces the stored secret, returning `false` when the key does not exist.
    async fn rotate_api_key_secret(
        &self,
        api_key_id: ApiKeyId,
        display_prefix: &str,
        secret_hash: &str,
    ) -> AppResult<bool>;

    /// Flips the enabled flag, returning `false` when the key does not exist.
    async fn set_api_key_enabled(&self, api_key_id: ApiKeyId, is_enabled: bool) -> AppResult<bool>;

    /// Deletes a key, returning `false` when it does not exist.
    async fn delete_api_key(&self, api_key_id: ApiKeyId) -> AppResult<bool>;
}
