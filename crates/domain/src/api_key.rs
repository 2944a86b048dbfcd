use chrono::{DateTime, Utc};
use scholaris_core::{AppError, AppResult, UserId};
use serde::{Deserialize, Serialize};

record_identifier!(
    /// API key identifier.
    ApiKeyId
);

/// Fixed textual prefix of every generated secret.
pub const API_KEY_PREFIX: &str = "sk_live_";

/// Number of hex characters after the prefix.
pub const API_KEY_SECRET_HEX_LENGTH: usize = 64;

/// Number of hex characters kept for display.
pub const API_KEY_DISPLAY_FRAGMENT_LENGTH: usize = 8;

/// Derives the persisted display prefix (`sk_live_` plus eight hex characters).
pub fn display_prefix_for_secret(secret: &str) -> AppResult<String> {
    let Some(random_part) = secret.strip_prefix(API_KEY_PREFIX) else {
        return Err(AppError::Validation(format!(
            "API key secret must start with '{API_KEY_PREFIX}'"
        )));
    };

    if random_part.len() != API_KEY_SECRET_HEX_LENGTH
        || !random_part.bytes().all(|byte| byte.is_ascii_hexdigit())
    {
        return Err(AppError::Validation(format!(
            "API key secret must carry {API_KEY_SECRET_HEX_LENGTH} hex characters"
        )));
    }

    Ok(format!(
        "{API_KEY_PREFIX}{}",
        &random_part[..API_KEY_DISPLAY_FRAGMENT_LENGTH]
    ))
}

/// Stored API key. The secret itself is never kept, only its hash and display prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    /// Key identifier.
    pub api_key_id: ApiKeyId,
    /// Owning user.
    pub user_id: UserId,
    /// Human label.
    pub name: String,
    /// Granted permission names.
    pub permissions: Vec<String>,
    /// `sk_live_` plus the first eight hex characters of the secret.
    pub display_prefix: String,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Disabled keys are rejected at use time.
    pub is_enabled: bool,
    /// Last successful use.
    pub last_used_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ApiKey {
    /// Masked representation shown in listings, e.g. `sk_live_abcd1234…`.
    #[must_use]
    pub fn masked(&self) -> String {
        format!("{}…", self.display_prefix)
    }

    /// Returns whether the key is past its expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use proptest::prelude::*;
    use scholaris_core::UserId;

    use super::{API_KEY_PREFIX, ApiKey, ApiKeyId, display_prefix_for_secret};

    fn key_with_prefix(display_prefix: String) -> ApiKey {
        ApiKey {
            api_key_id: ApiKeyId::new(),
            user_id: UserId::new(),
            name: "ingest".to_owned(),
            permissions: vec!["submissions:read".to_owned()],
            display_prefix,
            expires_at: None,
            is_enabled: true,
            last_used_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn display_prefix_keeps_eight_characters() {
        let secret = format!("{API_KEY_PREFIX}{}", "abcd1234".repeat(8));
        assert_eq!(
            display_prefix_for_secret(&secret).ok().as_deref(),
            Some("sk_live_abcd1234")
        );
    }

    #[test]
    fn foreign_secrets_are_rejected() {
        assert!(display_prefix_for_secret("pk_test_abcd").is_err());
        assert!(display_prefix_for_secret("sk_live_zz").is_err());
    }

    #[test]
    fn expiry_is_inclusive() {
        let now = Utc::now();
        let mut key = key_with_prefix("sk_live_00000000".to_owned());
        assert!(!key.is_expired(now));
        key.expires_at = Some(now);
        assert!(key.is_expired(now));
        key.expires_at = Some(now + Duration::hours(1));
        assert!(!key.is_expired(now));
    }

    proptest! {
        #[test]
        fn masked_form_never_contains_secret(random_part in "[0-9a-f]{64}") {
            let secret = format!("{API_KEY_PREFIX}{random_part}");
            let prefix = display_prefix_for_secret(&secret);
            prop_assert!(prefix.is_ok());

            let key = key_with_prefix(prefix.unwrap_or_default());
            let masked = key.masked();
            prop_assert!(!masked.contains(&secret));
            prop_assert!(!masked.contains(&random_part));
            prop_assert!(masked.starts_with(API_KEY_PREFIX));
            prop_assert!(masked.ends_with('…'));
        }
    }
}
