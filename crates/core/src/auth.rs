use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::UserId;

/// Identity resolved from a credential by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    user_id: UserId,
    display_name: String,
    email: Option<String>,
}

impl Actor {
    /// Creates an actor from resolved identity data.
    #[must_use]
    pub fn new(user_id: UserId, display_name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            email,
        }
    }

    /// Returns the stable user identifier.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email, if the provider returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

/// Opaque bearer credential presented by a caller.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw bearer token. Blank tokens are treated as absent.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let token = token.trim();
        (!token.is_empty()).then(|| Self(token.to_owned()))
    }

    /// Parses an `Authorization: Bearer <token>` header value.
    #[must_use]
    pub fn from_authorization_header(value: &str) -> Option<Self> {
        let (scheme, token) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }

        Self::bearer(token)
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn token(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the SHA-256 hex digest used to look the token up in storage.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use std::fmt::Write;

        let digest = Sha256::digest(self.0.as_bytes());
        digest
            .iter()
            .fold(String::with_capacity(64), |mut acc, byte| {
                let _ = write!(acc, "{byte:02x}");
                acc
            })
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("Credential(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::Credential;

    #[test]
    fn parses_bearer_header() {
        let credential = Credential::from_authorization_header("Bearer abc123");
        assert_eq!(credential.as_ref().map(Credential::token), Some("abc123"));
    }

    #[test]
    fn rejects_other_schemes_and_blank_tokens() {
        assert!(Credential::from_authorization_header("Basic abc").is_none());
        assert!(Credential::from_authorization_header("Bearer   ").is_none());
        assert!(Credential::bearer("").is_none());
    }

    #[test]
    fn fingerprint_is_stable_sha256() {
        let credential = Credential::bearer("test");
        assert_eq!(
            credential.map(|value| value.fingerprint()).unwrap_or_default(),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn debug_output_hides_token() {
        let credential = Credential::bearer("super-secret");
        assert_eq!(format!("{credential:?}"), "Some(Credential(***))");
    }
}
