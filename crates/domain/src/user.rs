//! User account types.

use chrono::{DateTime, Utc};
use scholaris_core::{AppError, AppResult, UserId};
use serde::{Deserialize, Serialize};

use crate::RoleAssignment;

/// Longest address accepted by mail transports.
const EMAIL_MAX_LENGTH: usize = 254;

/// Normalized (trimmed, lowercased) email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Structural check only: one `@`, non-empty local part, dotted domain.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let normalized = value.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = normalized.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain '@'".to_owned(),
            ));
        };

        if local.is_empty() || domain.contains('@') {
            return Err(AppError::Validation(
                "email address must have one '@' and a local part".to_owned(),
            ));
        }

        if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one inner '.'".to_owned(),
            ));
        }

        if normalized.len() > EMAIL_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "email address must not exceed {EMAIL_MAX_LENGTH} characters"
            )));
        }

        Ok(Self(normalized))
    }

    /// Returns the normalized address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Registered user with their role assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// User identifier.
    pub user_id: UserId,
    /// Display name.
    pub display_name: String,
    /// Login email.
    pub email: EmailAddress,
    /// Disabled users cannot act in any scope.
    pub is_active: bool,
    /// Role assignments across scopes.
    pub roles: Vec<RoleAssignment>,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::EmailAddress;

    #[test]
    fn email_is_normalized() {
        let email = EmailAddress::new("  Editor@Journal.ORG ");
        assert_eq!(
            email.map(String::from).unwrap_or_default(),
            "editor@journal.org"
        );
    }

    #[test]
    fn malformed_emails_are_rejected() {
        assert!(EmailAddress::new("").is_err());
        assert!(EmailAddress::new("editor").is_err());
        assert!(EmailAddress::new("@journal.org").is_err());
        assert!(EmailAddress::new("a@b@journal.org").is_err());
        assert!(EmailAddress::new("editor@localhost").is_err());
    }
}
