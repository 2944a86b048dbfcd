use chrono::{DateTime, Utc};
use scholaris_core::{AppError, AppResult, JournalId, TenantId};
use serde::{Deserialize, Serialize};

/// Maximum length of a journal URL path segment.
const JOURNAL_PATH_MAX_LENGTH: usize = 64;

/// Editorial contact published for a journal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalContact {
    /// Contact person name.
    pub name: Option<String>,
    /// Contact email address.
    pub email: Option<String>,
}

/// Journal hosted by a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    /// Journal identifier.
    pub journal_id: JournalId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Unique URL path segment.
    pub path: String,
    /// Display title.
    pub title: String,
    /// Optional description shown on the journal home page.
    pub description: Option<String>,
    /// Electronic ISSN.
    pub online_issn: Option<String>,
    /// Print ISSN.
    pub print_issn: Option<String>,
    /// Editorial contact.
    pub contact: JournalContact,
    /// Inactive journals are hidden from public listings.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validates a journal URL path: lowercase ASCII letters, digits and hyphens.
pub fn validate_journal_path(path: &str) -> AppResult<()> {
    if path.is_empty() || path.len() > JOURNAL_PATH_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "journal path must be 1 to {JOURNAL_PATH_MAX_LENGTH} characters"
        )));
    }

    let valid_characters = path
        .chars()
        .all(|character| character.is_ascii_lowercase() || character.is_ascii_digit() || character == '-');
    if !valid_characters || path.starts_with('-') || path.ends_with('-') {
        return Err(AppError::Validation(
            "journal path may only contain lowercase letters, digits and inner hyphens".to_owned(),
        ));
    }

    Ok(())
}

/// Validates an ISSN in `NNNN-NNNC` form, including its mod-11 check digit.
pub fn validate_issn(value: &str) -> AppResult<()> {
    let bytes = value.as_bytes();
    if bytes.len() != 9 || bytes[4] != b'-' {
        return Err(AppError::Validation(format!(
            "ISSN '{value}' must use the form 1234-567X"
        )));
    }

    let digits: Vec<u8> = bytes
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != 4)
        .map(|(_, byte)| *byte)
        .collect();

    let mut sum = 0u32;
    for (position, byte) in digits.iter().take(7).enumerate() {
        if !byte.is_ascii_digit() {
            return Err(AppError::Validation(format!(
                "ISSN '{value}' must contain digits before the check character"
            )));
        }
        let weight = 8 - position as u32;
        sum += u32::from(byte - b'0') * weight;
    }

    let expected = match (11 - sum % 11) % 11 {
        10 => b'X',
        digit => b'0' + digit as u8,
    };
    if digits[7].to_ascii_uppercase() != expected {
        return Err(AppError::Validation(format!(
            "ISSN '{value}' has an invalid check digit"
        )));
    }

    Ok(())
}
