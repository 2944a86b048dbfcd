//! Declarative input validation.
//!
//! Request structs derive [`validator::Validate`] for field rules and implement
//! [`InputSchema`] to turn the raw request into a trimmed, typed value.

use scholaris_core::{AppError, AppResult, FieldErrors};
use serde::Deserialize;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Default page size for listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: u32 = 200;

/// Raw request that can be validated into a typed value.
pub trait InputSchema: Validate {
    /// Sanitized value handed to the operation.
    type Valid: Send;

    /// Converts the already rule-checked request into its typed form.
    fn into_valid(self) -> AppResult<Self::Valid>;
}

/// Runs field rules then the typed conversion, in a single pass.
pub fn validate_input<S: InputSchema>(input: S) -> AppResult<S::Valid> {
    input
        .validate()
        .map_err(|errors| AppError::InvalidInput(field_errors_from(&errors)))?;
    input.into_valid()
}

/// Flattens nested `validator` errors into `field.path -> messages`.
#[must_use]
pub fn field_errors_from(errors: &ValidationErrors) -> FieldErrors {
    let mut collected = FieldErrors::default();
    collect_into(&mut collected, None, errors);
    collected
}

fn collect_into(collected: &mut FieldErrors, prefix: Option<&str>, errors: &ValidationErrors) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{field}"),
            None => field.to_string(),
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| format!("{path} is invalid ({})", error.code));
                    collected.push(path.clone(), message);
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_into(collected, Some(path.as_str()), nested);
            }
            ValidationErrorsKind::List(entries) => {
                for (index, nested) in entries {
                    let indexed = format!("{path}[{index}]");
                    collect_into(collected, Some(indexed.as_str()), nested);
                }
            }
        }
    }
}

/// Trims an optional text field, mapping blank values to `None`.
#[must_use]
pub(crate) fn trimmed_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Requires a text field to be non-blank after trimming.
pub(crate) fn trimmed_required(field: &str, value: String) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        let mut errors = FieldErrors::default();
        errors.push(field, format!("{field} must not be blank"));
        return Err(AppError::InvalidInput(errors));
    }

    Ok(trimmed.to_owned())
}

/// Records a failed domain rule under `field`.
pub(crate) fn check_field(errors: &mut FieldErrors, field: &str, result: AppResult<()>) {
    match result {
        Ok(()) => {}
        Err(AppError::Validation(message)) => errors.push(field, message),
        Err(other) => errors.push(field, other.to_string()),
    }
}

/// Fails with the collected field errors, if any.
pub(crate) fn finish_fields(errors: FieldErrors) -> AppResult<()> {
    errors.into_result().map_err(AppError::InvalidInput)
}

/// Operation without caller-supplied input.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct NoInput {}

impl Validate for NoInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

impl InputSchema for NoInput {
    type Valid = ();

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(())
    }
}

/// Limit/offset pagination.
#[derive(Debug, Clone, Copy, Default, Deserialize, Validate)]
pub struct PageRequest {
    /// Maximum rows returned.
    #[validate(range(min = 1, max = 200, message = "limit must be between 1 and 200"))]
    pub limit: Option<u32>,
    /// Rows skipped.
    pub offset: Option<u32>,
}

/// Validated pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    /// Maximum rows returned.
    pub limit: u32,
    /// Rows skipped.
    pub offset: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

impl PageQuery {
    /// Applies defaults and the upper bound to raw pagination values.
    #[must_use]
    pub fn from_parts(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

impl From<PageRequest> for PageQuery {
    fn from(value: PageRequest) -> Self {
        Self::from_parts(value.limit, value.offset)
    }
}

impl InputSchema for PageRequest {
    type Valid = PageQuery;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(self.into())
    }
}

#[cfg(test)]
mod tests {
    use scholaris_core::AppError;
    use serde::Deserialize;
    use validator::Validate;

    use super::{InputSchema, PageQuery, PageRequest, trimmed_optional, validate_input};

    #[derive(Debug, Deserialize, Validate)]
    struct Line {
        #[validate(range(min = 0, message = "sequence must not be negative"))]
        sequence: i32,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Batch {
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
        #[validate(nested)]
        lines: Vec<Line>,
    }

    impl InputSchema for Batch {
        type Valid = String;

        fn into_valid(self) -> scholaris_core::AppResult<Self::Valid> {
            Ok(self.name.trim().to_owned())
        }
    }

    #[test]
    fn nested_errors_use_indexed_paths() {
        let batch = Batch {
            name: String::new(),
            lines: vec![Line { sequence: 1 }, Line { sequence: -4 }],
        };

        let result = validate_input(batch);
        let Err(AppError::InvalidInput(errors)) = result else {
            panic!("expected field errors");
        };
        assert_eq!(errors.messages("name"), ["name is required".to_owned()]);
        assert_eq!(
            errors.messages("lines[1].sequence"),
            ["sequence must not be negative".to_owned()]
        );
    }

    #[test]
    fn valid_input_is_sanitized_into_new_value() {
        let batch = Batch {
            name: "  primary ".to_owned(),
            lines: Vec::new(),
        };
        assert_eq!(validate_input(batch).ok().as_deref(), Some("primary"));
    }

    #[test]
    fn page_defaults_apply() {
        let page = validate_input(PageRequest::default()).ok();
        assert_eq!(page, Some(PageQuery::default()));

        let too_large = PageRequest {
            limit: Some(500),
            offset: None,
        };
        assert!(too_large.into_valid().is_ok());
        assert!(validate_input(too_large).is_err());
    }

    #[test]
    fn blank_optional_text_becomes_none() {
        assert_eq!(trimmed_optional(Some("   ".to_owned())), None);
        assert_eq!(
            trimmed_optional(Some(" ISSN ".to_owned())).as_deref(),
            Some("ISSN")
        );
    }
}
