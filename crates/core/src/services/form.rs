//! Form submission results.
//!
//! Page handlers re-render a form with its errors instead of failing the
//! request, so services report invalid input as data rather than as
//! [`AppError`](yatube_common::AppError).

use std::collections::BTreeMap;

use serde::Serialize;
use validator::{ValidationError, ValidationErrors};

/// Message for a required field left empty.
pub const REQUIRED: &str = "This field is required.";

/// Rejects values that are empty after trimming whitespace.
pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("required").with_message(REQUIRED.into()))
    } else {
        Ok(())
    }
}

/// Error messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }
}

impl From<&ValidationErrors> for FieldErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut out = Self::new();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                let message = err
                    .message
                    .as_ref()
                    .map_or_else(|| err.code.to_string(), ToString::to_string);
                out.add(&field, message);
            }
        }
        out
    }
}

/// Result of submitting a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome<T> {
    /// The input was valid and has been persisted.
    Saved(T),
    /// Nothing was persisted.
    Invalid(FieldErrors),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Signup {
        #[validate(length(min = 3, message = "Too short"))]
        name: String,
    }

    #[test]
    fn test_from_validation_errors_keeps_message() {
        let errors = Signup {
            name: "ab".to_string(),
        }
        .validate()
        .unwrap_err();

        let fields = FieldErrors::from(&errors);
        assert_eq!(fields.get("name"), ["Too short".to_string()]);
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("text").is_ok());
        assert!(validate_not_blank("  \n\t ").is_err());
        assert!(validate_not_blank("").is_err());
    }

    #[test]
    fn test_get_missing_field_is_empty() {
        let mut errors = FieldErrors::new();
        assert!(errors.is_empty());

        errors.add("text", "required");
        assert!(!errors.is_empty());
        assert!(errors.get("group").is_empty());
    }

    #[test]
    fn test_serializes_as_map() {
        let mut errors = FieldErrors::new();
        errors.add("text", "required");
        errors.add("text", "too long");

        let json = serde_json::to_string(&errors).unwrap();
        assert_eq!(json, r#"{"text":["required","too long"]}"#);
    }
}
