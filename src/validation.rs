//! Row-level validation keyed on field names.
//!
//! A best-effort sanity layer, not schema validation: it knows nothing about
//! record types, only about a small reserved set of identity field names.
//! Callers needing stronger guarantees must validate again downstream.
//!
//! Pure by design: every call returns a fresh error/warning list, so
//! concurrent validation shares no state.

use regex::Regex;
use std::sync::LazyLock;

use crate::codec::encode_value;
use crate::constants::{
    DEFAULT_DATE_PATTERN, EMAIL_FIELD, PHONE_FIELD, PHONE_MAX_LEN, REQUIRED_IDENTITY_FIELDS,
    TEXT_FIELD_WARN_LEN,
};
use crate::models::{Record, Value};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?\d+$").expect("phone pattern is valid"));

/// A field-scoped finding from row validation
#[derive(Debug, Clone, PartialEq)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Validation findings for one record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowValidation {
    /// Findings that invalidate the row
    pub errors: Vec<FieldIssue>,
    /// Advisory findings that do not invalidate the row
    pub warnings: Vec<FieldIssue>,
}

impl RowValidation {
    /// True when no errors were found (warnings do not count)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate one record, returning fresh error and warning lists.
///
/// Checks, keyed purely on field name:
/// - reserved identity fields (`title`, `name`, `email`) must be non-blank
/// - a non-blank `email` must pass a standard syntax check
/// - a non-blank `phone` failing the loose international pattern warns
/// - text longer than 1000 characters warns about truncation
pub fn validate_record(record: &Record) -> RowValidation {
    let mut validation = RowValidation::default();

    for (name, value) in record.iter() {
        if REQUIRED_IDENTITY_FIELDS.contains(&name) && value.is_blank() {
            validation
                .errors
                .push(FieldIssue::new(name, format!("{name} is required")));
            continue;
        }

        if name == EMAIL_FIELD && !value.is_blank() && !is_valid_email(value) {
            validation
                .errors
                .push(FieldIssue::new(name, "Invalid email format"));
        }

        if name == PHONE_FIELD && !value.is_blank() && !is_plausible_phone(value) {
            validation.warnings.push(FieldIssue::new(
                name,
                "Phone number format may be invalid",
            ));
        }

        if let Value::Text(text) = value {
            if text.chars().count() > TEXT_FIELD_WARN_LEN {
                validation.warnings.push(FieldIssue::new(
                    name,
                    "Text field is very long and may be truncated",
                ));
            }
        }
    }

    validation
}

fn is_valid_email(value: &Value) -> bool {
    let text = encode_value(value, DEFAULT_DATE_PATTERN);
    EMAIL_RE.is_match(text.trim())
}

fn is_plausible_phone(value: &Value) -> bool {
    let text = encode_value(value, DEFAULT_DATE_PATTERN);
    let compact: String = text.chars().filter(|ch| !ch.is_whitespace()).collect();
    compact.len() <= PHONE_MAX_LEN && PHONE_RE.is_match(&compact)
}
