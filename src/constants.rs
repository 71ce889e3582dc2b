//! Application constants for the interchange engine
//!
//! This module contains the delimiter and date-pattern defaults, the reserved
//! validation field names, and the format limits used throughout the engine.

// =============================================================================
// Delimited Format Defaults
// =============================================================================

/// Default field delimiter for delimited-text documents
pub const DEFAULT_DELIMITER: char = ',';

/// Quote character used for escaping delimited fields
pub const QUOTE_CHAR: char = '"';

/// Prefix for positionally synthesized header names (`column_1`, `column_2`, ...)
pub const SYNTHESIZED_COLUMN_PREFIX: &str = "column_";

/// Default base filename for exports when the caller supplies none
pub const DEFAULT_EXPORT_NAME: &str = "export";

// =============================================================================
// Date Rendering
// =============================================================================

/// Default date-rendering pattern (`YYYY`/`MM`/`DD`/`HH`/`mm`/`ss` tokens)
pub const DEFAULT_DATE_PATTERN: &str = "YYYY-MM-DD HH:mm:ss";

// =============================================================================
// Row-Level Validation
// =============================================================================

/// Field names treated as mandatory identity attributes: a blank or null
/// value in any of these invalidates the row.
pub const REQUIRED_IDENTITY_FIELDS: &[&str] = &["title", "name", "email"];

/// Field name subject to email syntax checking
pub const EMAIL_FIELD: &str = "email";

/// Field name subject to the loose international phone check
pub const PHONE_FIELD: &str = "phone";

/// Maximum phone length (optional `+` plus digits) after whitespace removal
pub const PHONE_MAX_LEN: usize = 16;

/// Text fields longer than this raise a truncation warning
pub const TEXT_FIELD_WARN_LEN: usize = 1000;
