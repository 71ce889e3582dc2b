//! Core data structures for the interchange engine.
//!
//! Defines the scalar value model, the ordered record container, document
//! formats, import/export options, and the structured outcome types used
//! throughout the library.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

use crate::constants::{DEFAULT_DATE_PATTERN, DEFAULT_DELIMITER, DEFAULT_EXPORT_NAME};

/// A single field value.
///
/// The engine works over a closed union of scalars plus an opaque nested
/// structure; nested values are carried verbatim and only serialized to
/// their structured-text form on export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Date(DateTime<Utc>),
    Text(String),
    Nested(serde_json::Value),
}

impl Value {
    /// True for null values and for text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Borrow the inner text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// An ordered mapping from field name to [`Value`].
///
/// Field order is declaration order and names are unique; inserting an
/// existing name replaces the value in place. Records in one batch need not
/// share identical field sets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, preserving order; replaces the value if the name exists
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Iterate fields in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Iterate field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Rename fields per a source-name to target-name mapping.
    ///
    /// Names absent from the mapping pass through unchanged.
    pub fn rename_fields(&mut self, mapping: &HashMap<String, String>) {
        for (name, _) in &mut self.fields {
            if let Some(target) = mapping.get(name) {
                *name = target.clone();
            }
        }
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

// Records serialize as JSON objects, not as arrays of pairs.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Interchange document formats.
///
/// A closed enumeration so format dispatch is exhaustiveness-checked; the
/// spreadsheet format exists for callers that request it, but this engine
/// has no distinct binary encoding for it (see [`crate::export`] and
/// [`crate::document`] for its fallback/rejection behavior).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Csv,
    Json,
    Xlsx,
}

impl DocumentFormat {
    /// Conventional filename extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Csv => "csv",
            DocumentFormat::Json => "json",
            DocumentFormat::Xlsx => "xlsx",
        }
    }

    /// MIME content type for this format
    pub fn content_type(&self) -> &'static str {
        match self {
            DocumentFormat::Csv => "text/csv",
            DocumentFormat::Json => "application/json",
            DocumentFormat::Xlsx => "application/vnd.ms-excel",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Options controlling an import run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Whether the first row of the source is a header line
    pub has_headers: bool,
    /// Optional source-name to target-name field mapping, applied once to
    /// the header before coercion
    pub field_mapping: Option<HashMap<String, String>>,
    /// Run row-level validation on rows that coerced cleanly
    pub validate: bool,
    /// Skip rows whose every cell is blank without counting them
    pub skip_empty_rows: bool,
    /// Field delimiter for delimited-text sources
    pub delimiter: char,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            has_headers: true,
            field_mapping: None,
            validate: true,
            skip_empty_rows: true,
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

/// Options controlling an export run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Target document format
    pub format: DocumentFormat,
    /// Base filename without extension
    pub file_name: String,
    /// Emit a header line (delimited format only)
    pub include_headers: bool,
    /// Optional field subset; output preserves the subset's declaration
    /// order, not the source record's
    pub fields: Option<Vec<String>>,
    /// Date-rendering pattern with `YYYY`/`MM`/`DD`/`HH`/`mm`/`ss` tokens
    pub date_format: String,
    /// Field delimiter for the delimited format
    pub delimiter: char,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: DocumentFormat::Csv,
            file_name: DEFAULT_EXPORT_NAME.to_string(),
            include_headers: true,
            fields: None,
            date_format: DEFAULT_DATE_PATTERN.to_string(),
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

/// A row-scoped problem found during import.
///
/// Errors exclude the offending row from the accepted records; warnings are
/// advisory and never exclude a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowIssue {
    /// 1-based row index over the whole input (a consumed header line is row 1)
    pub row: usize,
    /// Field the issue applies to, when it is field-scoped
    pub field: Option<String>,
    pub message: String,
}

impl RowIssue {
    /// Create a row-scoped issue with no field attribution
    pub fn for_row(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            field: None,
            message: message.into(),
        }
    }

    /// Create a field-scoped issue
    pub fn for_field(row: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row,
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

/// Aggregated result of an import run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportOutcome {
    /// Accepted records in source order
    pub records: Vec<Record>,
    /// Row-level errors; each excludes its row from `records`
    pub errors: Vec<RowIssue>,
    /// Advisory warnings; rows with warnings are still accepted
    pub warnings: Vec<RowIssue>,
    /// Data rows read from the source (header and skipped empty rows excluded)
    pub total_rows: usize,
    /// Rows accepted with zero errors; always equals `records.len()`
    pub valid_rows: usize,
}

impl ImportOutcome {
    /// Create an empty outcome
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of read rows that were accepted, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_rows == 0 {
            100.0
        } else {
            (self.valid_rows as f64 / self.total_rows as f64) * 100.0
        }
    }

    /// Number of distinct rows with at least one error
    pub fn error_rows(&self) -> usize {
        self.total_rows - self.valid_rows
    }

    /// One-line summary for caller logging
    pub fn summary(&self) -> String {
        format!(
            "Import summary: {} rows read, {} accepted ({:.1}%), {} errors, {} warnings",
            self.total_rows,
            self.valid_rows,
            self.success_rate(),
            self.errors.len(),
            self.warnings.len()
        )
    }
}

/// A rendered export document, ready for a sink
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    /// Rendered document text
    pub content: String,
    /// Suggested filename (base name plus format extension)
    pub filename: String,
    /// MIME content type matching the rendered bytes
    pub content_type: &'static str,
}

impl RenderedDocument {
    /// Rendered content as bytes for byte-oriented sinks
    pub fn bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }
}

/// Summary returned after a successful export
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes_written: usize,
    pub records_exported: usize,
    /// Non-fatal notices, e.g. the spreadsheet-format fallback
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_preserves_insertion_order() {
        let mut record = Record::new();
        record.insert("zebra", Value::Number(1.0));
        record.insert("apple", Value::Number(2.0));
        record.insert("mango", Value::Number(3.0));

        let names: Vec<&str> = record.field_names().collect();
        assert_eq!(names, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_record_insert_replaces_in_place() {
        let mut record = Record::new();
        record.insert("a", Value::Number(1.0));
        record.insert("b", Value::Number(2.0));
        record.insert("a", Value::Text("replaced".to_string()));

        assert_eq!(record.len(), 2);
        assert_eq!(record.get("a"), Some(&Value::Text("replaced".to_string())));
        let names: Vec<&str> = record.field_names().collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_record_rename_fields() {
        let mut record = Record::new();
        record.insert("Full Name", Value::Text("Ada".to_string()));
        record.insert("age", Value::Number(36.0));

        let mapping =
            HashMap::from([("Full Name".to_string(), "name".to_string())]);
        record.rename_fields(&mapping);

        assert!(record.get("name").is_some());
        assert!(record.get("Full Name").is_none());
        assert!(record.get("age").is_some());
    }

    #[test]
    fn test_record_serializes_as_object() {
        let mut record = Record::new();
        record.insert("title", Value::Text("Book".to_string()));
        record.insert("count", Value::Number(3.0));
        record.insert("missing", Value::Null);

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"title":"Book","count":3.0,"missing":null}"#);
    }

    #[test]
    fn test_value_is_blank() {
        assert!(Value::Null.is_blank());
        assert!(Value::Text("   ".to_string()).is_blank());
        assert!(!Value::Text("x".to_string()).is_blank());
        assert!(!Value::Number(0.0).is_blank());
        assert!(!Value::Bool(false).is_blank());
    }

    #[test]
    fn test_format_extensions_and_content_types() {
        assert_eq!(DocumentFormat::Csv.extension(), "csv");
        assert_eq!(DocumentFormat::Json.content_type(), "application/json");
        assert_eq!(DocumentFormat::Xlsx.to_string(), "xlsx");
    }

    #[test]
    fn test_outcome_success_rate() {
        let mut outcome = ImportOutcome::new();
        assert_eq!(outcome.success_rate(), 100.0);

        outcome.total_rows = 4;
        outcome.valid_rows = 3;
        assert_eq!(outcome.success_rate(), 75.0);
        assert_eq!(outcome.error_rows(), 1);
        assert!(outcome.summary().contains("4 rows read"));
    }

    #[test]
    fn test_import_options_defaults() {
        let options = ImportOptions::default();
        assert!(options.has_headers);
        assert!(options.validate);
        assert!(options.skip_empty_rows);
        assert_eq!(options.delimiter, ',');
    }
}
