//! Document parser: whole-text decoding into a raw grid or record sequence.
//!
//! Delimited text becomes a rectangular grid of raw field strings; a
//! structured document decodes directly to typed records. Spreadsheet input
//! is rejected up front rather than partially parsed.

use tracing::debug;

use crate::error::{DataportError, Result};
use crate::models::{DocumentFormat, Record, Value};
use crate::tokenizer::tokenize_row;

/// A decoded source document, before import processing
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedDocument {
    /// Raw field grid from delimited text (one inner vec per non-empty line)
    Grid(Vec<Vec<String>>),
    /// Typed records from a structured document
    Records(Vec<Record>),
}

/// Decode a source document according to its declared format.
///
/// Spreadsheet input fails fast with an explicit unsupported-format error.
pub fn read_document(
    text: &str,
    format: DocumentFormat,
    delimiter: char,
) -> Result<ParsedDocument> {
    match format {
        DocumentFormat::Csv => Ok(ParsedDocument::Grid(parse_delimited(text, delimiter))),
        DocumentFormat::Json => Ok(ParsedDocument::Records(parse_structured(text)?)),
        DocumentFormat::Xlsx => Err(DataportError::unsupported_import(format)),
    }
}

/// Parse delimited text into a grid of raw fields, skipping blank lines
pub fn parse_delimited(text: &str, delimiter: char) -> Vec<Vec<String>> {
    let grid: Vec<Vec<String>> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| tokenize_row(line, delimiter))
        .collect();
    debug!(rows = grid.len(), "parsed delimited document");
    grid
}

/// Parse a structured document into typed records.
///
/// The root must decode to a sequence of mapping-typed entries; anything
/// else is a fatal format error.
pub fn parse_structured(text: &str) -> Result<Vec<Record>> {
    let root: serde_json::Value =
        serde_json::from_str(text).map_err(DataportError::malformed_document)?;

    let serde_json::Value::Array(entries) = root else {
        return Err(DataportError::DocumentRoot);
    };

    let records = entries
        .into_iter()
        .map(|entry| match entry {
            serde_json::Value::Object(object) => Ok(object
                .into_iter()
                .map(|(name, value)| (name, value_from_json(value)))
                .collect()),
            _ => Err(DataportError::DocumentRoot),
        })
        .collect::<Result<Vec<Record>>>()?;

    debug!(records = records.len(), "parsed structured document");
    Ok(records)
}

/// Map a decoded JSON value into the engine's value model.
///
/// Arrays and objects stay opaque nested structures; no string re-inference
/// happens on this path, the decoder's types are authoritative.
pub fn value_from_json(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(flag) => Value::Bool(flag),
        serde_json::Value::Number(number) => Value::Number(number.as_f64().unwrap_or_default()),
        serde_json::Value::String(text) => Value::Text(text),
        nested => Value::Nested(nested),
    }
}
