//! Import processor: raw documents to validated, typed records.
//!
//! Consumes the grid or record sequence produced by [`crate::document`],
//! applies header and field-name mapping, per-cell type coercion, and
//! optional row-level validation, and aggregates everything into an
//! [`ImportOutcome`]. Row failures never abort the batch; each row stands or
//! falls on its own.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::codec::infer_type;
use crate::constants::SYNTHESIZED_COLUMN_PREFIX;
use crate::document::{ParsedDocument, read_document};
use crate::error::{DataportError, Result};
use crate::models::{DocumentFormat, ImportOptions, ImportOutcome, Record, RowIssue};
use crate::validation::validate_record;

/// Import a whole source text in the declared format
pub fn import_text(
    text: &str,
    format: DocumentFormat,
    options: &ImportOptions,
) -> Result<ImportOutcome> {
    match read_document(text, format, options.delimiter)? {
        ParsedDocument::Grid(grid) => Ok(import_grid(grid, options)),
        ParsedDocument::Records(records) => Ok(import_records(records, options)),
    }
}

/// Import a raw delimited grid.
///
/// Row indices are 1-based over the whole input, so with a header line the
/// first data row is row 2. Coercion failures record an error for that
/// row/field and processing continues; rows with zero errors are accepted.
pub fn import_grid(grid: Vec<Vec<String>>, options: &ImportOptions) -> ImportOutcome {
    let mut outcome = ImportOutcome::new();
    if grid.is_empty() {
        return outcome;
    }

    let (header, data_rows, first_row_index) = if options.has_headers {
        (grid[0].clone(), &grid[1..], 2)
    } else {
        let width = grid.iter().map(Vec::len).max().unwrap_or(0);
        let synthesized = (1..=width)
            .map(|position| format!("{SYNTHESIZED_COLUMN_PREFIX}{position}"))
            .collect();
        (synthesized, &grid[..], 1)
    };
    let header = map_header(header, options.field_mapping.as_ref());

    for (position, row) in data_rows.iter().enumerate() {
        let row_index = first_row_index + position;

        if options.skip_empty_rows && row.iter().all(|cell| cell.trim().is_empty()) {
            debug!(row = row_index, "skipping empty row");
            continue;
        }
        outcome.total_rows += 1;

        let mut record = Record::new();
        let mut row_errors = Vec::new();
        for (column, name) in header.iter().enumerate() {
            let raw = row.get(column).map(String::as_str).unwrap_or("");
            match infer_type(raw) {
                Ok(value) => record.insert(name.clone(), value),
                Err(err) => {
                    row_errors.push(RowIssue::for_field(row_index, name, err.to_string()));
                }
            }
        }

        finish_row(&mut outcome, record, row_errors, row_index, options);
    }

    info!(
        total = outcome.total_rows,
        valid = outcome.valid_rows,
        errors = outcome.errors.len(),
        warnings = outcome.warnings.len(),
        "delimited import complete"
    );
    outcome
}

/// Import pre-decoded records from a structured document.
///
/// No tokenization or type inference happens here; the decoder's types are
/// kept and only field mapping and optional validation apply.
pub fn import_records(records: Vec<Record>, options: &ImportOptions) -> ImportOutcome {
    let mut outcome = ImportOutcome::new();

    for (position, mut record) in records.into_iter().enumerate() {
        let row_index = position + 1;
        outcome.total_rows += 1;

        if let Some(mapping) = options.field_mapping.as_ref() {
            record.rename_fields(mapping);
        }

        finish_row(&mut outcome, record, Vec::new(), row_index, options);
    }

    info!(
        total = outcome.total_rows,
        valid = outcome.valid_rows,
        errors = outcome.errors.len(),
        "structured import complete"
    );
    outcome
}

/// Apply the field mapping once to header names; unmapped names pass through
fn map_header(header: Vec<String>, mapping: Option<&HashMap<String, String>>) -> Vec<String> {
    let Some(mapping) = mapping else {
        return header;
    };
    header
        .into_iter()
        .map(|name| mapping.get(&name).cloned().unwrap_or(name))
        .collect()
}

/// Run validation when requested, then file the row as accepted or errored
fn finish_row(
    outcome: &mut ImportOutcome,
    record: Record,
    mut row_errors: Vec<RowIssue>,
    row_index: usize,
    options: &ImportOptions,
) {
    if options.validate && row_errors.is_empty() {
        let validation = validate_record(&record);
        row_errors.extend(
            validation
                .errors
                .into_iter()
                .map(|issue| RowIssue::for_field(row_index, issue.field, issue.message)),
        );
        outcome.warnings.extend(
            validation
                .warnings
                .into_iter()
                .map(|issue| RowIssue::for_field(row_index, issue.field, issue.message)),
        );
    }

    if row_errors.is_empty() {
        outcome.records.push(record);
        outcome.valid_rows += 1;
    } else {
        outcome.errors.append(&mut row_errors);
    }
}

/// A readable source of document text (file, blob, upload buffer).
///
/// The engine reads the full text in one suspension point; it does not
/// stream line by line.
#[async_trait]
pub trait ImportSource: Send + Sync {
    async fn read_text(&self) -> anyhow::Result<String>;
}

/// Filesystem-backed import source
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ImportSource for FileSource {
    async fn read_text(&self) -> anyhow::Result<String> {
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }
}

/// Read a source's full text, then import it in the declared format
pub async fn import_from_source(
    source: &dyn ImportSource,
    format: DocumentFormat,
    options: &ImportOptions,
) -> Result<ImportOutcome> {
    let text = source
        .read_text()
        .await
        .map_err(DataportError::source_read)?;
    import_text(&text, format, options)
}
