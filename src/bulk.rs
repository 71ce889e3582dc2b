//! Bulk operations: chunked batch processing and pre-flight validation.
//!
//! Chunk processing is intentionally serialized so progress reporting stays
//! monotonic and a downstream store is never hit by concurrent batches.
//! Pre-flight validation runs over a whole record set before any
//! side-effecting operation starts.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use tracing::{debug, info};

use crate::codec::encode_value;
use crate::constants::DEFAULT_DATE_PATTERN;
use crate::error::{DataportError, Result};
use crate::models::{Record, Value};

/// Process records in contiguous chunks, strictly in order.
///
/// `processor` is awaited once per chunk; chunk n+1 does not start until
/// chunk n resolves. `on_progress(processed, total)` fires after each chunk
/// completes, so it is called exactly ceil(N / chunk_size) times and the
/// final call reports `total`. A failed chunk halts processing and
/// propagates the failure; there is no built-in retry.
pub async fn process_in_chunks<T, R, F, Fut>(
    records: Vec<T>,
    chunk_size: usize,
    mut processor: F,
    mut on_progress: impl FnMut(usize, usize),
) -> Result<Vec<R>>
where
    F: FnMut(Vec<T>) -> Fut,
    Fut: Future<Output = anyhow::Result<Vec<R>>>,
{
    if chunk_size == 0 {
        return Err(DataportError::InvalidChunkSize);
    }

    let total = records.len();
    let mut results = Vec::with_capacity(total);
    let mut processed = 0;
    let mut chunk_index = 0;
    let mut remaining = records.into_iter();

    loop {
        let chunk: Vec<T> = remaining.by_ref().take(chunk_size).collect();
        if chunk.is_empty() {
            break;
        }
        let chunk_len = chunk.len();
        debug!(chunk = chunk_index, size = chunk_len, "processing chunk");

        let mut chunk_results = processor(chunk)
            .await
            .map_err(|source| DataportError::chunk_failed(chunk_index, source))?;
        results.append(&mut chunk_results);

        processed += chunk_len;
        on_progress(processed, total);
        chunk_index += 1;
    }

    info!(records = total, chunks = chunk_index, "chunked processing complete");
    Ok(results)
}

/// A record rejected by pre-flight validation
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidRecord {
    /// 1-based position in the input record set
    pub row: usize,
    pub record: Record,
    pub errors: Vec<String>,
}

/// Partition of a record set into valid records and rejected entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkValidation {
    pub valid: Vec<Record>,
    pub invalid: Vec<InvalidRecord>,
}

/// Validate a whole record set before a side-effecting bulk operation.
///
/// One pass: every absent or blank required field yields a missing-field
/// error; every unique-field value already seen earlier in the same pass
/// yields a duplicate error (the first occurrence is never flagged).
/// Uniqueness tracking is scoped to this call.
pub fn validate_bulk_data(
    records: Vec<Record>,
    required_fields: &[&str],
    unique_fields: &[&str],
) -> BulkValidation {
    let mut seen: HashMap<&str, HashSet<String>> = unique_fields
        .iter()
        .map(|field| (*field, HashSet::new()))
        .collect();
    let mut validation = BulkValidation::default();

    for (position, record) in records.into_iter().enumerate() {
        let mut errors = Vec::new();

        for field in required_fields {
            let blank = record.get(field).map(Value::is_blank).unwrap_or(true);
            if blank {
                errors.push(format!("{field} is required"));
            }
        }

        for field in unique_fields {
            let Some(value) = record.get(field) else {
                continue;
            };
            if value.is_blank() {
                continue;
            }
            // Compare on canonical encoded text so 1 and "1" collide.
            let key = encode_value(value, DEFAULT_DATE_PATTERN);
            let values = seen.get_mut(*field).expect("unique field set exists");
            if !values.insert(key) {
                errors.push(format!("Duplicate value for {field}"));
            }
        }

        if errors.is_empty() {
            validation.valid.push(record);
        } else {
            validation.invalid.push(InvalidRecord {
                row: position + 1,
                record,
                errors,
            });
        }
    }

    validation
}
