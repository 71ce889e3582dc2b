//! Dataport
//!
//! A bidirectional tabular data interchange engine: serializes in-memory
//! records to delimited or structured text for download, and parses uploaded
//! text back into validated, typed records for bulk ingestion.
//!
//! This library provides tools for:
//! - Quote-aware delimited-text tokenizing and escaping that round-trip
//! - Scalar type inference with a fixed numeric > boolean > date precedence
//! - Import processing with header mapping, per-row error capture, and counts
//! - Name-keyed row validation (required identity fields, email, phone)
//! - Export serialization with field projection and date-pattern rendering
//! - Sequential chunked bulk processing with progress reporting
//!
//! The engine is stateless across invocations and owns no persistence;
//! delivery and ingestion happen through caller-supplied sink, source, and
//! chunk-processor abstractions.

pub mod bulk;
pub mod codec;
pub mod constants;
pub mod document;
pub mod error;
pub mod export;
pub mod import;
pub mod models;
pub mod tokenizer;
pub mod validation;

// Re-export commonly used types
pub use bulk::{BulkValidation, InvalidRecord, process_in_chunks, validate_bulk_data};
pub use document::ParsedDocument;
pub use error::{DataportError, Result};
pub use export::{ExportSink, FileSink, export_records, render};
pub use import::{FileSource, ImportSource, import_from_source, import_grid, import_text};
pub use models::{
    DocumentFormat, ExportOptions, ExportReport, ImportOptions, ImportOutcome, Record,
    RenderedDocument, RowIssue, Value,
};
pub use validation::{RowValidation, validate_record};
