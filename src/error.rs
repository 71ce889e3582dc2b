//! Error handling for tabular interchange operations.
//!
//! Provides error types with context for document parsing, value coercion,
//! export preconditions, and bulk processing failures.

use crate::models::DocumentFormat;
use thiserror::Error;

/// Errors raised by the interchange engine.
///
/// Fatal variants abort the whole call (format and precondition errors).
/// Row-granular problems never surface here; they are reported through
/// [`crate::models::ImportOutcome`] so one bad row cannot sink a batch.
#[derive(Error, Debug)]
pub enum DataportError {
    #[error("{format} import is not supported, use delimited or structured text")]
    UnsupportedImportFormat { format: DocumentFormat },

    #[error("malformed structured document: {source}")]
    MalformedDocument {
        #[source]
        source: serde_json::Error,
    },

    #[error("document root is not a sequence of records")]
    DocumentRoot,

    #[error("Invalid value: {value}")]
    InvalidValue { value: String },

    #[error("no data to export")]
    EmptyExport,

    #[error("no fields selected for export")]
    NoFieldsSelected,

    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    // anyhow::Error cannot be a #[source] (it does not itself implement
    // std::error::Error), so the caller-supplied chain is folded into the
    // message for these boundary failures.
    #[error("chunk {index} failed: {source}")]
    ChunkFailed { index: usize, source: anyhow::Error },

    #[error("sink delivery failed: {source}")]
    SinkDelivery { source: anyhow::Error },

    #[error("source read failed: {source}")]
    SourceRead { source: anyhow::Error },
}

impl DataportError {
    /// Create an unsupported-import-format error
    pub fn unsupported_import(format: DocumentFormat) -> Self {
        Self::UnsupportedImportFormat { format }
    }

    /// Create a malformed structured document error
    pub fn malformed_document(source: serde_json::Error) -> Self {
        Self::MalformedDocument { source }
    }

    /// Create a value coercion error for a raw cell
    pub fn invalid_value(value: impl Into<String>) -> Self {
        Self::InvalidValue {
            value: value.into(),
        }
    }

    /// Create a chunk processing error
    pub fn chunk_failed(index: usize, source: anyhow::Error) -> Self {
        Self::ChunkFailed { index, source }
    }

    /// Create a sink delivery error
    pub fn sink_delivery(source: anyhow::Error) -> Self {
        Self::SinkDelivery { source }
    }

    /// Create a source read error
    pub fn source_read(source: anyhow::Error) -> Self {
        Self::SourceRead { source }
    }
}

pub type Result<T> = std::result::Result<T, DataportError>;
