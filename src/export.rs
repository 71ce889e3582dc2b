//! Export serializer: in-memory records to a rendered interchange document.
//!
//! Applies field projection and value normalization, renders delimited or
//! structured text, and hands the result to a caller-supplied sink. The
//! engine never persists anything itself; the sink owns delivery.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::codec::{encode_value, escape_delimited, format_date};
use crate::error::{DataportError, Result};
use crate::models::{DocumentFormat, ExportOptions, ExportReport, Record, RenderedDocument, Value};

/// A destination for rendered export documents.
///
/// The engine is agnostic to what delivery means: a browser download, a file
/// write, an upload. Failures are propagated verbatim as fatal errors.
#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn deliver(&self, document: &RenderedDocument) -> anyhow::Result<()>;
}

/// Filesystem-backed sink: writes the document into a directory under its
/// suggested filename.
#[derive(Debug, Clone)]
pub struct FileSink {
    directory: PathBuf,
}

impl FileSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

#[async_trait]
impl ExportSink for FileSink {
    async fn deliver(&self, document: &RenderedDocument) -> anyhow::Result<()> {
        let path = self.directory.join(&document.filename);
        tokio::fs::write(&path, document.bytes()).await?;
        Ok(())
    }
}

/// Render records into a document without delivering it.
///
/// Returns the rendered document plus any non-fatal warnings (currently
/// only the spreadsheet-format fallback notice). Exporting zero records is
/// a hard error, as is a projection that selects no fields at all.
pub fn render(records: &[Record], options: &ExportOptions) -> Result<(RenderedDocument, Vec<String>)> {
    if records.is_empty() {
        return Err(DataportError::EmptyExport);
    }

    let mut warnings = Vec::new();
    let effective_format = match options.format {
        DocumentFormat::Xlsx => {
            // No distinct spreadsheet encoding in this engine; degrade to
            // delimited text and tell the caller.
            warn!("xlsx export is not a distinct encoding, falling back to csv");
            warnings.push("xlsx export is not supported, substituting csv output".to_string());
            DocumentFormat::Csv
        }
        format => format,
    };

    let projected: Vec<Record> = records
        .iter()
        .map(|record| project(record, options.fields.as_deref()))
        .collect();
    if projected.iter().all(Record::is_empty) {
        return Err(DataportError::NoFieldsSelected);
    }

    let content = if effective_format == DocumentFormat::Json {
        render_structured(&projected, options)?
    } else {
        render_delimited(&projected, options)
    };

    let document = RenderedDocument {
        content,
        filename: format!("{}.{}", options.file_name, effective_format.extension()),
        content_type: effective_format.content_type(),
    };
    Ok((document, warnings))
}

/// Render records and hand the document to the sink, returning a report
pub async fn export_records(
    records: &[Record],
    options: &ExportOptions,
    sink: &dyn ExportSink,
) -> Result<ExportReport> {
    let (document, warnings) = render(records, options)?;

    sink.deliver(&document)
        .await
        .map_err(DataportError::sink_delivery)?;

    info!(
        filename = %document.filename,
        bytes = document.content.len(),
        records = records.len(),
        "export delivered"
    );
    Ok(ExportReport {
        filename: document.filename,
        content_type: document.content_type,
        bytes_written: document.content.len(),
        records_exported: records.len(),
        warnings,
    })
}

/// Project a record to the selected field subset, in subset order.
///
/// Fields named in the subset but absent from the record are omitted for
/// that record without error.
fn project(record: &Record, fields: Option<&[String]>) -> Record {
    let Some(fields) = fields else {
        return record.clone();
    };
    fields
        .iter()
        .filter_map(|name| {
            record
                .get(name)
                .map(|value| (name.clone(), value.clone()))
        })
        .collect()
}

/// Render the delimited form: optional header from the first record's keys,
/// every value escaped, fields joined by the delimiter, rows by newline.
fn render_delimited(records: &[Record], options: &ExportOptions) -> String {
    let delimiter = options.delimiter;
    let separator = delimiter.to_string();
    let mut lines = Vec::with_capacity(records.len() + 1);

    if options.include_headers {
        let header = records[0]
            .field_names()
            .map(|name| escape_delimited(name, delimiter).into_owned())
            .collect::<Vec<_>>()
            .join(&separator);
        lines.push(header);
    }

    for record in records {
        let line = record
            .iter()
            .map(|(_, value)| {
                let text = encode_value(value, &options.date_format);
                escape_delimited(&text, delimiter).into_owned()
            })
            .collect::<Vec<_>>()
            .join(&separator);
        lines.push(line);
    }

    lines.join("\n")
}

/// Render the structured form: the normalized record list as one indented
/// document.
fn render_structured(records: &[Record], options: &ExportOptions) -> Result<String> {
    let normalized: Vec<serde_json::Value> = records
        .iter()
        .map(|record| {
            let mut object = serde_json::Map::with_capacity(record.len());
            for (name, value) in record.iter() {
                object.insert(name.to_string(), normalize_json(value, &options.date_format));
            }
            serde_json::Value::Object(object)
        })
        .collect();

    serde_json::to_string_pretty(&normalized).map_err(DataportError::malformed_document)
}

/// Normalize one value for structured output: dates become formatted text,
/// nulls empty text, nested structures pass through, scalars keep their type.
fn normalize_json(value: &Value, date_format: &str) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::String(String::new()),
        Value::Bool(flag) => serde_json::Value::Bool(*flag),
        Value::Number(number) => serde_json::Number::from_f64(*number)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(number.to_string())),
        Value::Date(date) => serde_json::Value::String(format_date(date, date_format)),
        Value::Text(text) => serde_json::Value::String(text.clone()),
        Value::Nested(nested) => nested.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(fields: &[(&str, Value)]) -> Record {
        fields
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    fn csv_options() -> ExportOptions {
        ExportOptions::default()
    }

    #[test]
    fn test_csv_export_with_date_pattern() {
        let records = vec![record(&[
            ("title", Value::Text("X".to_string())),
            (
                "due",
                Value::Date(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ),
        ])];
        let options = ExportOptions {
            date_format: "YYYY-MM-DD".to_string(),
            ..csv_options()
        };

        let (document, warnings) = render(&records, &options).unwrap();
        assert_eq!(document.content, "title,due\nX,2024-01-01");
        assert_eq!(document.filename, "export.csv");
        assert_eq!(document.content_type, "text/csv");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_csv_export_escapes_values() {
        let records = vec![record(&[
            ("a", Value::Text("x,y".to_string())),
            ("b", Value::Text("say \"hi\"".to_string())),
        ])];
        let (document, _) = render(&records, &csv_options()).unwrap();
        assert_eq!(document.content, "a,b\n\"x,y\",\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_csv_export_without_headers() {
        let records = vec![record(&[("a", Value::Number(1.0))])];
        let options = ExportOptions {
            include_headers: false,
            ..csv_options()
        };
        let (document, _) = render(&records, &options).unwrap();
        assert_eq!(document.content, "1");
    }

    #[test]
    fn test_field_projection_preserves_subset_order() {
        let records = vec![record(&[
            ("a", Value::Number(1.0)),
            ("b", Value::Number(2.0)),
            ("c", Value::Number(3.0)),
        ])];
        let options = ExportOptions {
            fields: Some(vec!["c".to_string(), "a".to_string()]),
            ..csv_options()
        };
        let (document, _) = render(&records, &options).unwrap();
        assert_eq!(document.content, "c,a\n3,1");
    }

    #[test]
    fn test_projection_omits_absent_fields_silently() {
        let records = vec![
            record(&[("a", Value::Number(1.0)), ("b", Value::Number(2.0))]),
            record(&[("b", Value::Number(9.0))]),
        ];
        let options = ExportOptions {
            fields: Some(vec!["a".to_string(), "b".to_string()]),
            ..csv_options()
        };
        let (document, _) = render(&records, &options).unwrap();
        assert_eq!(document.content, "a,b\n1,2\n9");
    }

    #[test]
    fn test_null_renders_empty_and_nested_renders_structured() {
        let records = vec![record(&[
            ("gap", Value::Null),
            ("meta", Value::Nested(serde_json::json!({"k": 1}))),
        ])];
        let (document, _) = render(&records, &csv_options()).unwrap();
        assert_eq!(document.content, "gap,meta\n,\"{\"\"k\"\":1}\"");
    }

    #[test]
    fn test_json_export_is_indented_and_normalized() {
        let records = vec![record(&[
            ("title", Value::Text("X".to_string())),
            (
                "due",
                Value::Date(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ),
            ("gap", Value::Null),
        ])];
        let options = ExportOptions {
            format: DocumentFormat::Json,
            date_format: "YYYY-MM-DD".to_string(),
            ..csv_options()
        };

        let (document, _) = render(&records, &options).unwrap();
        assert_eq!(document.filename, "export.json");
        assert_eq!(document.content_type, "application/json");
        assert!(document.content.contains('\n'));

        let parsed: serde_json::Value = serde_json::from_str(&document.content).unwrap();
        assert_eq!(parsed[0]["due"], "2024-01-01");
        assert_eq!(parsed[0]["gap"], "");
    }

    #[test]
    fn test_empty_record_list_is_fatal_for_every_format() {
        for format in [DocumentFormat::Csv, DocumentFormat::Json, DocumentFormat::Xlsx] {
            let options = ExportOptions {
                format,
                ..csv_options()
            };
            let err = render(&[], &options).unwrap_err();
            assert_eq!(err.to_string(), "no data to export");
        }
    }

    #[test]
    fn test_projection_selecting_nothing_is_fatal() {
        let records = vec![record(&[("a", Value::Number(1.0))])];
        let options = ExportOptions {
            fields: Some(vec!["missing".to_string()]),
            ..csv_options()
        };
        assert!(matches!(
            render(&records, &options),
            Err(DataportError::NoFieldsSelected)
        ));
    }

    #[test]
    fn test_xlsx_export_falls_back_to_csv_with_warning() {
        let records = vec![record(&[("a", Value::Number(1.0))])];
        let options = ExportOptions {
            format: DocumentFormat::Xlsx,
            ..csv_options()
        };

        let (document, warnings) = render(&records, &options).unwrap();
        assert_eq!(document.filename, "export.csv");
        assert_eq!(document.content_type, "text/csv");
        assert_eq!(document.content, "a\n1");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("substituting csv"));
    }

    #[tokio::test]
    async fn test_export_to_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path());
        let records = vec![record(&[("title", Value::Text("Book".to_string()))])];
        let options = ExportOptions {
            file_name: "catalog".to_string(),
            ..csv_options()
        };

        let report = export_records(&records, &options, &sink).await.unwrap();
        assert_eq!(report.filename, "catalog.csv");
        assert_eq!(report.records_exported, 1);

        let written = std::fs::read_to_string(dir.path().join("catalog.csv")).unwrap();
        assert_eq!(written, "title\nBook");
        assert_eq!(report.bytes_written, written.len());
    }

    #[tokio::test]
    async fn test_sink_failure_is_fatal() {
        struct FailingSink;

        #[async_trait]
        impl ExportSink for FailingSink {
            async fn deliver(&self, _document: &RenderedDocument) -> anyhow::Result<()> {
                anyhow::bail!("sink unavailable")
            }
        }

        let records = vec![record(&[("a", Value::Number(1.0))])];
        let err = export_records(&records, &csv_options(), &FailingSink)
            .await
            .unwrap_err();
        assert!(matches!(err, DataportError::SinkDelivery { .. }));
        assert!(err.to_string().contains("sink unavailable"));
    }
}
