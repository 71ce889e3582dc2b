//! Field codec: scalar encoding, delimiter escaping, and type inference.
//!
//! Encoding renders a [`Value`] to its delimited-text form; inference maps
//! raw text back to a typed value. Inference precedence is load-bearing and
//! must stay numeric, then boolean, then date, then trimmed-string fallback
//! (`"2024"` is a number, never a date).

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

use crate::constants::QUOTE_CHAR;
use crate::error::{DataportError, Result};
use crate::models::Value;

static NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("numeric pattern is valid"));

static DATE_SHAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date shape pattern is valid"));

/// Encode a value to its delimited-text form.
///
/// Nulls render empty, dates through the supplied pattern, nested structures
/// as compact structured text, and remaining scalars in their natural form.
pub fn encode_value(value: &Value, date_pattern: &str) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => format_number(*number),
        Value::Date(date) => format_date(date, date_pattern),
        Value::Text(text) => text.clone(),
        Value::Nested(nested) => nested.to_string(),
    }
}

/// Render a number without a spurious trailing `.0` for integral values
pub fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

/// Render a date by substituting `YYYY`/`MM`/`DD`/`HH`/`mm`/`ss` tokens,
/// zero-padded.
pub fn format_date(date: &DateTime<Utc>, pattern: &str) -> String {
    pattern
        .replace("YYYY", &format!("{:04}", date.year()))
        .replace("MM", &format!("{:02}", date.month()))
        .replace("DD", &format!("{:02}", date.day()))
        .replace("HH", &format!("{:02}", date.hour()))
        .replace("mm", &format!("{:02}", date.minute()))
        .replace("ss", &format!("{:02}", date.second()))
}

/// Escape one field for delimited output.
///
/// Fields containing the delimiter, a quote, or a newline are wrapped in
/// quotes with internal quotes doubled; anything else passes through
/// unchanged. Exact inverse of [`crate::tokenizer::tokenize_row`]'s
/// unescaping.
pub fn escape_delimited(text: &str, delimiter: char) -> Cow<'_, str> {
    if !text.contains(delimiter) && !text.contains(QUOTE_CHAR) && !text.contains('\n') {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push(QUOTE_CHAR);
    for ch in text.chars() {
        if ch == QUOTE_CHAR {
            escaped.push(QUOTE_CHAR);
        }
        escaped.push(ch);
    }
    escaped.push(QUOTE_CHAR);
    Cow::Owned(escaped)
}

/// Infer a typed value from raw text.
///
/// Empty text is null. The only failure is date-shaped text naming an
/// impossible calendar day, reported so the importer can record an
/// "Invalid value" row error; everything else falls through to the trimmed
/// string.
pub fn infer_type(raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }

    if NUMERIC_RE.is_match(trimmed) {
        if let Ok(number) = trimmed.parse::<f64>() {
            if number.is_finite() {
                return Ok(Value::Number(number));
            }
        }
    }

    if trimmed.eq_ignore_ascii_case("true") {
        return Ok(Value::Bool(true));
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Ok(Value::Bool(false));
    }

    if trimmed.contains('-') {
        if let Some(date) = parse_calendar_date(trimmed) {
            return Ok(Value::Date(date));
        }
        if DATE_SHAPE_RE.is_match(trimmed) {
            return Err(DataportError::invalid_value(trimmed));
        }
    }

    Ok(Value::Text(trimmed.to_string()))
}

/// Parse a calendar date in ISO date, space-separated datetime, or RFC 3339
/// form.
fn parse_calendar_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(datetime.and_utc());
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.with_timezone(&Utc));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize_row;
    use chrono::TimeZone;

    #[test]
    fn test_encode_null_is_empty() {
        assert_eq!(encode_value(&Value::Null, "YYYY-MM-DD"), "");
    }

    #[test]
    fn test_encode_scalars_natural_form() {
        assert_eq!(encode_value(&Value::Bool(true), ""), "true");
        assert_eq!(encode_value(&Value::Number(42.0), ""), "42");
        assert_eq!(encode_value(&Value::Number(2.5), ""), "2.5");
        assert_eq!(encode_value(&Value::Text("hi".to_string()), ""), "hi");
    }

    #[test]
    fn test_encode_nested_as_structured_text() {
        let nested = Value::Nested(serde_json::json!({"a": 1}));
        assert_eq!(encode_value(&nested, ""), r#"{"a":1}"#);
    }

    #[test]
    fn test_format_date_token_substitution() {
        let date = Utc.with_ymd_and_hms(2024, 1, 9, 7, 5, 3).unwrap();
        assert_eq!(format_date(&date, "YYYY-MM-DD"), "2024-01-09");
        assert_eq!(
            format_date(&date, "YYYY-MM-DD HH:mm:ss"),
            "2024-01-09 07:05:03"
        );
        assert_eq!(format_date(&date, "DD/MM/YYYY"), "09/01/2024");
    }

    #[test]
    fn test_escape_plain_text_unchanged() {
        assert!(matches!(escape_delimited("plain", ','), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_wraps_and_doubles_quotes() {
        assert_eq!(escape_delimited("a,b", ','), "\"a,b\"");
        assert_eq!(escape_delimited("say \"hi\"", ','), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_delimited("line1\nline2", ','), "\"line1\nline2\"");
    }

    #[test]
    fn test_escape_then_tokenize_round_trips() {
        for original in ["a,b", "quote \"inside\"", "multi\nline", "mix,\"q\",end"] {
            let escaped = escape_delimited(original, ',');
            let fields = tokenize_row(&escaped, ',');
            assert_eq!(fields, vec![original.to_string()]);
        }
    }

    #[test]
    fn test_infer_empty_is_null() {
        assert_eq!(infer_type("").unwrap(), Value::Null);
        assert_eq!(infer_type("   ").unwrap(), Value::Null);
    }

    #[test]
    fn test_infer_numbers() {
        assert_eq!(infer_type("42").unwrap(), Value::Number(42.0));
        assert_eq!(infer_type("-3.5").unwrap(), Value::Number(-3.5));
        assert_eq!(infer_type(" 7 ").unwrap(), Value::Number(7.0));
    }

    #[test]
    fn test_infer_booleans_case_insensitive() {
        assert_eq!(infer_type("true").unwrap(), Value::Bool(true));
        assert_eq!(infer_type("FALSE").unwrap(), Value::Bool(false));
        assert_eq!(infer_type("True").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_infer_dates_normalize_to_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(infer_type("2024-01-01").unwrap(), Value::Date(expected));

        let with_time = Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap();
        assert_eq!(
            infer_type("2024-01-01 12:30:00").unwrap(),
            Value::Date(with_time)
        );
    }

    #[test]
    fn test_infer_numeric_precedes_date() {
        // A bare year is numeric, never a date.
        assert_eq!(infer_type("2024").unwrap(), Value::Number(2024.0));
        // A dash-leading numeric matches the numeric pattern first.
        assert_eq!(infer_type("-5").unwrap(), Value::Number(-5.0));
    }

    #[test]
    fn test_infer_impossible_calendar_date_fails() {
        let err = infer_type("2024-13-40").unwrap_err();
        assert_eq!(err.to_string(), "Invalid value: 2024-13-40");
    }

    #[test]
    fn test_infer_falls_back_to_trimmed_string() {
        assert_eq!(
            infer_type("  hello world  ").unwrap(),
            Value::Text("hello world".to_string())
        );
        // Dash-bearing text that is not date shaped stays text.
        assert_eq!(
            infer_type("not-a-date").unwrap(),
            Value::Text("not-a-date".to_string())
        );
    }

    #[test]
    fn test_infer_idempotent_for_numbers_and_booleans() {
        for value in [Value::Number(12.5), Value::Number(-3.0), Value::Bool(true)] {
            let text = encode_value(&value, "YYYY-MM-DD");
            assert_eq!(infer_type(&text).unwrap(), value);
        }
    }
}
