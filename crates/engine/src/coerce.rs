//! Value-level conversion between the six semantic types.
//!
//! Pure functions, no table state. Two layers of failure:
//! - an unsupported *pair* (e.g. boolean→datetime) is rejected up front
//!   via [`supported`] and never attempted per cell;
//! - a supported pair can still fail on an individual value (e.g. the
//!   text "abc" to integer); [`coerce`] reports that as `Ok(None)` so the
//!   caller can substitute the `Null` sentinel and report the row.

use chrono::{NaiveDate, NaiveDateTime};

use crate::value::{CellValue, ColumnType};

/// Datetime parse formats recognized for text→datetime, tried in order.
const DATETIME_PARSE_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Whether a conversion rule exists for the pair at all.
///
/// Datetime only interconverts with text (and categorical, which routes
/// through text): there is no defined numeric epoch mapping in the editor.
pub fn supported(from: ColumnType, to: ColumnType) -> bool {
    use ColumnType::*;
    if from == to {
        return true;
    }
    match (from, to) {
        (DateTime, Text) | (Text, DateTime) => true,
        (DateTime, Categorical) | (Categorical, DateTime) => true,
        (DateTime, _) | (_, DateTime) => false,
        _ => true,
    }
}

/// Convert one value to the target type.
///
/// Returns `Err` for an unsupported pair, `Ok(None)` when this particular
/// value has no representation in the target type, `Ok(Some)` otherwise.
/// `Null` converts to `Null` for every supported target.
pub fn coerce(value: &CellValue, target: ColumnType) -> crate::error::Result<Option<CellValue>> {
    let from = source_type(value);
    if let Some(from) = from {
        if !supported(from, target) {
            return Err(crate::error::Error::UnsupportedConversion { from, to: target });
        }
    }

    let out = match (value, target) {
        (CellValue::Null, _) => Some(CellValue::Null),

        // Identity (categorical identity is handled by the Text arm:
        // categorical cells carry their label as Text).
        (CellValue::Int(n), ColumnType::Integer) => Some(CellValue::Int(*n)),
        (CellValue::Float(f), ColumnType::Float) => Some(CellValue::Float(*f)),
        (CellValue::Text(s), ColumnType::Text | ColumnType::Categorical) => {
            Some(CellValue::Text(s.clone()))
        }
        (CellValue::Bool(b), ColumnType::Boolean) => Some(CellValue::Bool(*b)),
        (CellValue::DateTime(dt), ColumnType::DateTime) => Some(CellValue::DateTime(*dt)),

        // Numeric widening and narrowing.
        (CellValue::Int(n), ColumnType::Float) => Some(CellValue::Float(*n as f64)),
        (CellValue::Float(f), ColumnType::Integer) => float_to_int(*f),

        // Anything → text is its display string.
        (v, ColumnType::Text | ColumnType::Categorical) => Some(CellValue::Text(v.display())),

        // Numeric → boolean: zero is false, anything else true.
        (CellValue::Int(n), ColumnType::Boolean) => Some(CellValue::Bool(*n != 0)),
        (CellValue::Float(f), ColumnType::Boolean) => Some(CellValue::Bool(*f != 0.0)),

        // Boolean → numeric.
        (CellValue::Bool(b), ColumnType::Integer) => Some(CellValue::Int(i64::from(*b))),
        (CellValue::Bool(b), ColumnType::Float) => {
            Some(CellValue::Float(if *b { 1.0 } else { 0.0 }))
        }

        // Text parses.
        (CellValue::Text(s), ColumnType::Integer) => parse_int(s),
        (CellValue::Text(s), ColumnType::Float) => parse_float(s),
        (CellValue::Text(s), ColumnType::Boolean) => parse_bool(s),
        (CellValue::Text(s), ColumnType::DateTime) => parse_datetime(s),

        // Remaining datetime pairs were rejected by `supported` above.
        _ => None,
    };
    Ok(out)
}

/// Parse raw editor/clipboard input against a column type.
///
/// Empty (or all-whitespace) input clears the cell to `Null`. Returns
/// `None` when the text does not parse as the column's type.
pub fn parse_text(raw: &str, target: ColumnType) -> Option<CellValue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(CellValue::Null);
    }
    match target {
        ColumnType::Integer => parse_int(trimmed),
        ColumnType::Float => parse_float(trimmed),
        ColumnType::Text | ColumnType::Categorical => Some(CellValue::Text(trimmed.to_string())),
        ColumnType::Boolean => parse_bool(trimmed),
        ColumnType::DateTime => parse_datetime(trimmed),
    }
}

fn source_type(value: &CellValue) -> Option<ColumnType> {
    match value {
        CellValue::Null => None,
        CellValue::Int(_) => Some(ColumnType::Integer),
        CellValue::Float(_) => Some(ColumnType::Float),
        CellValue::Text(_) => Some(ColumnType::Text),
        CellValue::Bool(_) => Some(ColumnType::Boolean),
        CellValue::DateTime(_) => Some(ColumnType::DateTime),
    }
}

// No silent truncation: only exactly integral floats become integers.
fn float_to_int(f: f64) -> Option<CellValue> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(CellValue::Int(f as i64))
    } else {
        None
    }
}

fn parse_int(s: &str) -> Option<CellValue> {
    s.trim().parse::<i64>().ok().map(CellValue::Int)
}

fn parse_float(s: &str) -> Option<CellValue> {
    s.trim().parse::<f64>().ok().map(CellValue::Float)
}

fn parse_bool(s: &str) -> Option<CellValue> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(CellValue::Bool(true)),
        "false" | "f" | "no" | "n" | "0" => Some(CellValue::Bool(false)),
        _ => None,
    }
}

fn parse_datetime(s: &str) -> Option<CellValue> {
    let s = s.trim();
    // RFC 3339 first (what Arrow tooling tends to emit).
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(CellValue::DateTime(dt.naive_utc()));
    }
    for fmt in DATETIME_PARSE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(CellValue::DateTime(dt));
        }
    }
    // Bare date: midnight.
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(CellValue::DateTime(d.and_hms_opt(0, 0, 0)?));
    }
    None
}
