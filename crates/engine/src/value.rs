use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The six semantic column types a Feather table can expose to the editor.
///
/// Categorical columns store label indices (see `ColumnData::Categorical`);
/// their cells surface as `CellValue::Text` holding the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Boolean,
    DateTime,
    Categorical,
}

impl ColumnType {
    pub const ALL: [ColumnType; 6] = [
        ColumnType::Integer,
        ColumnType::Float,
        ColumnType::Text,
        ColumnType::Boolean,
        ColumnType::DateTime,
        ColumnType::Categorical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::DateTime => "datetime",
            ColumnType::Categorical => "categorical",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    /// Accepts the short aliases the type-change dialog historically
    /// offered (int, str, bool, category) alongside the canonical names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(ColumnType::Integer),
            "float" | "double" => Ok(ColumnType::Float),
            "text" | "str" | "string" => Ok(ColumnType::Text),
            "boolean" | "bool" => Ok(ColumnType::Boolean),
            "datetime" => Ok(ColumnType::DateTime),
            "categorical" | "category" => Ok(ColumnType::Categorical),
            other => Err(format!("unknown column type '{other}'")),
        }
    }
}

/// A single cell value as a tagged variant.
///
/// `Null` is the missing-value marker: every column is nullable, and a
/// best-effort column conversion leaves unconvertible cells as `Null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
}

/// Display format for datetime cells (and datetime→text conversion).
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// True if this value can be stored in a column of the given type
    /// without conversion. `Null` is admissible everywhere.
    pub fn fits(&self, column_type: ColumnType) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Int(_) => column_type == ColumnType::Integer,
            CellValue::Float(_) => column_type == ColumnType::Float,
            // Categorical cells carry their label as text.
            CellValue::Text(_) => {
                column_type == ColumnType::Text || column_type == ColumnType::Categorical
            }
            CellValue::Bool(_) => column_type == ColumnType::Boolean,
            CellValue::DateTime(_) => column_type == ColumnType::DateTime,
        }
    }

    /// The display string shown in the grid, used for search and for the
    /// clipboard. `Null` renders as the empty string.
    pub fn display(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Int(n) => n.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_type_parsing_accepts_aliases() {
        assert_eq!("int".parse::<ColumnType>().unwrap(), ColumnType::Integer);
        assert_eq!("STR".parse::<ColumnType>().unwrap(), ColumnType::Text);
        assert_eq!("bool".parse::<ColumnType>().unwrap(), ColumnType::Boolean);
        assert_eq!(
            "category".parse::<ColumnType>().unwrap(),
            ColumnType::Categorical
        );
        assert!("decimal".parse::<ColumnType>().is_err());
    }

    #[test]
    fn test_fits_matches_tag_to_type() {
        assert!(CellValue::Int(1).fits(ColumnType::Integer));
        assert!(!CellValue::Int(1).fits(ColumnType::Float));
        assert!(CellValue::Text("a".into()).fits(ColumnType::Text));
        assert!(CellValue::Text("a".into()).fits(ColumnType::Categorical));
        assert!(CellValue::Null.fits(ColumnType::DateTime));
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(CellValue::Null.display(), "");
        assert_eq!(CellValue::Int(42).display(), "42");
        assert_eq!(CellValue::Float(2.5).display(), "2.5");
        assert_eq!(CellValue::Bool(true).display(), "true");
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(CellValue::DateTime(dt).display(), "2024-03-01 12:30:00");
    }
}
