use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::{CellValue, ColumnType};

/// Typed columnar storage. One vector per semantic type, matching the
/// column-per-array layout of the Feather format itself.
///
/// Categorical columns hold codes into a label table (labels sorted and
/// deduplicated at construction; labels first seen through later edits
/// are appended so existing codes stay stable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    Integer(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Boolean(Vec<Option<bool>>),
    DateTime(Vec<Option<NaiveDateTime>>),
    Categorical {
        codes: Vec<Option<u32>>,
        labels: Vec<String>,
    },
}

impl ColumnData {
    /// All-null storage of the given type and length.
    pub fn empty(column_type: ColumnType, rows: usize) -> Self {
        match column_type {
            ColumnType::Integer => ColumnData::Integer(vec![None; rows]),
            ColumnType::Float => ColumnData::Float(vec![None; rows]),
            ColumnType::Text => ColumnData::Text(vec![None; rows]),
            ColumnType::Boolean => ColumnData::Boolean(vec![None; rows]),
            ColumnType::DateTime => ColumnData::DateTime(vec![None; rows]),
            ColumnType::Categorical => ColumnData::Categorical {
                codes: vec![None; rows],
                labels: Vec::new(),
            },
        }
    }

    /// Build storage from scalar values. Each value must already fit the
    /// type (`Null` always does); the caller coerces first.
    pub fn from_values(column_type: ColumnType, values: Vec<CellValue>) -> Result<Self> {
        if let Some(bad) = values.iter().find(|v| !v.fits(column_type)) {
            return Err(Error::TypeMismatch {
                column: String::new(),
                expected: column_type,
                got: bad.display(),
            });
        }
        let data = match column_type {
            ColumnType::Integer => ColumnData::Integer(
                values
                    .into_iter()
                    .map(|v| match v {
                        CellValue::Int(n) => Some(n),
                        _ => None,
                    })
                    .collect(),
            ),
            ColumnType::Float => ColumnData::Float(
                values
                    .into_iter()
                    .map(|v| match v {
                        CellValue::Float(f) => Some(f),
                        _ => None,
                    })
                    .collect(),
            ),
            ColumnType::Text => ColumnData::Text(
                values
                    .into_iter()
                    .map(|v| match v {
                        CellValue::Text(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            ColumnType::Boolean => ColumnData::Boolean(
                values
                    .into_iter()
                    .map(|v| match v {
                        CellValue::Bool(b) => Some(b),
                        _ => None,
                    })
                    .collect(),
            ),
            ColumnType::DateTime => ColumnData::DateTime(
                values
                    .into_iter()
                    .map(|v| match v {
                        CellValue::DateTime(dt) => Some(dt),
                        _ => None,
                    })
                    .collect(),
            ),
            ColumnType::Categorical => {
                let mut labels: Vec<String> = values
                    .iter()
                    .filter_map(|v| match v {
                        CellValue::Text(s) => Some(s.clone()),
                        _ => None,
                    })
                    .collect();
                labels.sort();
                labels.dedup();
                let codes = values
                    .into_iter()
                    .map(|v| match v {
                        CellValue::Text(s) => {
                            // labels is sorted, binary search always hits
                            labels.binary_search(&s).ok().map(|i| i as u32)
                        }
                        _ => None,
                    })
                    .collect();
                ColumnData::Categorical { codes, labels }
            }
        };
        Ok(data)
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Integer(_) => ColumnType::Integer,
            ColumnData::Float(_) => ColumnType::Float,
            ColumnData::Text(_) => ColumnType::Text,
            ColumnData::Boolean(_) => ColumnType::Boolean,
            ColumnData::DateTime(_) => ColumnType::DateTime,
            ColumnData::Categorical { .. } => ColumnType::Categorical,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Integer(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::Boolean(v) => v.len(),
            ColumnData::DateTime(v) => v.len(),
            ColumnData::Categorical { codes, .. } => codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scalar view of one slot. `None` only when out of range.
    pub fn get(&self, row: usize) -> Option<CellValue> {
        if row >= self.len() {
            return None;
        }
        let value = match self {
            ColumnData::Integer(v) => v[row].map(CellValue::Int),
            ColumnData::Float(v) => v[row].map(CellValue::Float),
            ColumnData::Text(v) => v[row].clone().map(CellValue::Text),
            ColumnData::Boolean(v) => v[row].map(CellValue::Bool),
            ColumnData::DateTime(v) => v[row].map(CellValue::DateTime),
            ColumnData::Categorical { codes, labels } => codes[row]
                .and_then(|c| labels.get(c as usize))
                .cloned()
                .map(CellValue::Text),
        };
        Some(value.unwrap_or(CellValue::Null))
    }

    /// Store a fitting value, returning the previous one. The caller has
    /// already bounds- and type-checked; this only fails on a slot that
    /// does not exist.
    pub(crate) fn set(&mut self, row: usize, value: CellValue) -> Option<CellValue> {
        let old = self.get(row)?;
        match (self, value) {
            (ColumnData::Integer(v), CellValue::Int(n)) => v[row] = Some(n),
            (ColumnData::Float(v), CellValue::Float(f)) => v[row] = Some(f),
            (ColumnData::Text(v), CellValue::Text(s)) => v[row] = Some(s),
            (ColumnData::Boolean(v), CellValue::Bool(b)) => v[row] = Some(b),
            (ColumnData::DateTime(v), CellValue::DateTime(dt)) => v[row] = Some(dt),
            (ColumnData::Categorical { codes, labels }, CellValue::Text(s)) => {
                let code = match labels.iter().position(|l| l == &s) {
                    Some(i) => i as u32,
                    None => {
                        labels.push(s);
                        (labels.len() - 1) as u32
                    }
                };
                codes[row] = Some(code);
            }
            (data, CellValue::Null) => data.clear_slot(row),
            // `CellValue::fits` rules out every other combination.
            _ => unreachable!("value does not fit column storage"),
        }
        Some(old)
    }

    fn clear_slot(&mut self, row: usize) {
        match self {
            ColumnData::Integer(v) => v[row] = None,
            ColumnData::Float(v) => v[row] = None,
            ColumnData::Text(v) => v[row] = None,
            ColumnData::Boolean(v) => v[row] = None,
            ColumnData::DateTime(v) => v[row] = None,
            ColumnData::Categorical { codes, .. } => codes[row] = None,
        }
    }

    /// Iterate the column as scalars.
    pub fn values(&self) -> impl Iterator<Item = CellValue> + '_ {
        (0..self.len()).map(|row| self.get(row).unwrap_or(CellValue::Null))
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self { name: name.into(), data }
    }

    pub fn from_values(
        name: impl Into<String>,
        column_type: ColumnType,
        values: Vec<CellValue>,
    ) -> Result<Self> {
        let name = name.into();
        let data = ColumnData::from_values(column_type, values).map_err(|e| match e {
            Error::TypeMismatch { expected, got, .. } => Error::TypeMismatch {
                column: name.clone(),
                expected,
                got,
            },
            other => other,
        })?;
        Ok(Self { name, data })
    }

    pub fn column_type(&self) -> ColumnType {
        self.data.column_type()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<CellValue> {
        self.data.get(row)
    }

    pub(crate) fn set(&mut self, row: usize, value: CellValue) -> Option<CellValue> {
        self.data.set(row, value)
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn null_count(&self) -> usize {
        self.data.values().filter(|v| v.is_null()).count()
    }

    pub fn values(&self) -> impl Iterator<Item = CellValue> + '_ {
        self.data.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_values_rejects_mismatched_tag() {
        let err = ColumnData::from_values(
            ColumnType::Integer,
            vec![CellValue::Int(1), CellValue::Text("x".into())],
        )
        .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_categorical_labels_sorted_and_deduped() {
        let col = Column::from_values(
            "city",
            ColumnType::Categorical,
            vec![
                CellValue::Text("paris".into()),
                CellValue::Text("berlin".into()),
                CellValue::Null,
                CellValue::Text("paris".into()),
            ],
        )
        .unwrap();
        match col.data() {
            ColumnData::Categorical { codes, labels } => {
                assert_eq!(labels, &["berlin".to_string(), "paris".to_string()]);
                assert_eq!(codes, &[Some(1), Some(0), None, Some(1)]);
            }
            other => panic!("expected categorical storage, got {other:?}"),
        }
        assert_eq!(col.get(0), Some(CellValue::Text("paris".into())));
        assert_eq!(col.get(2), Some(CellValue::Null));
    }

    #[test]
    fn test_categorical_set_appends_new_label() {
        let mut col = Column::from_values(
            "city",
            ColumnType::Categorical,
            vec![CellValue::Text("berlin".into()), CellValue::Text("paris".into())],
        )
        .unwrap();
        let old = col.set(0, CellValue::Text("tokyo".into())).unwrap();
        assert_eq!(old, CellValue::Text("berlin".into()));
        assert_eq!(col.get(0), Some(CellValue::Text("tokyo".into())));
        // existing codes still resolve
        assert_eq!(col.get(1), Some(CellValue::Text("paris".into())));
    }

    #[test]
    fn test_set_null_clears_slot() {
        let mut col =
            Column::from_values("n", ColumnType::Integer, vec![CellValue::Int(1)]).unwrap();
        assert_eq!(col.set(0, CellValue::Null), Some(CellValue::Int(1)));
        assert_eq!(col.get(0), Some(CellValue::Null));
        assert_eq!(col.null_count(), 1);
    }

    #[test]
    fn test_get_out_of_range() {
        let col = Column::new("n", ColumnData::empty(ColumnType::Float, 2));
        assert_eq!(col.get(1), Some(CellValue::Null));
        assert_eq!(col.get(2), None);
    }
}
