use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::error::{Error, Result};
use crate::value::{CellValue, ColumnType};

/// The in-memory grid: an ordered sequence of named, typed columns.
///
/// Invariants, enforced at construction and preserved by every operation:
/// all columns share one row count, and column names are unique.
///
/// `Table` checks bounds and types but records nothing; history and
/// change notification live in [`crate::session::Session`], which is the
/// only mutation entry point the rest of the application sees.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            for col in &columns {
                if col.len() != expected {
                    return Err(Error::LengthMismatch {
                        column: col.name.clone(),
                        expected,
                        got: col.len(),
                    });
                }
            }
        }
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(Error::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(Self { columns })
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, col: usize) -> Result<&Column> {
        self.columns.get(col).ok_or(Error::ColumnOutOfRange(col))
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn get_cell(&self, row: usize, col: usize) -> Result<CellValue> {
        self.column(col)
            .ok()
            .and_then(|c| c.get(row))
            .ok_or(Error::OutOfRange { row, col })
    }

    /// Validate and store a value, returning the previous one.
    /// Fails without touching state: `OutOfRange` on a bad reference,
    /// `TypeMismatch` when the value does not fit the column's type.
    pub fn set_cell(&mut self, row: usize, col: usize, value: CellValue) -> Result<CellValue> {
        let n_rows = self.n_rows();
        let column = self
            .columns
            .get_mut(col)
            .ok_or(Error::OutOfRange { row, col })?;
        if row >= n_rows {
            return Err(Error::OutOfRange { row, col });
        }
        if !value.fits(column.column_type()) {
            return Err(Error::TypeMismatch {
                column: column.name.clone(),
                expected: column.column_type(),
                got: value.display(),
            });
        }
        column
            .set(row, value)
            .ok_or(Error::OutOfRange { row, col })
    }

    /// Replace a whole column in place (same position, any type).
    /// Used by column conversion and its undo.
    pub(crate) fn replace_column(&mut self, col: usize, column: Column) -> Result<Column> {
        if column.len() != self.n_rows() {
            return Err(Error::LengthMismatch {
                column: column.name.clone(),
                expected: self.n_rows(),
                got: column.len(),
            });
        }
        let slot = self
            .columns
            .get_mut(col)
            .ok_or(Error::ColumnOutOfRange(col))?;
        Ok(std::mem::replace(slot, column))
    }

    /// Display string for a cell, empty string for `Null` or anything
    /// out of range. This is what the grid renders, and what search and
    /// the clipboard operate on.
    pub fn display(&self, row: usize, col: usize) -> String {
        self.get_cell(row, col)
            .map(|v| v.display())
            .unwrap_or_default()
    }

    pub fn column_type(&self, col: usize) -> Result<ColumnType> {
        self.column(col).map(Column::column_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnData;

    pub(crate) fn sample_table() -> Table {
        Table::new(vec![
            Column::from_values(
                "age",
                ColumnType::Integer,
                vec![CellValue::Int(1), CellValue::Int(2), CellValue::Int(3)],
            )
            .unwrap(),
            Column::from_values(
                "name",
                ColumnType::Text,
                vec![
                    CellValue::Text("ada".into()),
                    CellValue::Text("grace".into()),
                    CellValue::Null,
                ],
            )
            .unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_rejects_unequal_lengths() {
        let err = Table::new(vec![
            Column::from_values("a", ColumnType::Integer, vec![CellValue::Int(1)]).unwrap(),
            Column::new("b", ColumnData::empty(ColumnType::Text, 2)),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { .. }));
    }

    #[test]
    fn test_new_rejects_duplicate_names() {
        let err = Table::new(vec![
            Column::new("x", ColumnData::empty(ColumnType::Integer, 1)),
            Column::new("x", ColumnData::empty(ColumnType::Float, 1)),
        ])
        .unwrap_err();
        assert_eq!(err, Error::DuplicateColumn("x".into()));
    }

    #[test]
    fn test_get_cell_bounds() {
        let table = sample_table();
        assert_eq!(table.get_cell(0, 0).unwrap(), CellValue::Int(1));
        assert_eq!(table.get_cell(2, 1).unwrap(), CellValue::Null);
        assert_eq!(
            table.get_cell(3, 0).unwrap_err(),
            Error::OutOfRange { row: 3, col: 0 }
        );
        assert_eq!(
            table.get_cell(0, 2).unwrap_err(),
            Error::OutOfRange { row: 0, col: 2 }
        );
    }

    #[test]
    fn test_set_cell_type_mismatch_leaves_state() {
        let mut table = sample_table();
        let err = table
            .set_cell(0, 0, CellValue::Text("nope".into()))
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert_eq!(table.get_cell(0, 0).unwrap(), CellValue::Int(1));
    }

    #[test]
    fn test_set_cell_returns_old_value() {
        let mut table = sample_table();
        let old = table.set_cell(0, 0, CellValue::Int(5)).unwrap();
        assert_eq!(old, CellValue::Int(1));
        assert_eq!(table.get_cell(0, 0).unwrap(), CellValue::Int(5));
    }

    #[test]
    fn test_empty_table_dimensions() {
        let table = Table::empty();
        assert_eq!(table.n_rows(), 0);
        assert_eq!(table.n_cols(), 0);
    }
}
