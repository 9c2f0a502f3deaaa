//! Shared table builders for tests.

use crate::column::Column;
use crate::table::Table;
use crate::value::{CellValue, ColumnType};

/// `age` (integer 1,2,3) + `name` (text ada, grace, null).
pub fn people_table() -> Table {
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

/// Single integer column `age` with values 1,2,3.
pub fn ages_table() -> Table {
    Table::new(vec![Column::from_values(
        "age",
        ColumnType::Integer,
        vec![CellValue::Int(1), CellValue::Int(2), CellValue::Int(3)],
    )
    .unwrap()])
    .unwrap()
}
