use thiserror::Error;

use crate::value::ColumnType;

/// Errors produced by table operations.
///
/// An empty undo/redo history is deliberately not represented here: it is
/// a silent no-op, surfaced as `false`/`None` by the session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("cell ({row}, {col}) is out of range")]
    OutOfRange { row: usize, col: usize },

    #[error("column {0} is out of range")]
    ColumnOutOfRange(usize),

    #[error("value '{got}' does not fit column '{column}' of type {expected}")]
    TypeMismatch {
        column: String,
        expected: ColumnType,
        got: String,
    },

    #[error("no conversion from {from} to {to}")]
    UnsupportedConversion { from: ColumnType, to: ColumnType },

    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("column '{column}' has {got} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        got: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
