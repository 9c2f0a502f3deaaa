//! Feather (Arrow IPC file) import/export.
//!
//! A Feather v2 file is the Arrow IPC file format on disk. The reader
//! accepts the common physical encodings Arrow writers produce and folds
//! them onto the editor's six semantic types; the writer emits one
//! canonical physical type per semantic type.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow_array::builder::StringDictionaryBuilder;
use arrow_array::cast::AsArray;
use arrow_array::types::{
    ArrowDictionaryKeyType, ArrowPrimitiveType, Date32Type, Date64Type, Float32Type, Float64Type,
    Int16Type, Int32Type, Int64Type, Int8Type, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use arrow_array::{
    Array, ArrayAccessor, ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch,
    RecordBatchOptions, StringArray, TimestampMicrosecondArray,
};
use arrow_ipc::reader::FileReader;
use arrow_ipc::writer::FileWriter;
use arrow_schema::{DataType, Field, Schema, TimeUnit};
use chrono::DateTime;
use tracing::debug;

use feathergrid_engine::column::Column;
use feathergrid_engine::table::Table;
use feathergrid_engine::value::{CellValue, ColumnType};

use crate::error::{IoError, Result};

/// Read a Feather file into a table.
///
/// Record batches are concatenated. Fails with `Format` on a column type
/// the editor has no semantic mapping for, `Arrow` on a malformed file.
pub fn read(path: &Path) -> Result<Table> {
    let file = File::open(path)?;
    let reader = FileReader::try_new(file, None)?;
    let schema = reader.schema();

    // semantic type per column, decided once from the schema
    let mut semantic: Vec<ColumnType> = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        semantic.push(semantic_type(field.data_type()).ok_or_else(|| {
            IoError::Format(format!(
                "column '{}' has unsupported type {}",
                field.name(),
                field.data_type()
            ))
        })?);
    }

    let mut values: Vec<Vec<CellValue>> = vec![Vec::new(); schema.fields().len()];
    for batch in reader {
        let batch = batch?;
        for (col, array) in batch.columns().iter().enumerate() {
            append_values(&mut values[col], array, schema.field(col).name())?;
        }
    }

    let mut columns = Vec::with_capacity(values.len());
    for ((field, column_type), column_values) in
        schema.fields().iter().zip(semantic).zip(values)
    {
        let column = Column::from_values(field.name().clone(), column_type, column_values)
            .map_err(|e| IoError::Format(e.to_string()))?;
        columns.push(column);
    }
    let table = Table::new(columns).map_err(|e| IoError::Format(e.to_string()))?;
    debug!(
        path = %path.display(),
        rows = table.n_rows(),
        cols = table.n_cols(),
        "loaded feather file"
    );
    Ok(table)
}

/// Write a table as a single-batch Feather file.
pub fn write(path: &Path, table: &Table) -> Result<()> {
    let fields: Vec<Field> = table
        .columns()
        .iter()
        .map(|c| Field::new(c.name.clone(), physical_type(c.column_type()), true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let arrays: Vec<ArrayRef> = table
        .columns()
        .iter()
        .map(column_to_array)
        .collect::<Result<_>>()?;

    let options = RecordBatchOptions::new().with_row_count(Some(table.n_rows()));
    let batch = RecordBatch::try_new_with_options(schema.clone(), arrays, &options)?;

    let file = File::create(path)?;
    let mut writer = FileWriter::try_new(file, &schema)?;
    writer.write(&batch)?;
    writer.finish()?;
    debug!(
        path = %path.display(),
        rows = table.n_rows(),
        cols = table.n_cols(),
        "wrote feather file"
    );
    Ok(())
}

fn physical_type(column_type: ColumnType) -> DataType {
    match column_type {
        ColumnType::Integer => DataType::Int64,
        ColumnType::Float => DataType::Float64,
        ColumnType::Text => DataType::Utf8,
        ColumnType::Boolean => DataType::Boolean,
        ColumnType::DateTime => DataType::Timestamp(TimeUnit::Microsecond, None),
        ColumnType::Categorical => {
            DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8))
        }
    }
}

fn semantic_type(data_type: &DataType) -> Option<ColumnType> {
    match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => Some(ColumnType::Integer),
        DataType::Float32 | DataType::Float64 => Some(ColumnType::Float),
        DataType::Utf8 | DataType::LargeUtf8 => Some(ColumnType::Text),
        DataType::Boolean => Some(ColumnType::Boolean),
        DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64 => {
            Some(ColumnType::DateTime)
        }
        DataType::Dictionary(_, inner) if **inner == DataType::Utf8 => {
            Some(ColumnType::Categorical)
        }
        _ => None,
    }
}

fn column_to_array(column: &Column) -> Result<ArrayRef> {
    let array: ArrayRef = match column.column_type() {
        ColumnType::Integer => {
            let values: Vec<Option<i64>> = column
                .values()
                .map(|v| match v {
                    CellValue::Int(n) => Some(n),
                    _ => None,
                })
                .collect();
            Arc::new(Int64Array::from(values))
        }
        ColumnType::Float => {
            let values: Vec<Option<f64>> = column
                .values()
                .map(|v| match v {
                    CellValue::Float(f) => Some(f),
                    _ => None,
                })
                .collect();
            Arc::new(Float64Array::from(values))
        }
        ColumnType::Text => {
            let array: StringArray = column
                .values()
                .map(|v| match v {
                    CellValue::Text(s) => Some(s),
                    _ => None,
                })
                .collect();
            Arc::new(array)
        }
        ColumnType::Boolean => {
            let values: Vec<Option<bool>> = column
                .values()
                .map(|v| match v {
                    CellValue::Bool(b) => Some(b),
                    _ => None,
                })
                .collect();
            Arc::new(BooleanArray::from(values))
        }
        ColumnType::DateTime => {
            let values: Vec<Option<i64>> = column
                .values()
                .map(|v| match v {
                    CellValue::DateTime(dt) => Some(dt.and_utc().timestamp_micros()),
                    _ => None,
                })
                .collect();
            Arc::new(TimestampMicrosecondArray::from(values))
        }
        ColumnType::Categorical => {
            let mut builder = StringDictionaryBuilder::<Int32Type>::new();
            for value in column.values() {
                match value {
                    CellValue::Text(s) => {
                        builder.append(&s)?;
                    }
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
    };
    Ok(array)
}

fn append_values(values: &mut Vec<CellValue>, array: &ArrayRef, name: &str) -> Result<()> {
    match array.data_type() {
        DataType::Int8 => append_ints::<Int8Type>(values, array),
        DataType::Int16 => append_ints::<Int16Type>(values, array),
        DataType::Int32 => append_ints::<Int32Type>(values, array),
        DataType::Int64 => append_ints::<Int64Type>(values, array),
        DataType::UInt8 => append_ints::<UInt8Type>(values, array),
        DataType::UInt16 => append_ints::<UInt16Type>(values, array),
        DataType::UInt32 => append_ints::<UInt32Type>(values, array),
        DataType::UInt64 => {
            let a = array.as_primitive::<UInt64Type>();
            for i in 0..a.len() {
                if a.is_null(i) {
                    values.push(CellValue::Null);
                } else {
                    let v = i64::try_from(a.value(i)).map_err(|_| {
                        IoError::Format(format!(
                            "column '{name}': value {} exceeds the integer range",
                            a.value(i)
                        ))
                    })?;
                    values.push(CellValue::Int(v));
                }
            }
        }
        DataType::Float32 => {
            let a = array.as_primitive::<Float32Type>();
            for i in 0..a.len() {
                values.push(match a.is_null(i) {
                    true => CellValue::Null,
                    false => CellValue::Float(f64::from(a.value(i))),
                });
            }
        }
        DataType::Float64 => {
            let a = array.as_primitive::<Float64Type>();
            for i in 0..a.len() {
                values.push(match a.is_null(i) {
                    true => CellValue::Null,
                    false => CellValue::Float(a.value(i)),
                });
            }
        }
        DataType::Utf8 => {
            let a = array.as_string::<i32>();
            for i in 0..a.len() {
                values.push(match a.is_null(i) {
                    true => CellValue::Null,
                    false => CellValue::Text(a.value(i).to_string()),
                });
            }
        }
        DataType::LargeUtf8 => {
            let a = array.as_string::<i64>();
            for i in 0..a.len() {
                values.push(match a.is_null(i) {
                    true => CellValue::Null,
                    false => CellValue::Text(a.value(i).to_string()),
                });
            }
        }
        DataType::Boolean => {
            let a = array.as_boolean();
            for i in 0..a.len() {
                values.push(match a.is_null(i) {
                    true => CellValue::Null,
                    false => CellValue::Bool(a.value(i)),
                });
            }
        }
        DataType::Timestamp(unit, _) => {
            let unit = *unit;
            append_timestamps(values, array, unit);
        }
        DataType::Date32 => {
            let a = array.as_primitive::<Date32Type>();
            for i in 0..a.len() {
                values.push(match a.is_null(i) {
                    true => CellValue::Null,
                    false => datetime_or_null(
                        DateTime::from_timestamp(i64::from(a.value(i)) * 86_400, 0),
                    ),
                });
            }
        }
        DataType::Date64 => {
            let a = array.as_primitive::<Date64Type>();
            for i in 0..a.len() {
                values.push(match a.is_null(i) {
                    true => CellValue::Null,
                    false => datetime_or_null(DateTime::from_timestamp_millis(a.value(i))),
                });
            }
        }
        DataType::Dictionary(key, _) => match key.as_ref() {
            DataType::Int8 => append_dictionary::<Int8Type>(values, array, name)?,
            DataType::Int16 => append_dictionary::<Int16Type>(values, array, name)?,
            DataType::Int32 => append_dictionary::<Int32Type>(values, array, name)?,
            DataType::Int64 => append_dictionary::<Int64Type>(values, array, name)?,
            DataType::UInt8 => append_dictionary::<UInt8Type>(values, array, name)?,
            DataType::UInt16 => append_dictionary::<UInt16Type>(values, array, name)?,
            DataType::UInt32 => append_dictionary::<UInt32Type>(values, array, name)?,
            DataType::UInt64 => append_dictionary::<UInt64Type>(values, array, name)?,
            other => {
                return Err(IoError::Format(format!(
                    "column '{name}' has unsupported dictionary key type {other}"
                )))
            }
        },
        other => {
            return Err(IoError::Format(format!(
                "column '{name}' has unsupported type {other}"
            )))
        }
    }
    Ok(())
}

fn append_ints<T>(values: &mut Vec<CellValue>, array: &ArrayRef)
where
    T: ArrowPrimitiveType,
    i64: From<T::Native>,
{
    let a = array.as_primitive::<T>();
    for i in 0..a.len() {
        values.push(match a.is_null(i) {
            true => CellValue::Null,
            false => CellValue::Int(i64::from(a.value(i))),
        });
    }
}

fn append_timestamps(values: &mut Vec<CellValue>, array: &ArrayRef, unit: TimeUnit) {
    // A timestamp outside chrono's representable range loads as null
    // rather than failing the whole file.
    match unit {
        TimeUnit::Second => {
            let a = array.as_primitive::<TimestampSecondType>();
            for i in 0..a.len() {
                values.push(match a.is_null(i) {
                    true => CellValue::Null,
                    false => datetime_or_null(DateTime::from_timestamp(a.value(i), 0)),
                });
            }
        }
        TimeUnit::Millisecond => {
            let a = array.as_primitive::<TimestampMillisecondType>();
            for i in 0..a.len() {
                values.push(match a.is_null(i) {
                    true => CellValue::Null,
                    false => datetime_or_null(DateTime::from_timestamp_millis(a.value(i))),
                });
            }
        }
        TimeUnit::Microsecond => {
            let a = array.as_primitive::<TimestampMicrosecondType>();
            for i in 0..a.len() {
                values.push(match a.is_null(i) {
                    true => CellValue::Null,
                    false => datetime_or_null(DateTime::from_timestamp_micros(a.value(i))),
                });
            }
        }
        TimeUnit::Nanosecond => {
            let a = array.as_primitive::<TimestampNanosecondType>();
            for i in 0..a.len() {
                values.push(match a.is_null(i) {
                    true => CellValue::Null,
                    false => {
                        let v = a.value(i);
                        datetime_or_null(DateTime::from_timestamp(
                            v.div_euclid(1_000_000_000),
                            v.rem_euclid(1_000_000_000) as u32,
                        ))
                    }
                });
            }
        }
    }
}

fn datetime_or_null(dt: Option<chrono::DateTime<chrono::Utc>>) -> CellValue {
    match dt {
        Some(dt) => CellValue::DateTime(dt.naive_utc()),
        None => CellValue::Null,
    }
}

fn append_dictionary<K: ArrowDictionaryKeyType>(
    values: &mut Vec<CellValue>,
    array: &ArrayRef,
    name: &str,
) -> Result<()> {
    let dict = array.as_dictionary::<K>();
    let typed = dict.downcast_dict::<StringArray>().ok_or_else(|| {
        IoError::Format(format!("column '{name}' dictionary values are not utf8"))
    })?;
    for i in 0..dict.len() {
        values.push(match dict.is_null(i) {
            true => CellValue::Null,
            false => CellValue::Text(typed.value(i).to_string()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    fn dt(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(8, 30, 15)
            .unwrap()
    }

    fn six_type_table() -> Table {
        Table::new(vec![
            Column::from_values(
                "id",
                ColumnType::Integer,
                vec![CellValue::Int(1), CellValue::Null, CellValue::Int(3)],
            )
            .unwrap(),
            Column::from_values(
                "score",
                ColumnType::Float,
                vec![
                    CellValue::Float(1.5),
                    CellValue::Float(-2.25),
                    CellValue::Null,
                ],
            )
            .unwrap(),
            Column::from_values(
                "name",
                ColumnType::Text,
                vec![
                    CellValue::Text("ada".into()),
                    CellValue::Null,
                    CellValue::Text("grace".into()),
                ],
            )
            .unwrap(),
            Column::from_values(
                "active",
                ColumnType::Boolean,
                vec![CellValue::Bool(true), CellValue::Bool(false), CellValue::Null],
            )
            .unwrap(),
            Column::from_values(
                "seen",
                ColumnType::DateTime,
                vec![
                    CellValue::DateTime(dt(2024, 1, 2)),
                    CellValue::Null,
                    CellValue::DateTime(dt(1969, 12, 31)),
                ],
            )
            .unwrap(),
            Column::from_values(
                "city",
                ColumnType::Categorical,
                vec![
                    CellValue::Text("paris".into()),
                    CellValue::Text("berlin".into()),
                    CellValue::Text("paris".into()),
                ],
            )
            .unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_round_trip_all_six_types() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("all.feather");
        let table = six_type_table();

        write(&path, &table).unwrap();
        let loaded = read(&path).unwrap();

        assert_eq!(loaded.n_rows(), table.n_rows());
        assert_eq!(loaded.n_cols(), table.n_cols());
        for (col, column) in table.columns().iter().enumerate() {
            assert_eq!(
                loaded.column(col).unwrap().name,
                column.name,
                "column {col} name"
            );
            assert_eq!(
                loaded.column(col).unwrap().column_type(),
                column.column_type(),
                "column {col} type"
            );
            for row in 0..table.n_rows() {
                assert_eq!(
                    loaded.get_cell(row, col).unwrap(),
                    table.get_cell(row, col).unwrap(),
                    "cell ({row}, {col})"
                );
            }
        }
    }

    #[test]
    fn test_round_trip_empty_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.feather");
        write(&path, &Table::empty()).unwrap();
        let loaded = read(&path).unwrap();
        assert_eq!(loaded.n_cols(), 0);
        assert_eq!(loaded.n_rows(), 0);
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let err = read(Path::new("/nonexistent/nope.feather")).unwrap_err();
        assert!(matches!(err, IoError::Io(_)));
    }

    #[test]
    fn test_read_junk_file_is_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("junk.feather");
        fs::write(&path, b"definitely not an arrow file").unwrap();
        let err = read(&path).unwrap_err();
        assert!(matches!(err, IoError::Arrow(_) | IoError::Io(_)));
    }

    #[test]
    fn test_read_concatenates_batches() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("batches.feather");

        let schema = Arc::new(Schema::new(vec![Field::new("n", DataType::Int64, true)]));
        let file = File::create(&path).unwrap();
        let mut writer = FileWriter::try_new(file, &schema).unwrap();
        for chunk in [vec![Some(1), Some(2)], vec![None, Some(4)]] {
            let batch = RecordBatch::try_new(
                schema.clone(),
                vec![Arc::new(Int64Array::from(chunk)) as ArrayRef],
            )
            .unwrap();
            writer.write(&batch).unwrap();
        }
        writer.finish().unwrap();

        let table = read(&path).unwrap();
        assert_eq!(table.n_rows(), 4);
        assert_eq!(table.get_cell(1, 0).unwrap(), CellValue::Int(2));
        assert_eq!(table.get_cell(2, 0).unwrap(), CellValue::Null);
        assert_eq!(table.get_cell(3, 0).unwrap(), CellValue::Int(4));
    }

    #[test]
    fn test_read_narrow_ints_widen_to_integer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("narrow.feather");

        let schema = Arc::new(Schema::new(vec![Field::new("n", DataType::Int16, true)]));
        let file = File::create(&path).unwrap();
        let mut writer = FileWriter::try_new(file, &schema).unwrap();
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(arrow_array::Int16Array::from(vec![
                Some(-7),
                None,
                Some(123),
            ])) as ArrayRef],
        )
        .unwrap();
        writer.write(&batch).unwrap();
        writer.finish().unwrap();

        let table = read(&path).unwrap();
        assert_eq!(table.column_type(0).unwrap(), ColumnType::Integer);
        assert_eq!(table.get_cell(0, 0).unwrap(), CellValue::Int(-7));
        assert_eq!(table.get_cell(2, 0).unwrap(), CellValue::Int(123));
    }

    #[test]
    fn test_categorical_survives_with_labels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cat.feather");
        let table = Table::new(vec![Column::from_values(
            "city",
            ColumnType::Categorical,
            vec![
                CellValue::Text("b".into()),
                CellValue::Null,
                CellValue::Text("a".into()),
                CellValue::Text("b".into()),
            ],
        )
        .unwrap()])
        .unwrap();

        write(&path, &table).unwrap();
        let loaded = read(&path).unwrap();
        assert_eq!(loaded.column_type(0).unwrap(), ColumnType::Categorical);
        assert_eq!(loaded.get_cell(0, 0).unwrap(), CellValue::Text("b".into()));
        assert_eq!(loaded.get_cell(1, 0).unwrap(), CellValue::Null);
        assert_eq!(loaded.get_cell(2, 0).unwrap(), CellValue::Text("a".into()));
    }
}
