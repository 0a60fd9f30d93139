//! Conversion of table datasets into Arrow record batches
//!
//! Columns are built by dispatching on the data type of the *target* field,
//! so the same dataset can be written against a schema produced here or
//! one derived from an Iceberg table (which carries field ids and uses
//! large binary offsets).

use arrow_array::{
    ArrayRef, BinaryArray, BooleanArray, Date32Array, Decimal128Array, Float32Array, Float64Array,
    Int32Array, Int64Array, LargeBinaryArray, LargeStringArray, RecordBatch, StringArray,
    TimestampMicrosecondArray,
};
use arrow_schema::{ArrowError, DataType, Field, Schema as ArrowSchema, SchemaRef, TimeUnit};
use chrono::Datelike;
use lakecopy_core::{LogicalType, Row, Schema, TableDataset, Value};
use std::sync::Arc;

/// Days from 0001-01-01 to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Time zone written on timestamp-with-time-zone columns
pub const UTC_TIME_ZONE: &str = "+00:00";

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Dataset has {actual} columns, target schema has {expected}")]
    ColumnCountMismatch { expected: usize, actual: usize },

    #[error("Column '{column}' is not nullable but row {row} is null")]
    NullInRequiredColumn { column: String, row: usize },

    #[error("Column '{column}' row {row}: value does not match {data_type}")]
    UnexpectedValue {
        column: String,
        row: usize,
        data_type: DataType,
    },

    #[error("Column '{column}' has unsupported type {data_type}")]
    UnsupportedType { column: String, data_type: DataType },

    #[error(transparent)]
    Arrow(#[from] ArrowError),
}

/// Arrow type a logical type is written as
pub fn arrow_type(ty: LogicalType) -> DataType {
    match ty {
        LogicalType::Bool => DataType::Boolean,
        LogicalType::Int => DataType::Int32,
        LogicalType::Long => DataType::Int64,
        LogicalType::Float => DataType::Float32,
        LogicalType::Double => DataType::Float64,
        LogicalType::Decimal { precision, scale } => DataType::Decimal128(precision as u8, scale as i8),
        LogicalType::String => DataType::Utf8,
        LogicalType::Binary => DataType::Binary,
        LogicalType::Date => DataType::Date32,
        LogicalType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
        LogicalType::TimestampTz => {
            DataType::Timestamp(TimeUnit::Microsecond, Some(UTC_TIME_ZONE.into()))
        }
    }
}

/// Arrow schema with one field per column
pub fn arrow_schema(schema: &Schema) -> ArrowSchema {
    let fields: Vec<Field> = schema
        .columns
        .iter()
        .map(|c| Field::new(&c.name, arrow_type(c.logical_type), c.nullable.is_nullable()))
        .collect();
    ArrowSchema::new(fields)
}

/// Build a single record batch holding every row of `dataset`
pub fn record_batch(dataset: &TableDataset, target: SchemaRef) -> Result<RecordBatch, ConvertError> {
    let expected = target.fields().len();
    let actual = dataset.schema().len();
    if expected != actual {
        return Err(ConvertError::ColumnCountMismatch { expected, actual });
    }

    let columns = target
        .fields()
        .iter()
        .enumerate()
        .map(|(idx, field)| build_column(field, idx, dataset.rows()))
        .collect::<Result<Vec<ArrayRef>, ConvertError>>()?;

    Ok(RecordBatch::try_new(target, columns)?)
}

/// Collect one column, rejecting nulls in required fields and values of the
/// wrong variant
fn extract<'a, T>(
    field: &Field,
    idx: usize,
    rows: &'a [Row],
    f: impl Fn(&'a Value) -> Option<T>,
) -> Result<Vec<Option<T>>, ConvertError> {
    rows.iter()
        .enumerate()
        .map(|(row, values)| match &values[idx] {
            Value::Null if field.is_nullable() => Ok(None),
            Value::Null => Err(ConvertError::NullInRequiredColumn {
                column: field.name().clone(),
                row,
            }),
            value => f(value).map(Some).ok_or_else(|| ConvertError::UnexpectedValue {
                column: field.name().clone(),
                row,
                data_type: field.data_type().clone(),
            }),
        })
        .collect()
}

fn build_column(field: &Field, idx: usize, rows: &[Row]) -> Result<ArrayRef, ConvertError> {
    let array: ArrayRef = match field.data_type() {
        DataType::Boolean => Arc::new(BooleanArray::from(extract(field, idx, rows, |v| match v {
            Value::Bool(b) => Some(*b),
            _ => None,
        })?)),
        DataType::Int32 => Arc::new(Int32Array::from(extract(field, idx, rows, |v| match v {
            Value::Int(i) => Some(*i),
            _ => None,
        })?)),
        DataType::Int64 => Arc::new(Int64Array::from(extract(field, idx, rows, |v| match v {
            Value::Long(i) => Some(*i),
            _ => None,
        })?)),
        DataType::Float32 => Arc::new(Float32Array::from(extract(field, idx, rows, |v| match v {
            Value::Float(x) => Some(*x),
            _ => None,
        })?)),
        DataType::Float64 => Arc::new(Float64Array::from(extract(field, idx, rows, |v| match v {
            Value::Double(x) => Some(*x),
            _ => None,
        })?)),
        DataType::Decimal128(precision, scale) => {
            let values = extract(field, idx, rows, |v| match v {
                Value::Decimal(d) => Some(*d),
                _ => None,
            })?;
            Arc::new(Decimal128Array::from(values).with_precision_and_scale(*precision, *scale)?)
        }
        DataType::Utf8 => Arc::new(StringArray::from(extract(field, idx, rows, |v| match v {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        })?)),
        DataType::LargeUtf8 => Arc::new(LargeStringArray::from(extract(field, idx, rows, |v| match v {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        })?)),
        DataType::Binary => Arc::new(BinaryArray::from(extract(field, idx, rows, |v| match v {
            Value::Binary(b) => Some(b.as_slice()),
            _ => None,
        })?)),
        DataType::LargeBinary => Arc::new(LargeBinaryArray::from(extract(field, idx, rows, |v| match v {
            Value::Binary(b) => Some(b.as_slice()),
            _ => None,
        })?)),
        DataType::Date32 => Arc::new(Date32Array::from(extract(field, idx, rows, |v| match v {
            Value::Date(d) => Some(d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE),
            _ => None,
        })?)),
        DataType::Timestamp(TimeUnit::Microsecond, None) => {
            Arc::new(TimestampMicrosecondArray::from(extract(field, idx, rows, |v| match v {
                Value::Timestamp(ts) => Some(ts.and_utc().timestamp_micros()),
                _ => None,
            })?))
        }
        DataType::Timestamp(TimeUnit::Microsecond, Some(tz)) => {
            let values = extract(field, idx, rows, |v| match v {
                Value::TimestampTz(ts) => Some(ts.timestamp_micros()),
                _ => None,
            })?;
            Arc::new(TimestampMicrosecondArray::from(values).with_timezone(tz.clone()))
        }
        other => {
            return Err(ConvertError::UnsupportedType {
                column: field.name().clone(),
                data_type: other.clone(),
            })
        }
    };

    Ok(array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::Array;
    use chrono::{NaiveDate, TimeZone, Utc};
    use lakecopy_core::{Column, Nullability};

    fn dataset() -> TableDataset {
        let schema = Schema::from_columns(vec![
            Column::new("id", LogicalType::Long).with_nullability(Nullability::No),
            Column::new("price", LogicalType::Decimal { precision: 10, scale: 2 }),
            Column::new("note", LogicalType::String),
            Column::new("day", LogicalType::Date),
            Column::new("at", LogicalType::TimestampTz),
        ]);
        let rows = vec![
            vec![
                Value::Long(1),
                Value::Decimal(1999),
                Value::String("first".to_string()),
                Value::Date(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()),
                Value::TimestampTz(Utc.timestamp_opt(1, 500_000_000).unwrap()),
            ],
            vec![Value::Long(2), Value::Null, Value::Null, Value::Null, Value::Null],
        ];
        TableDataset::new("orders", schema, rows).unwrap()
    }

    #[test]
    fn test_arrow_types() {
        assert_eq!(arrow_type(LogicalType::Int), DataType::Int32);
        assert_eq!(
            arrow_type(LogicalType::Decimal { precision: 38, scale: 18 }),
            DataType::Decimal128(38, 18)
        );
        assert_eq!(
            arrow_type(LogicalType::TimestampTz),
            DataType::Timestamp(TimeUnit::Microsecond, Some("+00:00".into()))
        );
    }

    #[test]
    fn test_record_batch() {
        let data = dataset();
        let schema = Arc::new(arrow_schema(data.schema()));
        let batch = record_batch(&data, schema).unwrap();

        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 5);

        let ids = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(ids.value(0), 1);
        assert_eq!(ids.value(1), 2);

        let prices = batch.column(1).as_any().downcast_ref::<Decimal128Array>().unwrap();
        assert_eq!(prices.value_as_string(0), "19.99");
        assert!(prices.is_null(1));

        let days = batch.column(3).as_any().downcast_ref::<Date32Array>().unwrap();
        assert_eq!(days.value(0), 1);

        let at = batch.column(4).as_any().downcast_ref::<TimestampMicrosecondArray>().unwrap();
        assert_eq!(at.value(0), 1_500_000);
    }

    #[test]
    fn test_large_types_from_target_schema() {
        let schema = Schema::from_columns(vec![
            Column::new("name", LogicalType::String),
            Column::new("blob", LogicalType::Binary),
        ]);
        let data = TableDataset::new(
            "files",
            schema,
            vec![vec![Value::String("a".to_string()), Value::Binary(vec![0xde, 0xad])]],
        )
        .unwrap();
        let target = Arc::new(ArrowSchema::new(vec![
            Field::new("name", DataType::LargeUtf8, true),
            Field::new("blob", DataType::LargeBinary, true),
        ]));

        let batch = record_batch(&data, target).unwrap();
        let blobs = batch.column(1).as_any().downcast_ref::<LargeBinaryArray>().unwrap();
        assert_eq!(blobs.value(0), &[0xde, 0xad]);
    }

    #[test]
    fn test_null_in_required_column() {
        let schema = Schema::from_columns(vec![
            Column::new("id", LogicalType::Long).with_nullability(Nullability::No),
        ]);
        let data = TableDataset::new("t", schema.clone(), vec![vec![Value::Null]]).unwrap();

        let err = record_batch(&data, Arc::new(arrow_schema(&schema))).unwrap_err();
        assert!(matches!(err, ConvertError::NullInRequiredColumn { row: 0, .. }));
    }

    #[test]
    fn test_column_count_mismatch() {
        let data = dataset();
        let target = Arc::new(ArrowSchema::new(vec![Field::new("id", DataType::Int64, false)]));

        assert!(matches!(
            record_batch(&data, target),
            Err(ConvertError::ColumnCountMismatch { expected: 1, actual: 5 })
        ));
    }

    #[test]
    fn test_empty_dataset() {
        let schema = Schema::from_columns(vec![Column::new("id", LogicalType::Int)]);
        let data = TableDataset::empty("t", schema.clone());

        let batch = record_batch(&data, Arc::new(arrow_schema(&schema))).unwrap();
        assert_eq!(batch.num_rows(), 0);
    }
}
