//! Parquet storage for dataset tables
//!
//! The table index is stored as a `client_id` string column. On read the
//! index column is taken from pandas metadata when present, then from a
//! `client_id` column, and otherwise rows are numbered.

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Float64Type, Int32Type, Int64Type, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde_json::Value;
use std::fmt::Display;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use uplift_core::{Error, Result};

use crate::dataset::Table;

/// Name of the index column written alongside the data columns
pub const INDEX_COLUMN: &str = "client_id";

const SECONDS_PER_DAY: i64 = 86_400;

fn parquet_error(path: &Path, e: impl Display) -> Error {
    Error::codec(format!("{}: {}", path.display(), e))
}

/// Read a parquet file into a table
pub fn read_parquet(path: &Path) -> Result<Table> {
    let file = File::open(path)
        .map_err(|e| Error::config(format!("failed to open {}: {}", path.display(), e)))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| parquet_error(path, e))?;
    let schema = builder.schema().clone();
    let index_pos = index_position(&schema);
    let reader = builder.build().map_err(|e| parquet_error(path, e))?;

    let columns: Vec<String> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != index_pos)
        .map(|(_, f)| f.name().clone())
        .collect();

    let mut table = Table {
        columns,
        index: Vec::new(),
        data: Vec::new(),
    };

    for batch in reader {
        let batch = batch.map_err(|e| parquet_error(path, e))?;
        let values = schema
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, array)| column_values(field.name(), array))
            .collect::<Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            let id = match index_pos {
                Some(pos) => match &values[pos][row] {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
                None => table.index.len().to_string(),
            };
            table.index.push(id);
            table.data.push(
                values
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| Some(*i) != index_pos)
                    .map(|(_, column)| column[row].clone())
                    .collect(),
            );
        }
    }

    debug!(
        "Read {} rows x {} columns from {}",
        table.len(),
        table.columns.len(),
        path.display()
    );
    Ok(table)
}

/// Write a table as a snappy-compressed parquet file
pub fn write_parquet(table: &Table, path: &Path) -> Result<()> {
    if table.columns.iter().any(|c| c == INDEX_COLUMN) {
        return Err(Error::config(format!(
            "column name '{}' is reserved for the index",
            INDEX_COLUMN
        )));
    }

    let mut fields = vec![Field::new(INDEX_COLUMN, DataType::Utf8, false)];
    let mut arrays: Vec<ArrayRef> = vec![Arc::new(StringArray::from(table.index.clone()))];
    for (j, name) in table.columns.iter().enumerate() {
        let values: Vec<&Value> = table.data.iter().map(|row| &row[j]).collect();
        let array = column_array(&values);
        fields.push(Field::new(name.as_str(), array.data_type().clone(), true));
        arrays.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).map_err(|e| parquet_error(path, e))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut writer =
        ArrowWriter::try_new(File::create(path)?, schema, Some(props)).map_err(|e| parquet_error(path, e))?;
    writer.write(&batch).map_err(|e| parquet_error(path, e))?;
    writer.close().map_err(|e| parquet_error(path, e))?;
    Ok(())
}

fn index_position(schema: &Schema) -> Option<usize> {
    let pandas_index = schema
        .metadata()
        .get("pandas")
        .and_then(|meta| serde_json::from_str::<Value>(meta).ok())
        .and_then(|meta| meta.get("index_columns")?.as_array()?.first()?.as_str().map(str::to_string));

    pandas_index
        .into_iter()
        .chain(std::iter::once(INDEX_COLUMN.to_string()))
        .find_map(|name| schema.index_of(&name).ok())
}

/// Narrowest arrow type holding every value of a column
fn column_array(values: &[&Value]) -> ArrayRef {
    let present: Vec<&Value> = values.iter().copied().filter(|v| !v.is_null()).collect();

    if !present.is_empty() && present.iter().all(|v| v.is_boolean()) {
        Arc::new(BooleanArray::from(
            values.iter().map(|v| v.as_bool()).collect::<Vec<_>>(),
        ))
    } else if !present.is_empty() && present.iter().all(|v| v.is_i64()) {
        Arc::new(Int64Array::from(
            values.iter().map(|v| v.as_i64()).collect::<Vec<_>>(),
        ))
    } else if present.iter().all(|v| v.is_number()) {
        Arc::new(Float64Array::from(
            values.iter().map(|v| v.as_f64()).collect::<Vec<_>>(),
        ))
    } else {
        Arc::new(StringArray::from(
            values
                .iter()
                .map(|v| match v {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                })
                .collect::<Vec<_>>(),
        ))
    }
}

fn collect_values<A: Array>(array: &A, value: impl Fn(usize) -> Value) -> Vec<Value> {
    (0..array.len())
        .map(|i| if array.is_null(i) { Value::Null } else { value(i) })
        .collect()
}

/// Convert an arrow column to JSON values.
///
/// Timestamps become epoch seconds and dates become the epoch seconds of
/// midnight, matching how the retail features encode times.
fn column_values(name: &str, array: &ArrayRef) -> Result<Vec<Value>> {
    let cast_to = |to: &DataType| {
        cast(array.as_ref(), to)
            .map_err(|e| Error::codec(format!("column '{}': {}", name, e)))
    };

    let values = match array.data_type() {
        DataType::Boolean => {
            let a = array.as_boolean();
            collect_values(a, |i| Value::Bool(a.value(i)))
        }
        t if t.is_integer() => {
            let casted = cast_to(&DataType::Int64)?;
            let a = casted.as_primitive::<Int64Type>();
            collect_values(a, |i| Value::from(a.value(i)))
        }
        t if t.is_floating() || matches!(t, DataType::Decimal128(..)) => {
            let casted = cast_to(&DataType::Float64)?;
            let a = casted.as_primitive::<Float64Type>();
            collect_values(a, |i| Value::from(a.value(i)))
        }
        DataType::Timestamp(unit, _) => {
            let per_second = match unit {
                TimeUnit::Second => 1,
                TimeUnit::Millisecond => 1_000,
                TimeUnit::Microsecond => 1_000_000,
                TimeUnit::Nanosecond => 1_000_000_000,
            };
            let casted = cast_to(&DataType::Int64)?;
            let a = casted.as_primitive::<Int64Type>();
            collect_values(a, |i| {
                let raw = a.value(i);
                if raw % per_second == 0 {
                    Value::from(raw / per_second)
                } else {
                    Value::from(raw as f64 / per_second as f64)
                }
            })
        }
        DataType::Date32 => {
            let casted = cast_to(&DataType::Int32)?;
            let a = casted.as_primitive::<Int32Type>();
            collect_values(a, |i| Value::from(a.value(i) as i64 * SECONDS_PER_DAY))
        }
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View | DataType::Dictionary(..) => {
            let casted = cast_to(&DataType::Utf8)?;
            let a = casted.as_string::<i32>();
            collect_values(a, |i| Value::String(a.value(i).to_string()))
        }
        other => {
            return Err(Error::codec(format!(
                "column '{}' has unsupported type {}",
                name, other
            )))
        }
    };
    Ok(values)
}
