use std::path::{Path, PathBuf};

use arrow::array::{Array, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::data::aggregate::{aggregate_by_key, AggregationCatalog, SuffixCatalog};
use crate::data::frame::{Column, DType, Frame, Value};
use crate::data::schema::{SuffixNormalizer, TypeNormalizer};
use crate::error::{Error, Result};

/// Cardinality of a read relative to the entity: depth-1 and depth-2 sources
/// hold many rows per case and must be aggregated before merging. Depth is a
/// property of the read operation, supplied by the caller, never inferred
/// from the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    One,
    Two,
}

impl TryFrom<u8> for Depth {
    type Error = Error;

    fn try_from(level: u8) -> Result<Depth> {
        match level {
            1 => Ok(Depth::One),
            2 => Ok(Depth::Two),
            other => Err(Error::Aggregation(format!("unsupported depth {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// ShardReader – public entry-point
// ---------------------------------------------------------------------------

/// Reads parquet shards into one-row-per-case feature blocks.
///
/// Carries its collaborators explicitly (the type normalizer, the
/// aggregation catalog and the entity-key column name) so no global data
/// locations are baked in.
pub struct ShardReader {
    key_column: String,
    normalizer: Box<dyn TypeNormalizer>,
    catalog: Box<dyn AggregationCatalog>,
}

impl ShardReader {
    pub fn new(
        key_column: impl Into<String>,
        normalizer: Box<dyn TypeNormalizer>,
        catalog: Box<dyn AggregationCatalog>,
    ) -> Self {
        ShardReader {
            key_column: key_column.into(),
            normalizer,
            catalog,
        }
    }

    /// Reader with the production suffix-convention schema and catalog.
    pub fn with_suffix_rules(key_column: impl Into<String>) -> Self {
        let key = key_column.into();
        ShardReader {
            normalizer: Box::new(SuffixNormalizer::new(key.clone())),
            catalog: Box::new(SuffixCatalog::new(key.clone())),
            key_column: key,
        }
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Read one shard file: decode → normalize dtypes → aggregate by key
    /// when a depth is supplied.
    pub fn read_single(&self, path: &Path, depth: Option<Depth>) -> Result<Frame> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let frame = read_parquet(path)?;
        debug!(
            "loaded {} ({} rows, {} cols)",
            path.display(),
            frame.n_rows(),
            frame.n_cols()
        );
        let frame = self.normalizer.normalize(frame)?;
        match depth {
            Some(_) => aggregate_by_key(&frame, &self.key_column, self.catalog.as_ref()),
            None => Ok(frame),
        }
    }

    /// Read every shard matching a glob pattern and merge into one block.
    ///
    /// Matched paths are sorted lexicographically before reading so the
    /// concatenation order, and therefore the keep-first dedup, is
    /// reproducible across platforms. A pattern that matches nothing is
    /// `NotFound`: silently producing an empty block would corrupt the
    /// downstream feature join.
    pub fn read_many(&self, pattern: &str, depth: Option<Depth>) -> Result<Frame> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in glob::glob(pattern)? {
            paths.push(entry.map_err(|e| Error::Io(e.into_error()))?);
        }
        paths.sort();
        if paths.is_empty() {
            return Err(Error::NotFound(PathBuf::from(pattern)));
        }

        let mut chunks = Vec::with_capacity(paths.len());
        for path in &paths {
            chunks.push(self.read_single(path, depth)?);
        }
        let merged = Frame::vstack_relaxed(chunks)?;
        let deduped = merged.unique_by_key(&self.key_column)?;
        info!(
            "merged {} shard(s) for '{pattern}': {} rows, {} unique cases",
            paths.len(),
            merged.n_rows(),
            deduped.n_rows()
        );
        Ok(deduped)
    }
}

// ---------------------------------------------------------------------------
// Parquet → Frame decoding
// ---------------------------------------------------------------------------

/// Decode a parquet file into a [`Frame`], mapping Arrow physical types onto
/// the canonical cell types: any integer width → Int64, any float → Float64,
/// Utf8/LargeUtf8 → Str, Boolean → Bool, dates and timestamps → Date (via
/// their textual rendering). Anything else is a schema error.
pub fn read_parquet(path: &Path) -> Result<Frame> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;

    let mut columns: Vec<(String, DType, Vec<Value>)> = schema
        .fields()
        .iter()
        .map(|f| {
            frame_dtype(f.data_type())
                .map(|dt| (f.name().clone(), dt, Vec::new()))
                .ok_or_else(|| {
                    Error::schema(f.name(), format!("unsupported type {:?}", f.data_type()))
                })
        })
        .collect::<Result<_>>()?;

    for batch_result in reader {
        let batch = batch_result?;
        for (idx, (name, dtype, values)) in columns.iter_mut().enumerate() {
            decode_column(batch.column(idx).as_ref(), *dtype, values)
                .map_err(|reason| Error::schema(name.as_str(), reason))?;
        }
    }

    Frame::from_columns(
        columns
            .into_iter()
            .map(|(name, dtype, values)| Column::new(name, dtype, values))
            .collect(),
    )
}

fn frame_dtype(dt: &DataType) -> Option<DType> {
    use DataType::*;
    match dt {
        Int8 | Int16 | Int32 | Int64 | UInt8 | UInt16 | UInt32 => Some(DType::Int64),
        Float16 | Float32 | Float64 => Some(DType::Float64),
        Utf8 | LargeUtf8 => Some(DType::Utf8),
        Boolean => Some(DType::Bool),
        Date32 | Date64 | Timestamp(_, _) => Some(DType::Date),
        _ => None,
    }
}

/// Append one Arrow column's cells to `values`. Narrow types are widened
/// with the cast kernel first so a single downcast per target suffices.
fn decode_column(
    col: &dyn Array,
    dtype: DType,
    values: &mut Vec<Value>,
) -> std::result::Result<(), String> {
    let n = col.len();
    match dtype {
        DType::Int64 => {
            let arr = cast(col, &DataType::Int64).map_err(|e| e.to_string())?;
            let arr = arr
                .as_any()
                .downcast_ref::<Int64Array>()
                .ok_or("expected Int64Array")?;
            for i in 0..n {
                values.push(if arr.is_null(i) {
                    Value::Null
                } else {
                    Value::Int(arr.value(i))
                });
            }
        }
        DType::Float64 => {
            let arr = cast(col, &DataType::Float64).map_err(|e| e.to_string())?;
            let arr = arr
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or("expected Float64Array")?;
            for i in 0..n {
                values.push(if arr.is_null(i) {
                    Value::Null
                } else {
                    Value::Float(arr.value(i))
                });
            }
        }
        DType::Utf8 | DType::Date => {
            let arr = cast(col, &DataType::Utf8).map_err(|e| e.to_string())?;
            let arr = arr
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or("expected StringArray")?;
            for i in 0..n {
                values.push(if arr.is_null(i) {
                    Value::Null
                } else if dtype == DType::Date {
                    Value::Date(arr.value(i).to_string())
                } else {
                    Value::Str(arr.value(i).to_string())
                });
            }
        }
        DType::Bool => {
            let arr = col
                .as_any()
                .downcast_ref::<BooleanArray>()
                .ok_or("expected BooleanArray")?;
            for i in 0..n {
                values.push(if arr.is_null(i) {
                    Value::Null
                } else {
                    Value::Bool(arr.value(i))
                });
            }
        }
    }
    Ok(())
}
