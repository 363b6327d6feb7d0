use std::collections::{BTreeMap, HashMap};

use crate::data::frame::{Column, DType, Frame, Value};
use crate::error::{Error, Result};

/// A reduction over a single source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFn {
    Max,
    Min,
    Mean,
    Sum,
    /// Number of non-null cells in the group. Group size is recoverable by
    /// counting the key column, which is never null after normalization.
    Count,
    First,
    Last,
}

#[derive(Debug, Clone)]
pub struct Reduction {
    pub source: String,
    pub agg: AggFn,
}

impl Reduction {
    pub fn new(source: impl Into<String>, agg: AggFn) -> Self {
        Reduction {
            source: source.into(),
            agg,
        }
    }
}

/// Decides, from a frame's column set alone, which reductions to compute.
///
/// The mapping is output-column-name → reduction; a `BTreeMap` so output
/// column order is deterministic. Pure: two frames with the same columns
/// must yield the same mapping.
pub trait AggregationCatalog {
    fn reductions(&self, frame: &Frame) -> BTreeMap<String, Reduction>;
}

/// Default catalog matching the suffix schema: numeric, date and bool
/// columns reduce to their max (`max_{col}`), string columns to their last
/// value (`last_{col}`). The key column and `num_group*` index columns are
/// never aggregated.
pub struct SuffixCatalog {
    key_column: String,
}

impl SuffixCatalog {
    pub fn new(key_column: impl Into<String>) -> Self {
        SuffixCatalog {
            key_column: key_column.into(),
        }
    }
}

impl AggregationCatalog for SuffixCatalog {
    fn reductions(&self, frame: &Frame) -> BTreeMap<String, Reduction> {
        let mut exprs = BTreeMap::new();
        for col in frame.columns() {
            let name = col.name();
            if name == self.key_column || name.starts_with("num_group") {
                continue;
            }
            let (prefix, agg) = match col.dtype() {
                DType::Utf8 => ("last", AggFn::Last),
                _ => ("max", AggFn::Max),
            };
            exprs.insert(format!("{prefix}_{name}"), Reduction::new(name, agg));
        }
        exprs
    }
}

/// Collapse a many-rows-per-key frame to exactly one row per distinct key.
///
/// Output rows follow first-seen key order; output columns are the key
/// followed by the catalog's reductions in mapping order.
pub fn aggregate_by_key(
    frame: &Frame,
    key: &str,
    catalog: &dyn AggregationCatalog,
) -> Result<Frame> {
    let key_col = frame
        .column(key)
        .ok_or_else(|| Error::Aggregation(format!("key column '{key}' not in frame")))?;

    // Group row indices by key, preserving first-seen order.
    let mut group_of: HashMap<Value, usize> = HashMap::new();
    let mut keys: Vec<Value> = Vec::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (row, k) in key_col.values().iter().enumerate() {
        let g = *group_of.entry(k.clone()).or_insert_with(|| {
            keys.push(k.clone());
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[g].push(row);
    }

    let exprs = catalog.reductions(frame);

    let mut columns = Vec::with_capacity(exprs.len() + 1);
    columns.push(Column::new(key, key_col.dtype(), keys));

    for (out_name, reduction) in &exprs {
        let source = frame.column(&reduction.source).ok_or_else(|| {
            Error::Aggregation(format!(
                "catalog references unknown column '{}'",
                reduction.source
            ))
        })?;
        let mut values = Vec::with_capacity(groups.len());
        for rows in &groups {
            values.push(reduce(source, rows, reduction.agg).map_err(|reason| {
                Error::Aggregation(format!("{out_name}: {reason}"))
            })?);
        }
        let dtype = output_dtype(source.dtype(), reduction.agg);
        columns.push(Column::new(out_name.clone(), dtype, values));
    }

    Frame::from_columns(columns)
}

fn output_dtype(source: DType, agg: AggFn) -> DType {
    match agg {
        AggFn::Count => DType::Int64,
        AggFn::Mean => DType::Float64,
        AggFn::Sum => source,
        _ => source,
    }
}

fn reduce(col: &Column, rows: &[usize], agg: AggFn) -> std::result::Result<Value, String> {
    let cells = || rows.iter().map(|&i| col.value(i));
    let non_null = || cells().filter(|v| !v.is_null());

    match agg {
        AggFn::Max => Ok(non_null().max().cloned().unwrap_or(Value::Null)),
        AggFn::Min => Ok(non_null().min().cloned().unwrap_or(Value::Null)),
        AggFn::First => Ok(rows.first().map(|&i| col.value(i).clone()).unwrap_or(Value::Null)),
        AggFn::Last => Ok(rows.last().map(|&i| col.value(i).clone()).unwrap_or(Value::Null)),
        AggFn::Count => Ok(Value::Int(non_null().count() as i64)),
        AggFn::Mean | AggFn::Sum => {
            let mut sum = 0.0;
            let mut n = 0usize;
            for v in non_null() {
                let x = v.as_f64().ok_or_else(|| {
                    format!("non-numeric cell {v:?} in column '{}'", col.name())
                })?;
                sum += x;
                n += 1;
            }
            if n == 0 {
                return Ok(Value::Null);
            }
            match agg {
                AggFn::Mean => Ok(Value::Float(sum / n as f64)),
                _ => match col.dtype() {
                    DType::Int64 => Ok(Value::Int(sum as i64)),
                    _ => Ok(Value::Float(sum)),
                },
            }
        }
    }
}
