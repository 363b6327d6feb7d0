use std::collections::HashSet;
use std::fmt;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// Canonical dtypes a column can carry after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Int64,
    Float64,
    Utf8,
    Bool,
    /// ISO-8601 date kept as text; ordering on the string is chronological.
    Date,
}

/// A dynamically-typed cell value.
/// Used as a dedup key downstream, so `Value` must be `Ord` and `Hash`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Date(String),
    Null,
}

// -- Manual Eq/Ord/Hash so Value can key maps and sets --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Int(_) => 2,
                Float(_) => 3,
                Str(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Str(a), Str(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Str(s) | Value::Date(s) => s.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Null => write!(f, ""),
        }
    }
}

impl Value {
    /// Interpret the value as `f64` (ints widen, everything else is None).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(i) => Some(*i as f64),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The dtype this cell naturally belongs to (`None` for nulls).
    pub fn dtype(&self) -> Option<DType> {
        match self {
            Value::Int(_) => Some(DType::Int64),
            Value::Float(_) => Some(DType::Float64),
            Value::Str(_) => Some(DType::Utf8),
            Value::Bool(_) => Some(DType::Bool),
            Value::Date(_) => Some(DType::Date),
            Value::Null => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Column – one named, typed column
// ---------------------------------------------------------------------------

/// A named column. Cells are expected to match `dtype` or be `Null`;
/// the loader and normalizer uphold this, the struct does not re-check.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    dtype: DType,
    values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: DType, values: Vec<Value>) -> Self {
        Column {
            name: name.into(),
            dtype,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, row: usize) -> &Value {
        &self.values[row]
    }

    /// Same column with every non-null cell rendered as a string.
    pub fn to_utf8(&self) -> Column {
        let values = self
            .values
            .iter()
            .map(|v| match v {
                Value::Null => Value::Null,
                other => Value::Str(other.to_string()),
            })
            .collect();
        Column::new(self.name.clone(), DType::Utf8, values)
    }

    fn take(&self, indices: &[usize]) -> Column {
        Column {
            name: self.name.clone(),
            dtype: self.dtype,
            values: indices.iter().map(|&i| self.values[i].clone()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Frame – the in-memory table
// ---------------------------------------------------------------------------

/// A columnar table: ordered columns of equal length.
/// Frames are passed by value and never mutated in place by the pipeline.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    columns: Vec<Column>,
}

impl Frame {
    /// Build a frame, checking that column names are unique and lengths agree.
    pub fn from_columns(columns: Vec<Column>) -> Result<Frame> {
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name().to_string()) {
                return Err(Error::schema(col.name(), "duplicate column name"));
            }
        }
        if let Some(first) = columns.first() {
            for col in &columns[1..] {
                if col.len() != first.len() {
                    return Err(Error::schema(
                        col.name(),
                        format!("length {} != {}", col.len(), first.len()),
                    ));
                }
            }
        }
        Ok(Frame { columns })
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(Column::name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Cell lookup; `None` when the column does not exist.
    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        self.column(name).map(|c| c.value(row))
    }

    /// Append a column, keeping the equal-length / unique-name invariants.
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.has_column(column.name()) {
            return Err(Error::schema(column.name(), "duplicate column name"));
        }
        if !self.columns.is_empty() && column.len() != self.n_rows() {
            return Err(Error::schema(
                column.name(),
                format!("length {} != {}", column.len(), self.n_rows()),
            ));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Replace a column in place (used by the normalizer). Name must exist.
    pub fn replace_column(&mut self, column: Column) -> Result<()> {
        match self.columns.iter_mut().find(|c| c.name() == column.name()) {
            Some(slot) => {
                *slot = column;
                Ok(())
            }
            None => Err(Error::schema(column.name(), "no such column")),
        }
    }

    /// New frame with the given rows, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Frame {
        Frame {
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
        }
    }

    /// Copy of the frame with the named columns rendered as Utf8.
    /// Fails if any requested column is missing.
    pub fn with_string_columns(&self, names: &[String]) -> Result<Frame> {
        let mut out = self.clone();
        for name in names {
            let cast = out
                .column(name)
                .ok_or_else(|| Error::schema(name, "no such column"))?
                .to_utf8();
            out.replace_column(cast)?;
        }
        Ok(out)
    }

    /// Keep the first row for each distinct value of `key`, preserving the
    /// order in which keys first appear.
    pub fn unique_by_key(&self, key: &str) -> Result<Frame> {
        let key_col = self
            .column(key)
            .ok_or_else(|| Error::schema(key, "no such column"))?;
        let mut seen = HashSet::new();
        let mut keep = Vec::new();
        for (i, v) in key_col.values().iter().enumerate() {
            if seen.insert(v.clone()) {
                keep.push(i);
            }
        }
        if keep.len() == self.n_rows() {
            return Ok(self.clone());
        }
        Ok(self.take_rows(&keep))
    }

    /// Relaxed vertical concatenation: the output column set is the union of
    /// all inputs (first-seen order); a column missing from a frame
    /// contributes nulls for that frame's rows. Int64 and Float64 columns
    /// unify to Float64; any other dtype conflict is a schema error.
    pub fn vstack_relaxed(frames: Vec<Frame>) -> Result<Frame> {
        let total_rows: usize = frames.iter().map(Frame::n_rows).sum();

        // Union of columns with unified dtypes.
        let mut order: Vec<String> = Vec::new();
        let mut dtypes: Vec<DType> = Vec::new();
        for frame in &frames {
            for col in frame.columns() {
                match order.iter().position(|n| n == col.name()) {
                    None => {
                        order.push(col.name().to_string());
                        dtypes.push(col.dtype());
                    }
                    Some(idx) => {
                        let unified = unify_dtypes(dtypes[idx], col.dtype())
                            .ok_or_else(|| {
                                Error::schema(
                                    col.name(),
                                    format!(
                                        "cannot concatenate {:?} with {:?}",
                                        dtypes[idx],
                                        col.dtype()
                                    ),
                                )
                            })?;
                        dtypes[idx] = unified;
                    }
                }
            }
        }

        let mut columns = Vec::with_capacity(order.len());
        for (name, dtype) in order.iter().zip(&dtypes) {
            let mut values = Vec::with_capacity(total_rows);
            for frame in &frames {
                match frame.column(name) {
                    Some(col) => {
                        for v in col.values() {
                            values.push(widen(v, *dtype));
                        }
                    }
                    None => values.extend(std::iter::repeat(Value::Null).take(frame.n_rows())),
                }
            }
            columns.push(Column::new(name.clone(), *dtype, values));
        }
        Frame::from_columns(columns)
    }
}

fn unify_dtypes(a: DType, b: DType) -> Option<DType> {
    use DType::*;
    match (a, b) {
        _ if a == b => Some(a),
        (Int64, Float64) | (Float64, Int64) => Some(Float64),
        _ => None,
    }
}

fn widen(v: &Value, target: DType) -> Value {
    match (v, target) {
        (Value::Int(i), DType::Float64) => Value::Float(*i as f64),
        _ => v.clone(),
    }
}
