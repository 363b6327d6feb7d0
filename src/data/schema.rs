use crate::data::frame::{Column, DType, Frame, Value};
use crate::error::{Error, Result};

/// Retypes a freshly loaded frame to its canonical schema.
///
/// Implementations must be pure: same rows out as in, only dtypes change.
/// Un-coercible cells surface [`Error::Schema`] naming the column.
pub trait TypeNormalizer {
    fn normalize(&self, frame: Frame) -> Result<Frame>;
}

/// Identity normalizer for sources that are already canonically typed.
pub struct NoopNormalizer;

impl TypeNormalizer for NoopNormalizer {
    fn normalize(&self, frame: Frame) -> Result<Frame> {
        Ok(frame)
    }
}

/// The production rule set: the trailing letter of a column name encodes its
/// dtype.
///
/// * key column, `num_group1`, `num_group2` → Int64
/// * `…P` (payments), `…A` (amounts)       → Float64
/// * `…M` (categorical markers)            → Utf8
/// * `…D` (dates)                          → Date
/// * anything else keeps its loaded dtype
pub struct SuffixNormalizer {
    key_column: String,
}

impl SuffixNormalizer {
    pub fn new(key_column: impl Into<String>) -> Self {
        SuffixNormalizer {
            key_column: key_column.into(),
        }
    }

    fn target_dtype(&self, name: &str) -> Option<DType> {
        if name == self.key_column || name.starts_with("num_group") {
            return Some(DType::Int64);
        }
        match name.chars().last() {
            Some('P') | Some('A') => Some(DType::Float64),
            Some('M') => Some(DType::Utf8),
            Some('D') => Some(DType::Date),
            _ => None,
        }
    }
}

impl TypeNormalizer for SuffixNormalizer {
    fn normalize(&self, mut frame: Frame) -> Result<Frame> {
        let casts: Vec<(String, DType)> = frame
            .columns()
            .iter()
            .filter_map(|c| {
                self.target_dtype(c.name())
                    .filter(|&t| t != c.dtype())
                    .map(|t| (c.name().to_string(), t))
            })
            .collect();

        for (name, target) in casts {
            let col = frame.column(&name).expect("column listed above");
            let values: Result<Vec<Value>> = col
                .values()
                .iter()
                .map(|v| cast_value(v, target).ok_or_else(|| uncoercible(&name, v, target)))
                .collect();
            frame.replace_column(Column::new(name, target, values?))?;
        }
        Ok(frame)
    }
}

fn uncoercible(column: &str, value: &Value, target: DType) -> Error {
    Error::schema(column, format!("cannot coerce {value:?} to {target:?}"))
}

/// Lossless-enough cast used during normalization. `None` means un-coercible.
fn cast_value(v: &Value, target: DType) -> Option<Value> {
    if v.is_null() {
        return Some(Value::Null);
    }
    match target {
        DType::Int64 => match v {
            Value::Int(i) => Some(Value::Int(*i)),
            Value::Float(f) if f.fract() == 0.0 => Some(Value::Int(*f as i64)),
            Value::Str(s) => s.trim().parse().ok().map(Value::Int),
            _ => None,
        },
        DType::Float64 => match v {
            Value::Float(f) => Some(Value::Float(*f)),
            Value::Int(i) => Some(Value::Float(*i as f64)),
            Value::Str(s) => s.trim().parse().ok().map(Value::Float),
            _ => None,
        },
        DType::Utf8 => Some(Value::Str(v.to_string())),
        DType::Date => match v {
            Value::Date(d) => Some(Value::Date(d.clone())),
            Value::Str(s) => Some(Value::Date(s.clone())),
            _ => None,
        },
        DType::Bool => match v {
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::Int(0) => Some(Value::Bool(false)),
            Value::Int(1) => Some(Value::Bool(true)),
            _ => None,
        },
    }
}
