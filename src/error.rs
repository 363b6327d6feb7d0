use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while loading shards or scoring cases.
///
/// All failures propagate immediately to the caller; the loader never
/// retries, skips a bad shard, or returns partial results.
#[derive(Debug, Error)]
pub enum Error {
    /// A shard path does not exist, or a glob pattern matched no files.
    #[error("no shard found: {}", .0.display())]
    NotFound(PathBuf),

    /// A column could not be coerced to its canonical dtype.
    #[error("schema error in column '{column}': {reason}")]
    Schema { column: String, reason: String },

    /// The aggregation catalog referenced an unknown or unsupported column.
    #[error("aggregation error: {0}")]
    Aggregation(String),

    /// Estimator outputs disagree on row or class counts.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("bad shard pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a schema failure on a named column.
    pub fn schema(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Schema {
            column: column.into(),
            reason: reason.into(),
        }
    }
}
