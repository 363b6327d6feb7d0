//! casescore
//!
//! Assembles a flat, one-row-per-case feature table from a hierarchy of
//! parquet shards (depth 0 = one row per case; depth 1/2 = many rows per
//! case, aggregated by key before merging), then scores cases with a voting
//! ensemble of heterogeneous pre-trained classifiers.

pub mod data;
pub mod ensemble;
pub mod error;
pub mod models;
pub mod pipeline;

pub use data::frame::{Column, DType, Frame, Value};
pub use data::loader::{Depth, ShardReader};
pub use ensemble::{Estimator, Family, Member, VotingEnsemble};
pub use error::{Error, Result};
