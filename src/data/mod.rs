/// Data layer: core table types, shard loading, normalization, aggregation.
///
/// Architecture:
/// ```text
///  *.parquet shards
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  decode file(s) → Frame, glob + concat + dedup
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  schema   │  suffix rules → canonical dtypes
///   └──────────┘
///        │ (depth 1/2 only)
///        ▼
///   ┌───────────┐
///   │ aggregate  │  group by case_id → one row per case
///   └───────────┘
/// ```
pub mod aggregate;
pub mod frame;
pub mod loader;
pub mod schema;
