//! Loader behavior over real parquet shards on disk.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tempfile::TempDir;

use casescore::data::frame::Value;
use casescore::{Depth, Error, ShardReader};

fn write_shard(path: &Path, columns: Vec<(&str, ArrayRef)>) {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, arr)| Field::new(*name, arr.data_type().clone(), true))
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let batch =
        RecordBatch::try_new(schema.clone(), columns.into_iter().map(|(_, a)| a).collect())
            .unwrap();
    let file = std::fs::File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn int_array(vals: &[i64]) -> ArrayRef {
    Arc::new(Int64Array::from(vals.to_vec()))
}

fn float_array(vals: &[f64]) -> ArrayRef {
    Arc::new(Float64Array::from(vals.to_vec()))
}

fn str_array(vals: &[&str]) -> ArrayRef {
    Arc::new(StringArray::from(vals.to_vec()))
}

fn reader() -> ShardReader {
    ShardReader::with_suffix_rules("case_id")
}

#[test]
fn read_many_merges_and_dedups_across_shards() {
    let dir = TempDir::new().unwrap();
    write_shard(
        &dir.path().join("a.parquet"),
        vec![
            ("case_id", int_array(&[1, 2])),
            ("credamount_A", float_array(&[100.0, 200.0])),
        ],
    );
    write_shard(
        &dir.path().join("b.parquet"),
        vec![
            ("case_id", int_array(&[2, 3])),
            ("credamount_A", float_array(&[999.0, 300.0])),
        ],
    );

    let pattern = dir.path().join("*.parquet");
    let frame = reader()
        .read_many(&pattern.to_string_lossy(), None)
        .unwrap();

    assert_eq!(frame.n_rows(), 3);
    // keep-first in lexicographic path order: key 2 comes from a.parquet
    assert_eq!(frame.value(1, "case_id"), Some(&Value::Int(2)));
    assert_eq!(frame.value(1, "credamount_A"), Some(&Value::Float(200.0)));
}

#[test]
fn read_many_output_has_unique_keys() {
    let dir = TempDir::new().unwrap();
    write_shard(
        &dir.path().join("x.parquet"),
        vec![("case_id", int_array(&[5, 5, 6]))],
    );
    write_shard(
        &dir.path().join("y.parquet"),
        vec![("case_id", int_array(&[6, 7, 5]))],
    );

    let pattern = dir.path().join("*.parquet");
    let frame = reader()
        .read_many(&pattern.to_string_lossy(), None)
        .unwrap();

    let mut keys: Vec<i64> = frame
        .column("case_id")
        .unwrap()
        .values()
        .iter()
        .map(|v| match v {
            Value::Int(i) => *i,
            other => panic!("unexpected key {other:?}"),
        })
        .collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), frame.n_rows());
}

#[test]
fn single_file_pattern_matches_read_single() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("only.parquet");
    write_shard(
        &path,
        vec![
            ("case_id", int_array(&[1, 2, 3])),
            ("credamount_A", float_array(&[10.0, 20.0, 30.0])),
        ],
    );

    let single = reader().read_single(&path, None).unwrap();
    let many = reader()
        .read_many(&path.to_string_lossy(), None)
        .unwrap();

    assert_eq!(single.n_rows(), many.n_rows());
    for row in 0..single.n_rows() {
        assert_eq!(single.value(row, "case_id"), many.value(row, "case_id"));
        assert_eq!(
            single.value(row, "credamount_A"),
            many.value(row, "credamount_A")
        );
    }
}

#[test]
fn depth_one_aggregates_to_one_row_per_case() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prev.parquet");
    write_shard(
        &path,
        vec![
            ("case_id", int_array(&[10, 10, 10, 20])),
            ("num_group1", int_array(&[0, 1, 2, 0])),
            ("prevamount_A", float_array(&[1.0, 7.0, 4.0, 2.0])),
            ("status_M", str_array(&["open", "closed", "open", "closed"])),
        ],
    );

    let frame = reader().read_single(&path, Some(Depth::One)).unwrap();
    assert_eq!(frame.n_rows(), 2);
    assert_eq!(frame.value(0, "case_id"), Some(&Value::Int(10)));
    assert_eq!(frame.value(0, "max_prevamount_A"), Some(&Value::Float(7.0)));
    assert_eq!(frame.value(0, "last_status_M"), Some(&Value::Str("open".into())));
    // index columns are never aggregated
    assert!(frame.column("num_group1").is_none());
}

#[test]
fn read_many_tolerates_differing_column_sets() {
    let dir = TempDir::new().unwrap();
    write_shard(
        &dir.path().join("a.parquet"),
        vec![
            ("case_id", int_array(&[1])),
            ("credamount_A", float_array(&[50.0])),
        ],
    );
    write_shard(
        &dir.path().join("b.parquet"),
        vec![
            ("case_id", int_array(&[2])),
            ("education_M", str_array(&["primary"])),
        ],
    );

    let pattern = dir.path().join("*.parquet");
    let frame = reader()
        .read_many(&pattern.to_string_lossy(), None)
        .unwrap();

    assert_eq!(frame.n_rows(), 2);
    assert_eq!(frame.value(0, "education_M"), Some(&Value::Null));
    assert_eq!(frame.value(1, "credamount_A"), Some(&Value::Null));
}

#[test]
fn empty_glob_match_is_not_found() {
    let dir = TempDir::new().unwrap();
    let pattern = dir.path().join("missing_*.parquet");
    let result = reader().read_many(&pattern.to_string_lossy(), None);
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[test]
fn missing_path_is_not_found() {
    let dir = TempDir::new().unwrap();
    let result = reader().read_single(&dir.path().join("ghost.parquet"), None);
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[test]
fn normalization_retypes_suffix_columns_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("static.parquet");
    // amount written as integers; the suffix rules promote it to Float64
    write_shard(
        &path,
        vec![
            ("case_id", int_array(&[1])),
            ("credamount_A", int_array(&[2500])),
        ],
    );

    let frame = reader().read_single(&path, None).unwrap();
    assert_eq!(frame.value(0, "credamount_A"), Some(&Value::Float(2500.0)));
}

#[test]
fn depth_aggregation_composes_with_multi_shard_dedup() {
    let dir = TempDir::new().unwrap();
    // both shards carry rows for case 1; aggregation happens per shard,
    // then the first shard's aggregate wins the dedup
    write_shard(
        &dir.path().join("p0.parquet"),
        vec![
            ("case_id", int_array(&[1, 1])),
            ("prevamount_A", float_array(&[5.0, 9.0])),
        ],
    );
    write_shard(
        &dir.path().join("p1.parquet"),
        vec![
            ("case_id", int_array(&[1, 2])),
            ("prevamount_A", float_array(&[100.0, 3.0])),
        ],
    );

    let pattern = dir.path().join("p*.parquet");
    let frame = reader()
        .read_many(&pattern.to_string_lossy(), Some(Depth::One))
        .unwrap();

    assert_eq!(frame.n_rows(), 2);
    assert_eq!(frame.value(0, "max_prevamount_A"), Some(&Value::Float(9.0)));
    assert_eq!(frame.value(1, "max_prevamount_A"), Some(&Value::Float(3.0)));
}
