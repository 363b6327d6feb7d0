//! Generate a small deterministic shard set for trying out the pipeline:
//! a base table, a fanned-out depth-0 source, a depth-1 source, two scorer
//! files and a source plan, all under one output directory.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xorshift64*)
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        SimpleRng {
            state: seed.wrapping_mul(6364136223846793005).wrapping_add(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, options: &[&'a str]) -> &'a str {
        options[(self.next_u64() % options.len() as u64) as usize]
    }
}

fn write_parquet(path: &Path, schema: Arc<Schema>, batch: RecordBatch) {
    let file = std::fs::File::create(path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
    println!("Wrote {}", path.display());
}

fn depth0_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("case_id", DataType::Int64, false),
        Field::new("credamount_A", DataType::Float64, true),
        Field::new("education_M", DataType::Utf8, true),
    ]))
}

fn main() {
    let out_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_data".to_string());
    let out_dir = Path::new(&out_dir);
    std::fs::create_dir_all(out_dir).expect("Failed to create output directory");

    let mut rng = SimpleRng::new(42);
    let case_ids: Vec<i64> = (1..=40).collect();
    let educations = ["primary", "secondary", "tertiary"];
    let statuses = ["approved", "refused", "cancelled"];

    // Base table: defines the case population.
    let base_schema = Arc::new(Schema::new(vec![Field::new(
        "case_id",
        DataType::Int64,
        false,
    )]));
    let base_batch = RecordBatch::try_new(
        base_schema.clone(),
        vec![Arc::new(Int64Array::from(case_ids.clone()))],
    )
    .expect("Failed to create RecordBatch");
    write_parquet(&out_dir.join("base.parquet"), base_schema, base_batch);

    // Depth-0 source split across two shards; the first case of the second
    // shard repeats a key from the first so the dedup path has work to do.
    let halves: [Vec<i64>; 2] = [
        case_ids[..20].to_vec(),
        std::iter::once(case_ids[19])
            .chain(case_ids[20..].iter().copied())
            .collect(),
    ];
    for (i, ids) in halves.iter().enumerate() {
        let amounts: Vec<f64> = ids.iter().map(|_| 500.0 + rng.next_f64() * 9500.0).collect();
        let edu: Vec<&str> = ids.iter().map(|_| rng.pick(&educations)).collect();
        let schema = depth0_schema();
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(ids.clone())),
                Arc::new(Float64Array::from(amounts)),
                Arc::new(StringArray::from(edu)),
            ],
        )
        .expect("Failed to create RecordBatch");
        write_parquet(&out_dir.join(format!("static_0_{i}.parquet")), schema, batch);
    }

    // Depth-1 source: 1–4 previous applications per case.
    let mut prev_case = Vec::new();
    let mut prev_group = Vec::new();
    let mut prev_amount = Vec::new();
    let mut prev_status = Vec::new();
    for &case_id in &case_ids {
        let n = 1 + (rng.next_u64() % 4) as i64;
        for g in 0..n {
            prev_case.push(case_id);
            prev_group.push(g);
            prev_amount.push(100.0 + rng.next_f64() * 4900.0);
            prev_status.push(rng.pick(&statuses));
        }
    }
    let prev_schema = Arc::new(Schema::new(vec![
        Field::new("case_id", DataType::Int64, false),
        Field::new("num_group1", DataType::Int64, false),
        Field::new("prevamount_A", DataType::Float64, true),
        Field::new("status_M", DataType::Utf8, true),
    ]));
    let prev_batch = RecordBatch::try_new(
        prev_schema.clone(),
        vec![
            Arc::new(Int64Array::from(prev_case)),
            Arc::new(Int64Array::from(prev_group)),
            Arc::new(Float64Array::from(prev_amount)),
            Arc::new(StringArray::from(prev_status)),
        ],
    )
    .expect("Failed to create RecordBatch");
    write_parquet(&out_dir.join("applprev_1.parquet"), prev_schema, prev_batch);

    // Two scorer files and the source plan for predict_batch.
    let models_dir = out_dir.join("models");
    std::fs::create_dir_all(&models_dir).expect("Failed to create models directory");
    std::fs::write(
        models_dir.join("scorer_a.json"),
        r#"{"weights":{"credamount_A":0.0004},"intercept":-2.0}"#,
    )
    .expect("Failed to write scorer");
    std::fs::write(
        models_dir.join("scorer_b.json"),
        r#"{"weights":{"max_prevamount_A":0.0006},"intercept":-2.5}"#,
    )
    .expect("Failed to write scorer");

    std::fs::write(
        out_dir.join("plan.json"),
        r#"{
  "base": "base.parquet",
  "sources": [
    { "pattern": "static_0_*.parquet", "multi": true },
    { "pattern": "applprev_1.parquet", "depth": 1 }
  ]
}
"#,
    )
    .expect("Failed to write plan");

    println!("Sample data set ready in {}", out_dir.display());
}
