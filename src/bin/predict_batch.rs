//! End-to-end batch prediction: assemble the feature table from the shard
//! plan, score every case with the ensemble, write a submission CSV.
//!
//! Usage: predict_batch <data_dir> <plan.json> <models_dir> <output.csv>

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::info;

use casescore::data::frame::DType;
use casescore::ensemble::{Estimator, VotingEnsemble, DEFAULT_RAW_MEMBERS};
use casescore::models::load_scorers;
use casescore::pipeline::{assemble, join_feature_blocks, write_submission, SourcePlan};
use casescore::ShardReader;

const KEY_COLUMN: &str = "case_id";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [data_dir, plan_path, models_dir, out_path] = match args.as_slice() {
        [a, b, c, d] => [a, b, c, d].map(PathBuf::from),
        _ => bail!("usage: predict_batch <data_dir> <plan.json> <models_dir> <output.csv>"),
    };

    let plan = SourcePlan::from_json_file(&plan_path)
        .with_context(|| format!("reading source plan {}", plan_path.display()))?;
    let reader = ShardReader::with_suffix_rules(KEY_COLUMN);

    let store = assemble(&reader, &data_dir, &plan).context("assembling feature blocks")?;
    let features = join_feature_blocks(&store, KEY_COLUMN)?;
    info!(
        "feature table: {} cases, {} columns",
        features.n_rows(),
        features.n_cols()
    );

    // String columns are the categorical set for family-B encoding.
    let cat_cols: Vec<String> = features
        .columns()
        .iter()
        .filter(|c| c.dtype() == DType::Utf8 && c.name() != KEY_COLUMN)
        .map(|c| c.name().to_string())
        .collect();

    let estimators: Vec<Box<dyn Estimator>> = load_scorers(&models_dir)
        .context("loading fitted scorers")?
        .into_iter()
        .map(|s| Box::new(s) as Box<dyn Estimator>)
        .collect();
    info!("ensemble of {} scorer(s)", estimators.len());

    let ensemble = VotingEnsemble::from_ordered(estimators, DEFAULT_RAW_MEMBERS, cat_cols);
    let proba = ensemble.predict_proba(&features)?;
    let scores: Vec<f64> = proba.iter().map(|row| row[1]).collect();

    let ids = features
        .column(KEY_COLUMN)
        .context("feature table lost its key column")?
        .values()
        .to_vec();
    write_submission(&out_path, &ids, &scores)?;
    println!("Wrote {} scored cases to {}", scores.len(), out_path.display());
    Ok(())
}
