//! Prediction-time orchestration: declare the shard sources in a plan,
//! assemble the depth blocks, join them into one feature table per case,
//! and write the scored output.

use std::collections::HashMap;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::data::frame::{Column, Frame, Value};
use crate::data::loader::{Depth, ShardReader};
use crate::error::{Error, Result};

/// One logical source: a file name or glob pattern relative to the data
/// directory, the depth to read it at, and whether it fans out over
/// multiple shard files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    pub pattern: String,
    #[serde(default)]
    pub depth: Option<u8>,
    #[serde(default)]
    pub multi: bool,
}

/// The full set of sources feeding one feature table. Serializable so data
/// locations live in configuration, not in code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcePlan {
    /// The base table: one row per case, defines which cases exist.
    pub base: String,
    pub sources: Vec<SourceSpec>,
}

impl SourcePlan {
    pub fn from_json_file(path: &Path) -> Result<SourcePlan> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// The loaded blocks, base first. Every block is one row per case.
pub struct DataStore {
    pub base: Frame,
    pub blocks: Vec<Frame>,
}

/// Read every source in the plan at its declared depth.
pub fn assemble(reader: &ShardReader, data_dir: &Path, plan: &SourcePlan) -> Result<DataStore> {
    let base = reader.read_single(&data_dir.join(&plan.base), None)?;
    info!("base table '{}': {} cases", plan.base, base.n_rows());

    let mut blocks = Vec::with_capacity(plan.sources.len());
    for spec in &plan.sources {
        let depth = spec.depth.map(Depth::try_from).transpose()?;
        let block = if spec.multi {
            let pattern = data_dir.join(&spec.pattern);
            reader.read_many(&pattern.to_string_lossy(), depth)?
        } else {
            reader.read_single(&data_dir.join(&spec.pattern), depth)?
        };
        blocks.push(block);
    }
    Ok(DataStore { base, blocks })
}

/// Left-join every block onto the base by the entity key.
///
/// Base rows always survive; a case absent from a block gets nulls for that
/// block's features. A feature name already present in the output is
/// disambiguated with the block's position (`{name}_{i}`).
pub fn join_feature_blocks(store: &DataStore, key: &str) -> Result<Frame> {
    let base_keys = store
        .base
        .column(key)
        .ok_or_else(|| Error::schema(key, "key column missing from base table"))?;

    let mut joined = store.base.clone();
    for (block_idx, block) in store.blocks.iter().enumerate() {
        let block_keys = block
            .column(key)
            .ok_or_else(|| Error::schema(key, "key column missing from feature block"))?;

        // First occurrence wins, matching the loader's dedup policy.
        let mut row_of: HashMap<&Value, usize> = HashMap::new();
        for (row, k) in block_keys.values().iter().enumerate() {
            row_of.entry(k).or_insert(row);
        }

        for col in block.columns() {
            if col.name() == key {
                continue;
            }
            let name = if joined.has_column(col.name()) {
                format!("{}_{}", col.name(), block_idx)
            } else {
                col.name().to_string()
            };
            let values = base_keys
                .values()
                .iter()
                .map(|k| match row_of.get(k) {
                    Some(&row) => col.value(row).clone(),
                    None => Value::Null,
                })
                .collect();
            joined.push_column(Column::new(name, col.dtype(), values))?;
        }
    }
    Ok(joined)
}

/// Write the scored cases as a two-column submission CSV.
pub fn write_submission(path: &Path, ids: &[Value], scores: &[f64]) -> Result<()> {
    if ids.len() != scores.len() {
        return Err(Error::ShapeMismatch(format!(
            "{} case ids but {} scores",
            ids.len(),
            scores.len()
        )));
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["case_id", "score"])?;
    for (id, score) in ids.iter().zip(scores) {
        writer.write_record([id.to_string(), score.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}
