//! Fitted model loading.
//!
//! Estimators arrive already fitted; this module covers deserializing them
//! from a models directory and a simple linear scorer usable on its own or
//! as an ensemble member.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::data::frame::{Frame, Value};
use crate::ensemble::Estimator;
use crate::error::{Error, Result};

/// A logistic-regression scorer: per-feature weights plus an intercept.
///
/// Reads numeric cells directly and parses numeric strings, so it works
/// both as a raw-input member and behind string encoding. Nulls count as 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticScorer {
    pub weights: BTreeMap<String, f64>,
    pub intercept: f64,
}

impl LogisticScorer {
    fn feature(&self, x: &Frame, row: usize, name: &str) -> Result<f64> {
        let cell = x
            .value(row, name)
            .ok_or_else(|| Error::schema(name, "feature column missing from input"))?;
        match cell {
            Value::Null => Ok(0.0),
            Value::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| Error::schema(name, format!("non-numeric cell '{s}'"))),
            other => other
                .as_f64()
                .ok_or_else(|| Error::schema(name, format!("non-numeric cell {other:?}"))),
        }
    }

    fn score(&self, x: &Frame, row: usize) -> Result<f64> {
        let mut z = self.intercept;
        for (name, w) in &self.weights {
            z += w * self.feature(x, row, name)?;
        }
        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

impl Estimator for LogisticScorer {
    fn predict(&self, x: &Frame) -> Result<Vec<f64>> {
        (0..x.n_rows()).map(|row| self.score(x, row)).collect()
    }

    fn predict_proba(&self, x: &Frame) -> Result<Vec<Vec<f64>>> {
        (0..x.n_rows())
            .map(|row| self.score(x, row).map(|p| vec![1.0 - p, p]))
            .collect()
    }
}

/// Load every `*.json` scorer in `dir`, in lexicographic filename order.
/// A directory with no scorer files is `NotFound`.
pub fn load_scorers(dir: &Path) -> Result<Vec<LogisticScorer>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();
    if paths.is_empty() {
        return Err(Error::NotFound(dir.to_path_buf()));
    }

    let mut scorers = Vec::with_capacity(paths.len());
    for path in &paths {
        let text = std::fs::read_to_string(path)?;
        scorers.push(serde_json::from_str(&text)?);
        info!("loaded scorer {}", path.display());
    }
    Ok(scorers)
}
