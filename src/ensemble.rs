//! Voting ensemble over heterogeneous pre-trained classifiers.
//!
//! The ensemble never trains; it averages the outputs of already-fitted
//! estimators. Members carry an explicit [`Family`] tag deciding how their
//! input is encoded, instead of the historical "first five are family A"
//! positional convention.

use crate::data::frame::Frame;
use crate::error::{Error, Result};

/// A fitted model. `predict` yields one scalar per row, `predict_proba`
/// one probability row per input row (all members must agree on class
/// count and ordering; that is the caller's contract, not checked here).
pub trait Estimator {
    fn predict(&self, x: &Frame) -> Result<Vec<f64>>;
    fn predict_proba(&self, x: &Frame) -> Result<Vec<Vec<f64>>>;
}

/// Input-encoding family of an estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Family A: consumes categorical columns at their native dtype.
    Raw,
    /// Family B: needs categorical columns serialized as strings.
    StringEncoded,
}

/// One ensemble member: an estimator plus its input-encoding family.
pub struct Member {
    pub family: Family,
    pub estimator: Box<dyn Estimator>,
}

impl Member {
    pub fn raw(estimator: Box<dyn Estimator>) -> Self {
        Member {
            family: Family::Raw,
            estimator,
        }
    }

    pub fn string_encoded(estimator: Box<dyn Estimator>) -> Self {
        Member {
            family: Family::StringEncoded,
            estimator,
        }
    }
}

/// Split point of the historical ordered-list calling convention: the first
/// five estimators were family A, the remainder family B.
pub const DEFAULT_RAW_MEMBERS: usize = 5;

/// Averages predictions across an ordered, immutable set of members.
pub struct VotingEnsemble {
    members: Vec<Member>,
    categorical_columns: Vec<String>,
}

impl VotingEnsemble {
    pub fn new(members: Vec<Member>, categorical_columns: Vec<String>) -> Self {
        VotingEnsemble {
            members,
            categorical_columns,
        }
    }

    /// Compatibility constructor for callers holding a flat ordered list:
    /// the first `raw_members` estimators are tagged [`Family::Raw`], the
    /// rest [`Family::StringEncoded`]. A list shorter than `raw_members`
    /// simply has no string-encoded members.
    pub fn from_ordered(
        estimators: Vec<Box<dyn Estimator>>,
        raw_members: usize,
        categorical_columns: Vec<String>,
    ) -> Self {
        let members = estimators
            .into_iter()
            .enumerate()
            .map(|(i, est)| {
                if i < raw_members {
                    Member::raw(est)
                } else {
                    Member::string_encoded(est)
                }
            })
            .collect();
        VotingEnsemble::new(members, categorical_columns)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// No-op: the ensemble is an aggregation-at-inference-time wrapper, but
    /// callers expecting the usual fit-then-predict lifecycle can still
    /// chain through it.
    pub fn fit(&mut self) -> &mut Self {
        self
    }

    /// Column-wise arithmetic mean of every member's point predictions.
    /// The input frame reaches each estimator unmodified.
    pub fn predict(&self, x: &Frame) -> Result<Vec<f64>> {
        if self.members.is_empty() {
            return Err(Error::ShapeMismatch("ensemble has no members".into()));
        }
        let n = x.n_rows();
        let mut acc = vec![0.0_f64; n];
        for member in &self.members {
            let pred = member.estimator.predict(x)?;
            if pred.len() != n {
                return Err(Error::ShapeMismatch(format!(
                    "estimator returned {} predictions for {} rows",
                    pred.len(),
                    n
                )));
            }
            for (a, p) in acc.iter_mut().zip(&pred) {
                *a += p;
            }
        }
        let count = self.members.len() as f64;
        acc.iter_mut().for_each(|a| *a /= count);
        Ok(acc)
    }

    /// Element-wise mean of every member's class-probability matrix.
    ///
    /// String-encoded members receive a copy of `x` with the categorical
    /// columns rendered as strings, but only when there are categorical
    /// columns and `x` has rows; otherwise they too see `x` unmodified.
    pub fn predict_proba(&self, x: &Frame) -> Result<Vec<Vec<f64>>> {
        if self.members.is_empty() {
            return Err(Error::ShapeMismatch("ensemble has no members".into()));
        }

        let wants_encoding = self
            .members
            .iter()
            .any(|m| m.family == Family::StringEncoded);
        let encoded = if wants_encoding && !self.categorical_columns.is_empty() && !x.is_empty() {
            Some(x.with_string_columns(&self.categorical_columns)?)
        } else {
            None
        };

        let n = x.n_rows();
        let mut acc: Option<Vec<Vec<f64>>> = None;
        for member in &self.members {
            let input = match (member.family, encoded.as_ref()) {
                (Family::StringEncoded, Some(enc)) => enc,
                _ => x,
            };
            let proba = member.estimator.predict_proba(input)?;
            if proba.len() != n {
                return Err(Error::ShapeMismatch(format!(
                    "estimator returned {} probability rows for {} input rows",
                    proba.len(),
                    n
                )));
            }
            match acc.as_mut() {
                None => acc = Some(proba),
                Some(total) => {
                    for (row, (t, p)) in total.iter_mut().zip(&proba).enumerate() {
                        if t.len() != p.len() {
                            return Err(Error::ShapeMismatch(format!(
                                "class count disagreement at row {row}: {} vs {}",
                                t.len(),
                                p.len()
                            )));
                        }
                        for (a, v) in t.iter_mut().zip(p) {
                            *a += v;
                        }
                    }
                }
            }
        }

        let count = self.members.len() as f64;
        let mut total = acc.expect("members checked non-empty");
        for row in &mut total {
            for v in row.iter_mut() {
                *v /= count;
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::frame::{Column, DType, Value};

    /// Predicts a constant; proba is [1-c, c] per row.
    struct Constant(f64);

    impl Estimator for Constant {
        fn predict(&self, x: &Frame) -> Result<Vec<f64>> {
            Ok(vec![self.0; x.n_rows()])
        }

        fn predict_proba(&self, x: &Frame) -> Result<Vec<Vec<f64>>> {
            Ok(vec![vec![1.0 - self.0, self.0]; x.n_rows()])
        }
    }

    /// Emits probability 1.0 for class 1 when column "c1" arrives as a
    /// string, 0.0 otherwise, which makes the family routing observable.
    struct CatProbe;

    impl Estimator for CatProbe {
        fn predict(&self, x: &Frame) -> Result<Vec<f64>> {
            self.predict_proba(x)
                .map(|m| m.into_iter().map(|row| row[1]).collect())
        }

        fn predict_proba(&self, x: &Frame) -> Result<Vec<Vec<f64>>> {
            let p = match x.value(0, "c1") {
                Some(Value::Str(_)) => 1.0,
                _ => 0.0,
            };
            Ok(vec![vec![1.0 - p, p]; x.n_rows()])
        }
    }

    fn frame(rows: usize) -> Frame {
        Frame::from_columns(vec![Column::new(
            "c1",
            DType::Int64,
            (0..rows as i64).map(Value::Int).collect(),
        )])
        .unwrap()
    }

    #[test]
    fn predict_is_the_mean_of_member_outputs() {
        let mut ensemble = VotingEnsemble::new(
            vec![
                Member::raw(Box::new(Constant(0.2))),
                Member::raw(Box::new(Constant(0.4))),
                Member::string_encoded(Box::new(Constant(0.6))),
            ],
            vec![],
        );
        let preds = ensemble.fit().predict(&frame(4)).unwrap();
        assert_eq!(preds.len(), 4);
        for p in preds {
            assert!((p - 0.4).abs() < 1e-12);
        }
    }

    #[test]
    fn single_member_predict_is_identity() {
        let ensemble = VotingEnsemble::new(vec![Member::raw(Box::new(Constant(0.9)))], vec![]);
        assert_eq!(ensemble.predict(&frame(2)).unwrap(), vec![0.9, 0.9]);
    }

    #[test]
    fn proba_averages_element_wise() {
        let ensemble = VotingEnsemble::new(
            vec![
                Member::raw(Box::new(Constant(0.0))),
                Member::raw(Box::new(Constant(1.0))),
            ],
            vec![],
        );
        let proba = ensemble.predict_proba(&frame(3)).unwrap();
        assert_eq!(proba.len(), 3);
        assert_eq!(proba[0], vec![0.5, 0.5]);
    }

    #[test]
    fn ordered_split_tags_first_five_raw() {
        let estimators: Vec<Box<dyn Estimator>> =
            (0..7).map(|_| Box::new(CatProbe) as Box<dyn Estimator>).collect();
        let ensemble =
            VotingEnsemble::from_ordered(estimators, DEFAULT_RAW_MEMBERS, vec!["c1".into()]);
        assert_eq!(
            ensemble
                .members()
                .iter()
                .filter(|m| m.family == Family::Raw)
                .count(),
            5
        );
        // 5 raw probes see ints (p=0), 2 encoded probes see strings (p=1).
        let proba = ensemble.predict_proba(&frame(2)).unwrap();
        assert!((proba[0][1] - 2.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn short_ensemble_never_string_encodes() {
        let estimators: Vec<Box<dyn Estimator>> =
            (0..3).map(|_| Box::new(CatProbe) as Box<dyn Estimator>).collect();
        let ensemble =
            VotingEnsemble::from_ordered(estimators, DEFAULT_RAW_MEMBERS, vec!["c1".into()]);
        let proba = ensemble.predict_proba(&frame(2)).unwrap();
        assert_eq!(proba[0][1], 0.0);
    }

    #[test]
    fn empty_categorical_list_skips_encoding() {
        let ensemble =
            VotingEnsemble::new(vec![Member::string_encoded(Box::new(CatProbe))], vec![]);
        let proba = ensemble.predict_proba(&frame(2)).unwrap();
        assert_eq!(proba[0][1], 0.0);
    }

    #[test]
    fn missing_categorical_column_is_a_schema_error() {
        let ensemble = VotingEnsemble::new(
            vec![Member::string_encoded(Box::new(Constant(0.5)))],
            vec!["ghost".into()],
        );
        assert!(matches!(
            ensemble.predict_proba(&frame(1)),
            Err(Error::Schema { .. })
        ));
    }

    #[test]
    fn wrong_output_length_is_a_shape_mismatch() {
        struct Short;
        impl Estimator for Short {
            fn predict(&self, _x: &Frame) -> Result<Vec<f64>> {
                Ok(vec![0.5])
            }
            fn predict_proba(&self, _x: &Frame) -> Result<Vec<Vec<f64>>> {
                Ok(vec![vec![0.5, 0.5]])
            }
        }
        let ensemble = VotingEnsemble::new(vec![Member::raw(Box::new(Short))], vec![]);
        assert!(matches!(
            ensemble.predict(&frame(3)),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn empty_ensemble_is_rejected() {
        let ensemble = VotingEnsemble::new(vec![], vec![]);
        assert!(matches!(
            ensemble.predict(&frame(1)),
            Err(Error::ShapeMismatch(_))
        ));
    }
}
