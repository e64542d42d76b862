use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::MetricError;
use crate::types::Rate;

/// What a query with no relevant items contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyTargetAction {
    /// Counted with score 0.
    #[default]
    Neg,
    /// Counted with score 1.
    Pos,
    /// Left out of the mean.
    Skip,
    /// Rejected as invalid input.
    Error,
}

impl EmptyTargetAction {
    pub fn as_str(self) -> &'static str {
        match self {
            EmptyTargetAction::Neg => "neg",
            EmptyTargetAction::Pos => "pos",
            EmptyTargetAction::Skip => "skip",
            EmptyTargetAction::Error => "error",
        }
    }
}

/// R-Precision counts for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RPrecision {
    /// Relevant items among the first `relevant` positions.
    pub hits: usize,
    /// R: relevant items in the whole ranked list.
    pub relevant: usize,
}

impl RPrecision {
    /// `hits / relevant`, undefined when the query has no relevant items.
    pub fn rate(&self) -> Rate {
        if self.relevant == 0 {
            return Rate::Undefined;
        }
        Rate::Defined(self.hits as f64 / self.relevant as f64)
    }
}

/// R-Precision of a relevance vector already sorted by descending predicted
/// relevance.
///
/// A list shorter than R simply has fewer positions to look at; the division is
/// still by the full R.
pub fn r_precision(relevance: &[bool]) -> RPrecision {
    let relevant = relevance.iter().filter(|&&flag| flag).count();
    let hits = relevance
        .iter()
        .take(relevant)
        .filter(|&&flag| flag)
        .count();
    RPrecision { hits, relevant }
}

/// Reorder `target` by descending `preds`.
///
/// Equal scores keep their input order; NaN scores rank last.
pub fn rank_by_scores(preds: &[f64], target: &[bool]) -> Result<Vec<bool>, MetricError> {
    if preds.len() != target.len() {
        return Err(MetricError::dimension_mismatch(
            "prediction and target lengths differ",
            preds.len(),
            target.len(),
        ));
    }

    let mut ranked: Vec<usize> = (0..preds.len()).collect();
    ranked.sort_by(|&a, &b| descending_score(preds[a], preds[b]));
    Ok(ranked.into_iter().map(|k| target[k]).collect())
}

fn descending_score(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
