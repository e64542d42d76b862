use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::aggregate::{
    AggregationMode, Aggregator, RetrievalStatistic, Statistic, TerStatistic, WilStatistic,
};
use crate::config::MetricsConfig;
use crate::error::MetricError;
use crate::metrics::retrieval::RPrecision;
use crate::metrics::ter::TerScore;
use crate::metrics::wil::WilScore;
use crate::pipeline::runtime::Scorer;
use crate::types::Rate;

pub const REPORT_SCHEMA_VERSION: u32 = 1;
const OUTLIER_TOP_N: usize = 20;

/// One line of a JSONL case file.
///
/// Text metrics run when `hypothesis` is present, retrieval when `relevance` is.
/// With `scores`, relevance flags are ranked by descending score first.
#[derive(Debug, Clone, Deserialize)]
pub struct EvalCase {
    pub id: String,
    #[serde(default)]
    pub hypothesis: Option<String>,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub relevance: Option<Vec<bool>>,
    #[serde(default)]
    pub scores: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub schema_version: u32,
    pub meta: Meta,
    pub cases: Vec<CaseReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<CaseFailure>,
    pub aggregates: AggregateReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub generated_at: String,
    pub cases_path: String,
    pub config: MetricsConfig,
    pub case_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ter: Option<TerCaseMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wil: Option<WilCaseMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval: Option<RetrievalCaseMetrics>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TerCaseMetrics {
    #[serde(flatten)]
    pub score: TerScore,
    /// `None` when the rate is undefined.
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WilCaseMetrics {
    #[serde(flatten)]
    pub score: WilScore,
    pub wil: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalCaseMetrics {
    #[serde(flatten)]
    pub score: RPrecision,
    pub r_precision: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseFailure {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    /// Mode behind each summary's `value`.
    pub mode: AggregationMode,
    pub counts: AggregateCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ter: Option<MetricSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wil: Option<MetricSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r_precision: Option<MetricSummary>,
    pub outliers: OutlierReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateCounts {
    pub total: u32,
    pub ter_cases: u32,
    pub wil_cases: u32,
    pub retrieval_cases: u32,
    pub undefined_ter: u32,
    pub empty_queries: u32,
    pub unconverged: u32,
}

/// Corpus value of one metric under both aggregation modes.
#[derive(Debug, Clone, Serialize)]
pub struct MetricSummary {
    /// Value under the configured [`AggregationMode`].
    pub value: Option<f64>,
    pub pooled: Option<f64>,
    pub mean_of_examples: Option<f64>,
    /// Spread of the defined per-case values.
    pub distribution: Option<MetricDistribution>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricDistribution {
    pub mean: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlierReport {
    pub worst_ter: Vec<OutlierEntry>,
    pub worst_wil: Vec<OutlierEntry>,
    pub worst_r_precision: Vec<OutlierEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlierEntry {
    pub id: String,
    pub value: f64,
}

pub fn compute_case_report(scorer: &Scorer, case: &EvalCase) -> Result<CaseReport, MetricError> {
    if case.hypothesis.is_none() && case.relevance.is_none() {
        return Err(MetricError::invalid_input(format!(
            "case '{}' has neither a hypothesis nor a relevance vector",
            case.id
        )));
    }

    let mut notes = Vec::new();
    let mut ter = None;
    let mut wil = None;

    if let Some(hypothesis) = case.hypothesis.as_deref() {
        let references: Vec<&str> = case.references.iter().map(String::as_str).collect();
        let ter_score = scorer.ter_text(hypothesis, &references)?;
        // TER succeeded, so there is at least one reference. WIL has no
        // multi-reference rule and uses the first.
        let wil_score = scorer.wil_text(hypothesis, references[0]);

        if ter_score.ref_length == 0 {
            notes.push("reference_empty".to_string());
        }
        if wil_score.hyp_length == 0 {
            notes.push("hypothesis_empty".to_string());
        }
        if !ter_score.converged {
            notes.push("shift_cap_reached".to_string());
        }

        ter = Some(TerCaseMetrics {
            rate: defined(ter_score.rate()),
            score: ter_score,
        });
        wil = Some(WilCaseMetrics {
            wil: wil_score.loss(),
            score: wil_score,
        });
    }

    let retrieval = match case.relevance.as_deref() {
        Some(relevance) => {
            let score = match case.scores.as_deref() {
                Some(preds) => scorer.r_precision_scored(preds, relevance)?,
                None => scorer.r_precision(relevance)?,
            };
            if score.relevant == 0 {
                notes.push("no_relevant_items".to_string());
            }
            Some(RetrievalCaseMetrics {
                r_precision: defined(score.rate()),
                score,
            })
        }
        None => None,
    };

    if !notes.is_empty() {
        tracing::warn!(case = %case.id, notes = ?notes, "degenerate case");
    }

    Ok(CaseReport {
        id: case.id.clone(),
        ter,
        wil,
        retrieval,
        notes,
    })
}

/// Corpus summaries for `cases`. `config.aggregation` picks each summary's
/// headline `value`; `config.empty_target_action` resolves queries without
/// relevant items.
pub fn aggregate_reports(cases: &[CaseReport], config: &MetricsConfig) -> AggregateReport {
    let mode = config.aggregation;
    let mut ter = Aggregator::<TerStatistic>::new(mode);
    ter.accumulate_all(cases.iter().filter_map(|case| case.ter.as_ref().map(|m| &m.score)));
    let mut wil = Aggregator::<WilStatistic>::new(mode);
    wil.accumulate_all(cases.iter().filter_map(|case| case.wil.as_ref().map(|m| &m.score)));
    let mut retrieval =
        Aggregator::<RetrievalStatistic>::with_empty_target(mode, config.empty_target_action);
    retrieval.accumulate_all(
        cases
            .iter()
            .filter_map(|case| case.retrieval.as_ref().map(|m| &m.score)),
    );

    let ter_values = per_case_values(cases, |case| case.ter.as_ref().and_then(|m| m.rate));
    let wil_values = per_case_values(cases, |case| case.wil.as_ref().map(|m| m.wil));
    let rp_values = per_case_values(cases, |case| {
        case.retrieval.as_ref().and_then(|m| m.r_precision)
    });

    AggregateReport {
        mode,
        counts: AggregateCounts {
            total: to_u32(cases.len()),
            ter_cases: to_u32(ter.statistic().examples as usize),
            wil_cases: to_u32(wil.statistic().examples as usize),
            retrieval_cases: to_u32(
                (retrieval.statistic().queries + retrieval.statistic().empty_queries) as usize,
            ),
            undefined_ter: to_u32(
                cases
                    .iter()
                    .filter(|case| matches!(&case.ter, Some(m) if m.rate.is_none()))
                    .count(),
            ),
            empty_queries: to_u32(retrieval.statistic().empty_queries as usize),
            unconverged: to_u32(
                cases
                    .iter()
                    .filter(|case| matches!(&case.ter, Some(m) if !m.score.converged))
                    .count(),
            ),
        },
        ter: summarize(&ter, &ter_values),
        wil: summarize(&wil, &wil_values),
        r_precision: summarize(&retrieval, &rp_values),
        outliers: OutlierReport {
            worst_ter: ranked_outliers(cases, OUTLIER_TOP_N, Worst::Highest, |case| {
                case.ter.as_ref().and_then(|m| m.rate)
            }),
            worst_wil: ranked_outliers(cases, OUTLIER_TOP_N, Worst::Highest, |case| {
                case.wil.as_ref().map(|m| m.wil)
            }),
            worst_r_precision: ranked_outliers(cases, OUTLIER_TOP_N, Worst::Lowest, |case| {
                case.retrieval.as_ref().and_then(|m| m.r_precision)
            }),
        },
    }
}

fn summarize<S: Statistic>(aggregator: &Aggregator<S>, values: &[f64]) -> Option<MetricSummary> {
    if aggregator.statistic() == &aggregator.statistic().cleared() {
        return None;
    }
    Some(MetricSummary {
        value: defined(aggregator.finalize()),
        pooled: defined(aggregator.finalize_as(AggregationMode::Pooled)),
        mean_of_examples: defined(aggregator.finalize_as(AggregationMode::MeanOfExamples)),
        distribution: distribution_or_none(values),
    })
}

fn defined(rate: Rate) -> Option<f64> {
    match rate {
        Rate::Defined(value) => Some(value),
        Rate::Undefined => None,
    }
}

fn per_case_values(cases: &[CaseReport], metric: impl Fn(&CaseReport) -> Option<f64>) -> Vec<f64> {
    cases.iter().filter_map(metric).collect()
}

#[derive(Debug, Clone, Copy)]
enum Worst {
    Highest,
    Lowest,
}

fn ranked_outliers(
    cases: &[CaseReport],
    top_n: usize,
    worst: Worst,
    metric: impl Fn(&CaseReport) -> Option<f64>,
) -> Vec<OutlierEntry> {
    let mut entries: Vec<OutlierEntry> = cases
        .iter()
        .filter_map(|case| {
            metric(case).map(|value| OutlierEntry {
                id: case.id.clone(),
                value,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        let by_value = match worst {
            Worst::Highest => b.value.partial_cmp(&a.value),
            Worst::Lowest => a.value.partial_cmp(&b.value),
        };
        by_value
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    entries.truncate(top_n);
    entries
}

fn distribution_or_none(values: &[f64]) -> Option<MetricDistribution> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Some(MetricDistribution {
        mean: mean(&sorted),
        p50: percentile_sorted(&sorted, 0.5),
        p90: percentile_sorted(&sorted, 0.9),
        p95: percentile_sorted(&sorted, 0.95),
        p99: percentile_sorted(&sorted, 0.99),
    })
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn percentile_sorted(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    if sorted_values.len() == 1 {
        return sorted_values[0];
    }

    let clamped = percentile.clamp(0.0, 1.0);
    let max_index = (sorted_values.len() - 1) as f64;
    let rank = clamped * max_index;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted_values[lower]
    } else {
        let weight = rank - lower as f64;
        sorted_values[lower] * (1.0 - weight) + sorted_values[upper] * weight
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
