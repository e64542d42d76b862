//! Corpus-level accumulation.
//!
//! Each metric keeps a plain-value Running Statistic. Statistics are sums, so
//! partial statistics from independent workers merge in any order. Every
//! statistic carries both the pooled counts and the per-example rate sum with
//! its count, so either [`AggregationMode`] can be finalized after a merge.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::metrics::retrieval::{EmptyTargetAction, RPrecision};
use crate::metrics::ter::TerScore;
use crate::metrics::wil::{information_lost, WilScore};
use crate::types::Rate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Sum raw counts over the corpus, then divide once.
    #[default]
    Pooled,
    /// Average the already-divided per-example values.
    MeanOfExamples,
}

impl AggregationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AggregationMode::Pooled => "pooled",
            AggregationMode::MeanOfExamples => "mean_of_examples",
        }
    }
}

pub trait Statistic: Clone + Default + PartialEq + Serialize + DeserializeOwned {
    type Observation;

    fn observe(&mut self, observation: &Self::Observation);
    fn merge(&mut self, other: &Self);
    fn finalize(&self, mode: AggregationMode) -> Rate;

    /// Empty statistic with the same settings as `self`.
    fn cleared(&self) -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TerStatistic {
    pub edits: u64,
    pub ref_length: u64,
    pub shifts: u64,
    /// Sum of sentence rates, undefined ones as their 0 sentinel.
    pub rate_sum: f64,
    pub examples: u64,
}

impl Statistic for TerStatistic {
    type Observation = TerScore;

    fn observe(&mut self, score: &TerScore) {
        self.edits += score.edits as u64;
        self.ref_length += score.ref_length as u64;
        self.shifts += score.shifts as u64;
        self.rate_sum += score.rate().value();
        self.examples += 1;
    }

    fn merge(&mut self, other: &Self) {
        self.edits += other.edits;
        self.ref_length += other.ref_length;
        self.shifts += other.shifts;
        self.rate_sum += other.rate_sum;
        self.examples += other.examples;
    }

    fn finalize(&self, mode: AggregationMode) -> Rate {
        if self.examples == 0 {
            return Rate::Undefined;
        }
        match mode {
            AggregationMode::Pooled => Rate::ratio(self.edits, self.ref_length),
            AggregationMode::MeanOfExamples => {
                Rate::Defined(self.rate_sum / self.examples as f64)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WilStatistic {
    pub matches: u64,
    pub hyp_length: u64,
    pub ref_length: u64,
    pub loss_sum: f64,
    pub examples: u64,
}

impl Statistic for WilStatistic {
    type Observation = WilScore;

    fn observe(&mut self, score: &WilScore) {
        self.matches += score.matches as u64;
        self.hyp_length += score.hyp_length as u64;
        self.ref_length += score.ref_length as u64;
        self.loss_sum += score.loss();
        self.examples += 1;
    }

    fn merge(&mut self, other: &Self) {
        self.matches += other.matches;
        self.hyp_length += other.hyp_length;
        self.ref_length += other.ref_length;
        self.loss_sum += other.loss_sum;
        self.examples += other.examples;
    }

    fn finalize(&self, mode: AggregationMode) -> Rate {
        if self.examples == 0 {
            return Rate::Undefined;
        }
        match mode {
            AggregationMode::Pooled => Rate::Defined(information_lost(
                self.matches,
                self.hyp_length,
                self.ref_length,
            )),
            AggregationMode::MeanOfExamples => {
                Rate::Defined(self.loss_sum / self.examples as f64)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalStatistic {
    pub hits: u64,
    pub relevant: u64,
    /// Sum of R-Precision over queries with at least one relevant item.
    pub rate_sum: f64,
    pub queries: u64,
    /// Queries with no relevant item; resolved at finalize time.
    pub empty_queries: u64,
    /// Policy [`Statistic::finalize`] applies to `empty_queries`.
    #[serde(default)]
    pub empty_target: EmptyTargetAction,
}

impl RetrievalStatistic {
    pub fn with_empty_target(empty_target: EmptyTargetAction) -> Self {
        Self {
            empty_target,
            ..Self::default()
        }
    }

    /// Finalize with an explicit policy for queries without relevant items.
    ///
    /// `Pooled` divides total hits by total R, so empty queries add nothing
    /// whatever the policy. `Error` is enforced when scoring and behaves like
    /// `Neg` here.
    pub fn finalize_with(&self, mode: AggregationMode, empty_target: EmptyTargetAction) -> Rate {
        match mode {
            AggregationMode::Pooled => {
                if self.relevant == 0 {
                    return Rate::Undefined;
                }
                Rate::Defined(self.hits as f64 / self.relevant as f64)
            }
            AggregationMode::MeanOfExamples => {
                let (fill, counted_empty) = match empty_target {
                    EmptyTargetAction::Neg | EmptyTargetAction::Error => (0.0, self.empty_queries),
                    EmptyTargetAction::Pos => (1.0, self.empty_queries),
                    EmptyTargetAction::Skip => (0.0, 0),
                };
                let counted = self.queries + counted_empty;
                if counted == 0 {
                    return Rate::Undefined;
                }
                Rate::Defined((self.rate_sum + fill * counted_empty as f64) / counted as f64)
            }
        }
    }
}

impl Statistic for RetrievalStatistic {
    type Observation = RPrecision;

    fn observe(&mut self, query: &RPrecision) {
        if query.relevant == 0 {
            self.empty_queries += 1;
            return;
        }
        self.hits += query.hits as u64;
        self.relevant += query.relevant as u64;
        self.rate_sum += query.rate().value();
        self.queries += 1;
    }

    /// Keeps `self`'s empty-target policy.
    fn merge(&mut self, other: &Self) {
        self.hits += other.hits;
        self.relevant += other.relevant;
        self.rate_sum += other.rate_sum;
        self.queries += other.queries;
        self.empty_queries += other.empty_queries;
    }

    fn finalize(&self, mode: AggregationMode) -> Rate {
        self.finalize_with(mode, self.empty_target)
    }

    fn cleared(&self) -> Self {
        Self::with_empty_target(self.empty_target)
    }
}

/// Owns one metric's Running Statistic for an evaluation session.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregator<S: Statistic> {
    mode: AggregationMode,
    state: S,
}

impl<S: Statistic> Aggregator<S> {
    pub fn new(mode: AggregationMode) -> Self {
        Self {
            mode,
            state: S::default(),
        }
    }

    /// Resume from a snapshot taken by [`Aggregator::snapshot`].
    pub fn from_snapshot(mode: AggregationMode, state: S) -> Self {
        Self { mode, state }
    }

    pub fn mode(&self) -> AggregationMode {
        self.mode
    }

    pub fn accumulate(&mut self, observation: &S::Observation) {
        self.state.observe(observation);
    }

    pub fn accumulate_all<'a>(&mut self, observations: impl IntoIterator<Item = &'a S::Observation>)
    where
        S::Observation: 'a,
    {
        for observation in observations {
            self.state.observe(observation);
        }
    }

    /// Does not change state; may be called any number of times.
    pub fn finalize(&self) -> Rate {
        self.state.finalize(self.mode)
    }

    pub fn finalize_as(&self, mode: AggregationMode) -> Rate {
        self.state.finalize(mode)
    }

    pub fn merge(&mut self, other: &Aggregator<S>) {
        self.state.merge(&other.state);
    }

    pub fn reset(&mut self) {
        self.state = self.state.cleared();
    }

    pub fn snapshot(&self) -> S {
        self.state.clone()
    }

    pub fn statistic(&self) -> &S {
        &self.state
    }
}

impl Aggregator<RetrievalStatistic> {
    /// Retrieval aggregator whose [`Aggregator::finalize`] resolves queries
    /// without relevant items by `empty_target`.
    pub fn with_empty_target(mode: AggregationMode, empty_target: EmptyTargetAction) -> Self {
        Self::from_snapshot(mode, RetrievalStatistic::with_empty_target(empty_target))
    }

    /// Finalize under `empty_target` instead of the stored policy.
    pub fn finalize_with(&self, empty_target: EmptyTargetAction) -> Rate {
        self.state.finalize_with(self.mode, empty_target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ter(edits: usize, ref_length: usize) -> TerScore {
        TerScore {
            edits,
            ref_length,
            shifts: 0,
            unshifted_edits: edits,
            reference_index: 0,
            converged: true,
        }
    }

    fn assert_close(actual: Rate, expected: f64) {
        assert!(
            (actual.value() - expected).abs() < 1e-12,
            "expected {expected}, got {actual:?}"
        );
    }

    #[test]
    fn pooled_ter_differs_from_mean_of_rates() {
        // 1/2 and 1/10: pooled 2/12, mean (0.5 + 0.1) / 2.
        let mut pooled = Aggregator::<TerStatistic>::new(AggregationMode::Pooled);
        pooled.accumulate_all(&[ter(1, 2), ter(1, 10)]);
        let mut mean = Aggregator::<TerStatistic>::new(AggregationMode::MeanOfExamples);
        mean.accumulate_all(&[ter(1, 2), ter(1, 10)]);

        assert_close(pooled.finalize(), 2.0 / 12.0);
        assert_close(mean.finalize(), 0.3);
        assert!((pooled.finalize().value() - mean.finalize().value()).abs() > 0.1);
    }

    #[test]
    fn finalize_is_idempotent_and_accumulation_continues() {
        let mut agg = Aggregator::<TerStatistic>::new(AggregationMode::Pooled);
        agg.accumulate(&ter(1, 4));
        let first = agg.finalize();
        assert_eq!(agg.finalize(), first);
        agg.accumulate(&ter(3, 4));
        assert_close(agg.finalize(), 0.5);
    }

    #[test]
    fn reset_returns_to_identity() {
        let mut agg = Aggregator::<WilStatistic>::new(AggregationMode::Pooled);
        agg.accumulate(&WilScore {
            matches: 1,
            hyp_length: 2,
            ref_length: 2,
        });
        agg.reset();
        assert_eq!(agg.snapshot(), WilStatistic::default());
        assert_eq!(agg.finalize(), Rate::Undefined);
    }

    #[test]
    fn empty_corpus_is_undefined() {
        assert_eq!(
            Aggregator::<TerStatistic>::new(AggregationMode::Pooled).finalize(),
            Rate::Undefined
        );
        assert_eq!(
            Aggregator::<RetrievalStatistic>::new(AggregationMode::MeanOfExamples).finalize(),
            Rate::Undefined
        );
    }

    #[test]
    fn ter_against_empty_references_is_undefined_when_pooled() {
        let mut agg = Aggregator::<TerStatistic>::new(AggregationMode::Pooled);
        agg.accumulate(&ter(2, 0));
        assert_eq!(agg.finalize(), Rate::Undefined);
        agg.accumulate(&ter(0, 4));
        assert_close(agg.finalize(), 0.5);
    }

    #[test]
    fn wil_pooled_recomputes_from_counts() {
        let scores = [
            WilScore {
                matches: 5,
                hyp_length: 6,
                ref_length: 6,
            },
            WilScore {
                matches: 0,
                hyp_length: 2,
                ref_length: 0,
            },
        ];
        let mut pooled = Aggregator::<WilStatistic>::new(AggregationMode::Pooled);
        pooled.accumulate_all(&scores);
        assert_close(pooled.finalize(), 1.0 - (5.0 / 8.0) * (5.0 / 6.0));
        let expected_mean = ((1.0 - (5.0 / 6.0) * (5.0 / 6.0)) + 1.0) / 2.0;
        assert_close(pooled.finalize_as(AggregationMode::MeanOfExamples), expected_mean);
    }

    #[test]
    fn retrieval_empty_target_policies() {
        let mut agg = Aggregator::<RetrievalStatistic>::new(AggregationMode::MeanOfExamples);
        agg.accumulate(&RPrecision {
            hits: 1,
            relevant: 2,
        });
        agg.accumulate(&RPrecision {
            hits: 0,
            relevant: 0,
        });

        assert_close(agg.finalize_with(EmptyTargetAction::Neg), 0.25);
        assert_close(agg.finalize_with(EmptyTargetAction::Pos), 0.75);
        assert_close(agg.finalize_with(EmptyTargetAction::Skip), 0.5);
        assert_eq!(agg.finalize(), agg.finalize_with(EmptyTargetAction::Neg));
    }

    #[test]
    fn retrieval_finalize_uses_stored_policy() {
        let queries = [
            RPrecision { hits: 1, relevant: 2 },
            RPrecision { hits: 0, relevant: 0 },
        ];
        for (action, expected) in [
            (EmptyTargetAction::Neg, 0.25),
            (EmptyTargetAction::Pos, 0.75),
            (EmptyTargetAction::Skip, 0.5),
        ] {
            let mut agg = Aggregator::<RetrievalStatistic>::with_empty_target(
                AggregationMode::MeanOfExamples,
                action,
            );
            agg.accumulate_all(&queries);
            assert_close(agg.finalize(), expected);
            assert_eq!(agg.finalize(), agg.finalize_with(action));
        }
    }

    #[test]
    fn retrieval_reset_and_merge_keep_policy() {
        let mut agg = Aggregator::<RetrievalStatistic>::with_empty_target(
            AggregationMode::MeanOfExamples,
            EmptyTargetAction::Pos,
        );
        agg.accumulate(&RPrecision { hits: 0, relevant: 0 });
        agg.reset();
        assert_eq!(agg.statistic().empty_target, EmptyTargetAction::Pos);
        assert_eq!(agg.statistic().empty_queries, 0);

        let mut other = Aggregator::<RetrievalStatistic>::new(AggregationMode::MeanOfExamples);
        other.accumulate(&RPrecision { hits: 0, relevant: 0 });
        agg.merge(&other);
        assert_close(agg.finalize(), 1.0);
    }

    #[test]
    fn retrieval_snapshot_without_policy_defaults_to_neg() {
        let json = r#"{"hits":1,"relevant":2,"rate_sum":0.5,"queries":1,"empty_queries":1}"#;
        let restored: RetrievalStatistic = serde_json::from_str(json).expect("deserialize");
        assert_eq!(restored.empty_target, EmptyTargetAction::Neg);
        let agg = Aggregator::from_snapshot(AggregationMode::MeanOfExamples, restored);
        assert_close(agg.finalize(), 0.25);
    }

    #[test]
    fn retrieval_pooled_divides_total_hits_by_total_r() {
        let mut agg = Aggregator::<RetrievalStatistic>::new(AggregationMode::Pooled);
        agg.accumulate(&RPrecision {
            hits: 2,
            relevant: 3,
        });
        agg.accumulate(&RPrecision {
            hits: 1,
            relevant: 1,
        });
        assert_close(agg.finalize(), 0.75);
        assert_close(agg.finalize_as(AggregationMode::MeanOfExamples), (2.0 / 3.0 + 1.0) / 2.0);
    }

    #[test]
    fn retrieval_only_empty_queries_pooled_is_undefined() {
        let mut agg = Aggregator::<RetrievalStatistic>::new(AggregationMode::Pooled);
        agg.accumulate(&RPrecision {
            hits: 0,
            relevant: 0,
        });
        assert_eq!(agg.finalize(), Rate::Undefined);
    }

    #[test]
    fn merge_of_partitions_matches_single_pass() {
        let scores = [ter(1, 2), ter(0, 5), ter(3, 7), ter(2, 0), ter(4, 4)];
        let mut full = Aggregator::<TerStatistic>::new(AggregationMode::Pooled);
        full.accumulate_all(&scores);

        let mut left = Aggregator::<TerStatistic>::new(AggregationMode::Pooled);
        left.accumulate_all(&scores[..2]);
        let mut right = Aggregator::<TerStatistic>::new(AggregationMode::Pooled);
        right.accumulate_all(&scores[2..]);
        right.merge(&left);

        assert_eq!(right.statistic().edits, full.statistic().edits);
        assert_eq!(right.statistic().ref_length, full.statistic().ref_length);
        assert_eq!(right.statistic().examples, full.statistic().examples);
        assert_eq!(right.finalize(), full.finalize());
        assert_close(
            right.finalize_as(AggregationMode::MeanOfExamples),
            full.finalize_as(AggregationMode::MeanOfExamples).value(),
        );
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut agg = Aggregator::<WilStatistic>::new(AggregationMode::Pooled);
        agg.accumulate(&WilScore {
            matches: 3,
            hyp_length: 4,
            ref_length: 5,
        });
        let json = serde_json::to_string(&agg.snapshot()).expect("serialize");
        let restored: WilStatistic = serde_json::from_str(&json).expect("deserialize");
        let resumed = Aggregator::from_snapshot(AggregationMode::Pooled, restored);
        assert_eq!(resumed, agg);
    }

    #[test]
    fn aggregation_mode_names() {
        assert_eq!(AggregationMode::Pooled.as_str(), "pooled");
        let mode: AggregationMode = serde_json::from_str("\"mean_of_examples\"").expect("parse");
        assert_eq!(mode, AggregationMode::MeanOfExamples);
    }
}
