use crate::aggregate::{Aggregator, RetrievalStatistic, TerStatistic, WilStatistic};
use crate::alignment::tokenization::Vocabulary;
use crate::config::{MetricsConfig, MultiReferencePolicy};
use crate::error::MetricError;
use crate::metrics::retrieval::{self, EmptyTargetAction, RPrecision};
use crate::metrics::ter::{self, TerScore};
use crate::metrics::wil::WilScore;
use crate::pipeline::traits::{SequenceAligner, ShiftSearch, Tokenizer};
use crate::types::TokenSequence;

/// Scores sequence pairs and ranked relevance vectors under one config.
///
/// Every scoring call is independent; a `Scorer` can be shared across threads.
pub struct Scorer {
    config: MetricsConfig,
    tokenizer: Box<dyn Tokenizer>,
    sequence_aligner: Box<dyn SequenceAligner>,
    shift_search: Box<dyn ShiftSearch>,
}

pub(crate) struct ScorerParts {
    pub config: MetricsConfig,
    pub tokenizer: Box<dyn Tokenizer>,
    pub sequence_aligner: Box<dyn SequenceAligner>,
    pub shift_search: Box<dyn ShiftSearch>,
}

impl Scorer {
    pub(crate) fn from_parts(parts: ScorerParts) -> Self {
        Self {
            config: parts.config,
            tokenizer: parts.tokenizer,
            sequence_aligner: parts.sequence_aligner,
            shift_search: parts.shift_search,
        }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// TER of a tokenized hypothesis against a non-empty set of references.
    pub fn ter<R: AsRef<[usize]>>(
        &self,
        hyp: &[usize],
        references: &[R],
    ) -> Result<TerScore, MetricError> {
        let lengths: Vec<usize> = references.iter().map(|r| r.as_ref().len()).collect();
        let score = match self.config.multi_reference_policy {
            MultiReferencePolicy::Best => ter::best_of_references(&lengths, |k| {
                let reference = references[k].as_ref();
                let initial = self.sequence_aligner.align(hyp, reference);
                self.shift_search.optimize(hyp, reference, initial)
            })?,
        };
        if !score.converged {
            tracing::warn!(
                reference_index = score.reference_index,
                cap = self.config.shift_iteration_cap,
                "ter: shift search stopped at iteration cap"
            );
        }
        Ok(score)
    }

    /// Tokenizes `hyp` and `references` with one shared vocabulary, then scores
    /// as [`Scorer::ter`].
    pub fn ter_text(&self, hyp: &str, references: &[&str]) -> Result<TerScore, MetricError> {
        let mut vocab = Vocabulary::new();
        let hyp = self.tokenizer.tokenize(hyp, &mut vocab);
        let references: Vec<TokenSequence> = references
            .iter()
            .map(|text| self.tokenizer.tokenize(text, &mut vocab))
            .collect();
        self.ter(&hyp.tokens, &references)
    }

    pub fn wil(&self, hyp: &[usize], reference: &[usize]) -> WilScore {
        WilScore::from_script(&self.sequence_aligner.align(hyp, reference))
    }

    pub fn wil_text(&self, hyp: &str, reference: &str) -> WilScore {
        let mut vocab = Vocabulary::new();
        let hyp = self.tokenizer.tokenize(hyp, &mut vocab);
        let reference = self.tokenizer.tokenize(reference, &mut vocab);
        self.wil(&hyp.tokens, &reference.tokens)
    }

    /// R-Precision of a relevance vector already in ranked order.
    ///
    /// Fails when the vector is longer than `max_relevance_len`, or when it has
    /// no relevant item and the empty-target action is `error`.
    pub fn r_precision(&self, relevance: &[bool]) -> Result<RPrecision, MetricError> {
        if let Some(bound) = self.config.max_relevance_len {
            if relevance.len() > bound {
                return Err(MetricError::dimension_mismatch(
                    "relevance vector exceeds max_relevance_len",
                    bound,
                    relevance.len(),
                ));
            }
        }
        let result = retrieval::r_precision(relevance);
        if result.relevant == 0 && self.config.empty_target_action == EmptyTargetAction::Error {
            return Err(MetricError::invalid_input(
                "query has no relevant items and empty_target_action is error",
            ));
        }
        Ok(result)
    }

    /// Ranks `target` by descending `preds`, then scores as [`Scorer::r_precision`].
    pub fn r_precision_scored(
        &self,
        preds: &[f64],
        target: &[bool],
    ) -> Result<RPrecision, MetricError> {
        let ranked = retrieval::rank_by_scores(preds, target)?;
        self.r_precision(&ranked)
    }

    pub fn ter_aggregator(&self) -> Aggregator<TerStatistic> {
        Aggregator::new(self.config.aggregation)
    }

    pub fn wil_aggregator(&self) -> Aggregator<WilStatistic> {
        Aggregator::new(self.config.aggregation)
    }

    /// Finalizes with the configured `empty_target_action`.
    pub fn retrieval_aggregator(&self) -> Aggregator<RetrievalStatistic> {
        Aggregator::<RetrievalStatistic>::with_empty_target(
            self.config.aggregation,
            self.config.empty_target_action,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AggregationMode;
    use crate::pipeline::builder::ScorerBuilder;
    use crate::types::Rate;

    fn scorer(config: MetricsConfig) -> Scorer {
        ScorerBuilder::new(config).build().expect("build should succeed")
    }

    #[test]
    fn ter_on_token_ids() {
        let result = scorer(MetricsConfig::default())
            .ter(&[2, 3, 4, 0, 1], &[vec![0, 1, 2, 3, 4]])
            .expect("score");
        assert_eq!(result.edits, 1);
        assert_eq!(result.unshifted_edits, 4);
        assert_eq!(result.rate(), Rate::Defined(0.2));
    }

    #[test]
    fn ter_requires_a_reference() {
        let references: [&[usize]; 0] = [];
        let err = scorer(MetricsConfig::default())
            .ter(&[1, 2], &references)
            .unwrap_err();
        assert!(matches!(err, MetricError::InvalidInput { .. }));
    }

    #[test]
    fn case_sensitivity_follows_config() {
        let sensitive = scorer(MetricsConfig::default());
        assert_eq!(sensitive.ter_text("The cat", &["the cat"]).expect("score").edits, 1);

        let insensitive = scorer(MetricsConfig {
            case_sensitive: false,
            ..MetricsConfig::default()
        });
        assert_eq!(insensitive.ter_text("The cat", &["the cat"]).expect("score").edits, 0);
        assert_eq!(insensitive.wil_text("The CAT", "the cat").loss(), 0.0);
    }

    #[test]
    fn strip_punctuation_follows_config() {
        let scorer = scorer(MetricsConfig {
            strip_punctuation: true,
            ..MetricsConfig::default()
        });
        let result = scorer.ter_text("hello , world !", &["hello world"]).expect("score");
        assert_eq!(result.edits, 0);
        assert_eq!(result.ref_length, 2);
    }

    #[test]
    fn wil_on_token_ids() {
        let result = scorer(MetricsConfig::default()).wil(&[0, 9, 2, 3], &[0, 2, 3, 4]);
        assert_eq!(result.matches, 3);
        assert!((result.loss() - 0.4375).abs() < 1e-12);
    }

    #[test]
    fn relevance_bound_is_dimension_mismatch() {
        let scorer = scorer(MetricsConfig {
            max_relevance_len: Some(2),
            ..MetricsConfig::default()
        });
        assert!(scorer.r_precision(&[true, false]).is_ok());
        let err = scorer.r_precision(&[true, false, true]).unwrap_err();
        assert!(matches!(
            err,
            MetricError::DimensionMismatch {
                expected: 2,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn empty_target_error_policy_rejects_query() {
        let strict = scorer(MetricsConfig {
            empty_target_action: EmptyTargetAction::Error,
            ..MetricsConfig::default()
        });
        assert!(matches!(
            strict.r_precision(&[false, false]),
            Err(MetricError::InvalidInput { .. })
        ));
        assert!(strict.r_precision(&[false, true]).is_ok());

        let lenient = scorer(MetricsConfig::default());
        let result = lenient.r_precision(&[false, false]).expect("score");
        assert_eq!(result.rate(), Rate::Undefined);
    }

    #[test]
    fn r_precision_from_scores() {
        let result = scorer(MetricsConfig::default())
            .r_precision_scored(&[0.2, 0.9, 0.4, 0.1], &[true, true, false, false])
            .expect("score");
        assert_eq!(result.relevant, 2);
        assert_eq!(result.hits, 1);
    }

    #[test]
    fn aggregators_use_configured_mode() {
        let scorer = scorer(MetricsConfig {
            aggregation: AggregationMode::MeanOfExamples,
            ..MetricsConfig::default()
        });
        assert_eq!(scorer.ter_aggregator().mode(), AggregationMode::MeanOfExamples);
        assert_eq!(scorer.wil_aggregator().mode(), AggregationMode::MeanOfExamples);
        assert_eq!(
            scorer.retrieval_aggregator().mode(),
            AggregationMode::MeanOfExamples
        );
    }

    #[test]
    fn retrieval_aggregator_follows_configured_empty_target_action() {
        for (action, expected) in [
            (EmptyTargetAction::Neg, 1.0 / 3.0),
            (EmptyTargetAction::Pos, 2.0 / 3.0),
            (EmptyTargetAction::Skip, 0.5),
        ] {
            let scorer = scorer(MetricsConfig {
                aggregation: AggregationMode::MeanOfExamples,
                empty_target_action: action,
                ..MetricsConfig::default()
            });
            let mut agg = scorer.retrieval_aggregator();
            for relevance in [[true, false], [false, true], [false, false]] {
                agg.accumulate(&scorer.r_precision(&relevance).expect("score"));
            }
            let got = agg.finalize().value();
            assert!((got - expected).abs() < 1e-12, "{action:?}: expected {expected}, got {got}");
        }
    }

    #[test]
    fn failed_call_leaves_aggregator_untouched() {
        let scorer = scorer(MetricsConfig::default());
        let mut agg = scorer.ter_aggregator();
        agg.accumulate(&scorer.ter_text("a b", &["a c"]).expect("score"));
        let before = agg.snapshot();
        if let Ok(score) = scorer.ter_text("a b", &[]) {
            agg.accumulate(&score);
        }
        assert_eq!(agg.snapshot(), before);
    }
}
