use crate::config::MetricsConfig;
use crate::error::MetricError;
use crate::pipeline::defaults::{GreedyShiftSearch, LevenshteinAligner, WhitespaceTokenizer};
use crate::pipeline::runtime::{Scorer, ScorerParts};
use crate::pipeline::traits::{SequenceAligner, ShiftSearch, Tokenizer};

pub struct ScorerBuilder {
    config: MetricsConfig,
    tokenizer: Option<Box<dyn Tokenizer>>,
    sequence_aligner: Option<Box<dyn SequenceAligner>>,
    shift_search: Option<Box<dyn ShiftSearch>>,
}

impl ScorerBuilder {
    pub fn new(config: MetricsConfig) -> Self {
        Self {
            config,
            tokenizer: None,
            sequence_aligner: None,
            shift_search: None,
        }
    }

    pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn with_sequence_aligner(mut self, sequence_aligner: Box<dyn SequenceAligner>) -> Self {
        self.sequence_aligner = Some(sequence_aligner);
        self
    }

    pub fn with_shift_search(mut self, shift_search: Box<dyn ShiftSearch>) -> Self {
        self.shift_search = Some(shift_search);
        self
    }

    pub fn build(self) -> Result<Scorer, MetricError> {
        self.config.validate()?;

        let tokenizer = self.tokenizer.unwrap_or_else(|| {
            Box::new(WhitespaceTokenizer {
                case_sensitive: self.config.case_sensitive,
                strip_punctuation: self.config.strip_punctuation,
            })
        });
        let shift_limits = self.config.shift_limits();
        let shift_search = self
            .shift_search
            .unwrap_or_else(|| Box::new(GreedyShiftSearch { limits: shift_limits }));

        Ok(Scorer::from_parts(ScorerParts {
            config: self.config,
            tokenizer,
            sequence_aligner: self
                .sequence_aligner
                .unwrap_or_else(|| Box::new(LevenshteinAligner)),
            shift_search,
        }))
    }
}
