use crate::alignment::edit_distance::align;
use crate::alignment::shift::{optimize, ShiftLimits, ShiftedAlignment};
use crate::alignment::tokenization::{build_token_sequence, Vocabulary};
use crate::pipeline::traits::{SequenceAligner, ShiftSearch, Tokenizer};
use crate::types::{EditScript, TokenSequence};

/// Splits on whitespace and applies the configured normalization.
#[derive(Debug, Clone, Copy)]
pub struct WhitespaceTokenizer {
    pub case_sensitive: bool,
    pub strip_punctuation: bool,
}

impl Default for WhitespaceTokenizer {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            strip_punctuation: false,
        }
    }
}

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str, vocab: &mut Vocabulary) -> TokenSequence {
        build_token_sequence(text, vocab, self.case_sensitive, self.strip_punctuation)
    }
}

pub struct LevenshteinAligner;

impl SequenceAligner for LevenshteinAligner {
    fn align(&self, hyp: &[usize], reference: &[usize]) -> EditScript {
        align(hyp, reference)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyShiftSearch {
    pub limits: ShiftLimits,
}

impl ShiftSearch for GreedyShiftSearch {
    fn optimize(&self, hyp: &[usize], reference: &[usize], initial: EditScript) -> ShiftedAlignment {
        optimize(hyp, reference, initial, self.limits)
    }
}
