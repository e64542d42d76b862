use crate::alignment::shift::ShiftedAlignment;
use crate::alignment::tokenization::Vocabulary;
use crate::types::{EditScript, TokenSequence};

pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str, vocab: &mut Vocabulary) -> TokenSequence;
}

pub trait SequenceAligner: Send + Sync {
    fn align(&self, hyp: &[usize], reference: &[usize]) -> EditScript;
}

pub trait ShiftSearch: Send + Sync {
    fn optimize(&self, hyp: &[usize], reference: &[usize], initial: EditScript) -> ShiftedAlignment;
}
