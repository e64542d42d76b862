use std::collections::HashMap;

use crate::types::TokenSequence;

/// Interns normalized words into dense ids for one scoring call.
///
/// The hypothesis and every reference of a call must share one vocabulary so
/// that equal words map to equal ids.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    ids: HashMap<String, usize>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, word: &str) -> usize {
        if let Some(&id) = self.ids.get(word) {
            return id;
        }
        let id = self.ids.len();
        self.ids.insert(word.to_string(), id);
        id
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Normalization applied to a single whitespace-delimited word.
///
/// Returns `None` when nothing is left (a word made only of punctuation with
/// `strip_punctuation` on).
pub fn normalize_word(word: &str, case_sensitive: bool, strip_punctuation: bool) -> Option<String> {
    let mut normalized: String = if strip_punctuation {
        word.chars().filter(|c| !c.is_ascii_punctuation()).collect()
    } else {
        word.to_string()
    };
    if !case_sensitive {
        normalized = normalized.to_lowercase();
    }
    (!normalized.is_empty()).then_some(normalized)
}

pub fn build_token_sequence(
    text: &str,
    vocab: &mut Vocabulary,
    case_sensitive: bool,
    strip_punctuation: bool,
) -> TokenSequence {
    build_token_sequence_from_words(text.split_whitespace(), vocab, case_sensitive, strip_punctuation)
}

/// Same as [`build_token_sequence`] for callers that already split their text.
pub fn build_token_sequence_from_words<'a>(
    words: impl IntoIterator<Item = &'a str>,
    vocab: &mut Vocabulary,
    case_sensitive: bool,
    strip_punctuation: bool,
) -> TokenSequence {
    let tokens = words
        .into_iter()
        .filter_map(|word| normalize_word(word, case_sensitive, strip_punctuation))
        .map(|word| vocab.intern(&word))
        .collect();
    TokenSequence { tokens }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_produces_empty_sequence() {
        let mut vocab = Vocabulary::new();
        let seq = build_token_sequence("   ", &mut vocab, true, false);
        assert!(seq.is_empty());
        assert!(vocab.is_empty());
    }

    #[test]
    fn equal_words_share_ids() {
        let mut vocab = Vocabulary::new();
        let hyp = build_token_sequence("the cat the", &mut vocab, true, false);
        let reference = build_token_sequence("cat the", &mut vocab, true, false);
        assert_eq!(hyp.tokens, vec![0, 1, 0]);
        assert_eq!(reference.tokens, vec![1, 0]);
        assert_eq!(vocab.len(), 2);
    }

    #[test]
    fn case_sensitive_keeps_distinct_ids() {
        let mut vocab = Vocabulary::new();
        let seq = build_token_sequence("The the", &mut vocab, true, false);
        assert_ne!(seq.tokens[0], seq.tokens[1]);
    }

    #[test]
    fn case_insensitive_folds_to_one_id() {
        let mut vocab = Vocabulary::new();
        let seq = build_token_sequence("The THE the", &mut vocab, false, false);
        assert_eq!(seq.tokens, vec![0, 0, 0]);
    }

    #[test]
    fn strip_punctuation_drops_empty_words() {
        let mut vocab = Vocabulary::new();
        let seq = build_token_sequence("hello , world!", &mut vocab, true, true);
        assert_eq!(seq.len(), 2);
        assert_eq!(normalize_word("world!", true, true).as_deref(), Some("world"));
        assert_eq!(normalize_word("--", true, true), None);
    }

    #[test]
    fn pre_split_words_use_same_normalization() {
        let mut vocab = Vocabulary::new();
        let a = build_token_sequence_from_words(["A", "b"], &mut vocab, false, false);
        let b = build_token_sequence("a B", &mut vocab, false, false);
        assert_eq!(a, b);
    }
}
