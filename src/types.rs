use serde::{Deserialize, Serialize};

/// Token ids for one side of a scoring call.
///
/// Equality is exact id equality. String tokens are mapped to ids by a
/// per-call [`Vocabulary`](crate::alignment::tokenization::Vocabulary), so two
/// sequences are only comparable when they were interned together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenSequence {
    pub tokens: Vec<usize>,
}

impl TokenSequence {
    pub fn from_ids(tokens: Vec<usize>) -> Self {
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl From<Vec<usize>> for TokenSequence {
    fn from(tokens: Vec<usize>) -> Self {
        Self { tokens }
    }
}

impl AsRef<[usize]> for TokenSequence {
    fn as_ref(&self) -> &[usize] {
        &self.tokens
    }
}

/// One step of an edit script. Indices point into the hypothesis (`hyp`) and
/// reference (`reference`) that were aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    Match { hyp: usize, reference: usize },
    Substitution { hyp: usize, reference: usize },
    /// Hypothesis token with no reference counterpart.
    Insertion { hyp: usize },
    /// Reference token missing from the hypothesis.
    Deletion { reference: usize },
}

impl EditOp {
    pub fn cost(&self) -> usize {
        match self {
            EditOp::Match { .. } => 0,
            EditOp::Substitution { .. } | EditOp::Insertion { .. } | EditOp::Deletion { .. } => 1,
        }
    }

    pub fn hyp_index(&self) -> Option<usize> {
        match *self {
            EditOp::Match { hyp, .. }
            | EditOp::Substitution { hyp, .. }
            | EditOp::Insertion { hyp } => Some(hyp),
            EditOp::Deletion { .. } => None,
        }
    }

    pub fn ref_index(&self) -> Option<usize> {
        match *self {
            EditOp::Match { reference, .. }
            | EditOp::Substitution { reference, .. }
            | EditOp::Deletion { reference } => Some(reference),
            EditOp::Insertion { .. } => None,
        }
    }
}

/// Ordered edit operations that consume the whole hypothesis and reference.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EditScript {
    pub ops: Vec<EditOp>,
}

impl EditScript {
    pub fn new(ops: Vec<EditOp>) -> Self {
        Self { ops }
    }

    /// #Substitution + #Insertion + #Deletion.
    pub fn cost(&self) -> usize {
        self.ops.iter().map(EditOp::cost).sum()
    }

    pub fn matches(&self) -> usize {
        self.count(|op| matches!(op, EditOp::Match { .. }))
    }

    pub fn substitutions(&self) -> usize {
        self.count(|op| matches!(op, EditOp::Substitution { .. }))
    }

    pub fn insertions(&self) -> usize {
        self.count(|op| matches!(op, EditOp::Insertion { .. }))
    }

    pub fn deletions(&self) -> usize {
        self.count(|op| matches!(op, EditOp::Deletion { .. }))
    }

    pub fn hyp_len(&self) -> usize {
        self.ops.iter().filter(|op| op.hyp_index().is_some()).count()
    }

    pub fn ref_len(&self) -> usize {
        self.ops.iter().filter(|op| op.ref_index().is_some()).count()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    fn count(&self, pred: impl Fn(&EditOp) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }
}

/// A metric value that may be vacuous.
///
/// `Undefined` covers the degenerate cases (TER against an empty reference with a
/// non-empty hypothesis, R-Precision with no relevant items, an empty corpus).
/// It reports as the sentinel `0.0` so corpus aggregation never has to stop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rate {
    Defined(f64),
    Undefined,
}

impl Rate {
    pub const SENTINEL: f64 = 0.0;

    pub fn value(self) -> f64 {
        match self {
            Rate::Defined(value) => value,
            Rate::Undefined => Self::SENTINEL,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Rate::Defined(_))
    }

    /// `numerator / denominator`, with 0/0 defined as 0 and x/0 as undefined.
    pub fn ratio(numerator: u64, denominator: u64) -> Self {
        match (numerator, denominator) {
            (0, 0) => Rate::Defined(0.0),
            (_, 0) => Rate::Undefined,
            (n, d) => Rate::Defined(n as f64 / d as f64),
        }
    }
}
