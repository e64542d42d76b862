use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::alignment::shift::ShiftedAlignment;
use crate::error::MetricError;
use crate::types::Rate;

/// Shift-aware edit count of one hypothesis against its chosen reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerScore {
    /// Edits plus shifts.
    pub edits: usize,
    pub ref_length: usize,
    pub shifts: usize,
    /// Plain edit distance to the same reference before any shift.
    pub unshifted_edits: usize,
    /// Position of the selected reference in the caller's list.
    pub reference_index: usize,
    /// False when the shift search hit its iteration cap.
    pub converged: bool,
}

impl TerScore {
    /// `edits / ref_length`; 0 for an empty pair, undefined for edits against an
    /// empty reference.
    pub fn rate(&self) -> Rate {
        Rate::ratio(self.edits as u64, self.ref_length as u64)
    }

    /// Orders by rate without going through floating point.
    fn cmp_rate(&self, other: &Self) -> Ordering {
        let (a_num, a_den) = rate_fraction(self.edits, self.ref_length);
        let (b_num, b_den) = rate_fraction(other.edits, other.ref_length);
        (a_num * b_den).cmp(&(b_num * a_den))
    }
}

/// An undefined rate compares as 1/0, above every finite rate.
fn rate_fraction(edits: usize, ref_length: usize) -> (u128, u128) {
    match (edits, ref_length) {
        (0, 0) => (0, 1),
        (_, 0) => (1, 0),
        (e, l) => (e as u128, l as u128),
    }
}

/// Score against every reference and keep the best one.
///
/// `score_one` maps a reference index to its shifted alignment. The winner has
/// the lowest rate, then the fewest edits, then the earliest position.
pub fn best_of_references(
    reference_lengths: &[usize],
    mut score_one: impl FnMut(usize) -> ShiftedAlignment,
) -> Result<TerScore, MetricError> {
    let mut best: Option<TerScore> = None;
    for (reference_index, &ref_length) in reference_lengths.iter().enumerate() {
        let shifted = score_one(reference_index);
        let candidate = TerScore {
            edits: shifted.total_cost(),
            ref_length,
            shifts: shifted.shift_count(),
            unshifted_edits: shifted.initial_cost,
            reference_index,
            converged: shifted.converged,
        };
        let should_replace = match &best {
            None => true,
            Some(current) => candidate
                .cmp_rate(current)
                .then(candidate.edits.cmp(&current.edits))
                == Ordering::Less,
        };
        if should_replace {
            best = Some(candidate);
        }
    }

    let best = best.ok_or_else(|| MetricError::invalid_input("TER needs at least one reference"))?;
    tracing::debug!(
        reference_index = best.reference_index,
        edits = best.edits,
        shifts = best.shifts,
        ref_length = best.ref_length,
        "ter: selected reference"
    );
    Ok(best)
}
