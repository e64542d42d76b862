use std::collections::HashSet;

use super::candidates::{apply, ShiftCandidate};
use crate::alignment::edit_distance::edit_distance;

#[derive(Debug)]
pub(super) struct SelectedShift {
    pub(super) candidate: ShiftCandidate,
    /// Hypothesis order after applying the candidate.
    pub(super) order: Vec<usize>,
    /// Edit cost of the shifted hypothesis, excluding the shift itself.
    pub(super) edit_cost: usize,
}

/// Candidate with the largest strict cost reduction, or `None` if no shift pays
/// for itself.
///
/// Net change is `edit_cost_after + 1 - current_cost`. Ordering among
/// candidates with the same change: smaller `source_start`, then smaller
/// `destination`, then smaller `ref_start`.
pub(super) fn select_best<T: PartialEq>(
    current: &[T],
    reference: &[T],
    order: &[usize],
    current_cost: usize,
    candidates: Vec<ShiftCandidate>,
) -> Option<SelectedShift> {
    let positions: Vec<usize> = (0..current.len()).collect();
    let reference: Vec<&T> = reference.iter().collect();
    let mut seen: HashSet<(usize, usize, usize)> = HashSet::with_capacity(candidates.len());
    let mut best: Option<(SelectionKey, ShiftCandidate, usize)> = None;

    for candidate in candidates {
        // Same block and destination reached through another reference span.
        if !seen.insert((candidate.source_start, candidate.length, candidate.destination)) {
            continue;
        }

        let local = apply(&positions, &candidate);
        let shifted: Vec<&T> = local.iter().map(|&k| &current[k]).collect();
        let edit_cost = edit_distance(&shifted, &reference);
        let net_change = (edit_cost + 1) as isize - current_cost as isize;
        if net_change >= 0 {
            continue;
        }

        let key = SelectionKey {
            net_change,
            source_start: candidate.source_start,
            destination: candidate.destination,
            ref_start: candidate.ref_start,
        };
        let should_replace = match &best {
            None => true,
            Some((current_key, _, _)) => key < *current_key,
        };
        if should_replace {
            best = Some((key, candidate, edit_cost));
        }
    }

    best.map(|(_, candidate, edit_cost)| SelectedShift {
        order: apply(order, &candidate),
        candidate,
        edit_cost,
    })
}

/// Field order is the tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct SelectionKey {
    net_change: isize,
    source_start: usize,
    destination: usize,
    ref_start: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_candidates_selects_nothing() {
        let tokens = ["a", "b"];
        assert!(select_best(&tokens, &tokens, &[0, 1], 0, Vec::new()).is_none());
    }

    #[test]
    fn non_improving_candidate_is_rejected() {
        // The hypothesis already equals the reference; any move only adds cost.
        let current = ["b", "a"];
        let reference = ["b", "a"];
        let candidate = ShiftCandidate {
            source_start: 1,
            length: 1,
            ref_start: 1,
            destination: 0,
        };
        assert!(select_best(&current, &reference, &[0, 1], 0, vec![candidate]).is_none());
    }

    #[test]
    fn largest_reduction_wins() {
        let current = ["c", "d", "e", "a", "b"];
        let reference = ["a", "b", "c", "d", "e"];
        let single = ShiftCandidate {
            source_start: 3,
            length: 1,
            ref_start: 0,
            destination: 0,
        };
        let pair = ShiftCandidate {
            source_start: 3,
            length: 2,
            ref_start: 0,
            destination: 0,
        };
        let selected = select_best(&current, &reference, &[0, 1, 2, 3, 4], 4, vec![single, pair])
            .expect("an improving shift exists");
        assert_eq!(selected.candidate, pair);
        assert_eq!(selected.edit_cost, 0);
        assert_eq!(selected.order, vec![3, 4, 0, 1, 2]);
    }

    #[test]
    fn ties_prefer_smaller_source_start() {
        let key_a = SelectionKey {
            net_change: -2,
            source_start: 1,
            destination: 5,
            ref_start: 0,
        };
        let key_b = SelectionKey {
            net_change: -2,
            source_start: 2,
            destination: 0,
            ref_start: 0,
        };
        let key_c = SelectionKey {
            net_change: -3,
            source_start: 9,
            destination: 9,
            ref_start: 0,
        };
        assert!(key_a < key_b);
        assert!(key_c < key_a);
    }
}
