use super::ShiftLimits;
use crate::types::{EditOp, EditScript};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct ShiftCandidate {
    pub(super) source_start: usize,
    pub(super) length: usize,
    pub(super) ref_start: usize,
    pub(super) destination: usize,
}

/// Maximal blocks of `current` that exactly match a reference span. A block
/// cannot be extended to the left and runs until the first mismatch or
/// `max_shift_size`. Blocks already matched in place or beyond the distance
/// limit are skipped, and so are moves that leave the block where it is.
pub(super) fn enumerate<T: PartialEq>(
    current: &[T],
    reference: &[T],
    script: &EditScript,
    limits: ShiftLimits,
) -> Vec<ShiftCandidate> {
    let matched = matched_reference_positions(current.len(), script);
    let consumed_before = hyp_consumed_before_ref(reference.len(), script);
    let mut out = Vec::new();

    for source_start in 0..current.len() {
        for ref_start in 0..reference.len() {
            if source_start.abs_diff(ref_start) > limits.max_shift_distance {
                continue;
            }
            if extends_left(current, reference, source_start, ref_start) {
                continue;
            }

            let length = run_length(
                current,
                reference,
                source_start,
                ref_start,
                limits.max_shift_size,
            );
            if length == 0 {
                continue;
            }
            let already_aligned =
                (0..length).all(|k| matched[source_start + k] == Some(ref_start + k));
            if already_aligned {
                continue;
            }

            let destination = destination_for(consumed_before[ref_start], source_start, length);
            if destination == source_start {
                continue;
            }
            out.push(ShiftCandidate {
                source_start,
                length,
                ref_start,
                destination,
            });
        }
    }

    out
}

/// True when the tokens just before both starts match, so the block starting
/// here is part of a longer run.
pub(super) fn extends_left<T: PartialEq>(
    current: &[T],
    reference: &[T],
    source_start: usize,
    ref_start: usize,
) -> bool {
    source_start > 0 && ref_start > 0 && current[source_start - 1] == reference[ref_start - 1]
}

/// Length of the matching run at (`source_start`, `ref_start`), capped at `max_len`.
pub(super) fn run_length<T: PartialEq>(
    current: &[T],
    reference: &[T],
    source_start: usize,
    ref_start: usize,
    max_len: usize,
) -> usize {
    current[source_start..]
        .iter()
        .zip(&reference[ref_start..])
        .take(max_len)
        .take_while(|(h, r)| h == r)
        .count()
}

/// Reorder `order` by lifting out the candidate block and re-inserting it at
/// `destination` (an index into the order with the block removed).
pub(super) fn apply(order: &[usize], candidate: &ShiftCandidate) -> Vec<usize> {
    let start = candidate.source_start;
    let end = start + candidate.length;
    let block = &order[start..end];
    let remainder: Vec<usize> = order[..start]
        .iter()
        .chain(order[end..].iter())
        .copied()
        .collect();

    let mut shifted = Vec::with_capacity(order.len());
    shifted.extend_from_slice(&remainder[..candidate.destination]);
    shifted.extend_from_slice(block);
    shifted.extend_from_slice(&remainder[candidate.destination..]);
    shifted
}

/// Where the block must go so it sits right before whatever the current
/// alignment places in front of reference position `ref_start`.
///
/// `consumed` counts hypothesis tokens the script uses up before it reaches
/// `ref_start`; block tokens among them are discounted because the block is
/// lifted out first.
fn destination_for(consumed: usize, source_start: usize, length: usize) -> usize {
    consumed - consumed.saturating_sub(source_start).min(length)
}

fn matched_reference_positions(hyp_len: usize, script: &EditScript) -> Vec<Option<usize>> {
    let mut matched = vec![None; hyp_len];
    for op in &script.ops {
        if let EditOp::Match { hyp, reference } = *op {
            matched[hyp] = Some(reference);
        }
    }
    matched
}

fn hyp_consumed_before_ref(ref_len: usize, script: &EditScript) -> Vec<usize> {
    let mut before = vec![0usize; ref_len];
    let mut consumed = 0usize;
    for op in &script.ops {
        if let Some(reference) = op.ref_index() {
            before[reference] = consumed;
        }
        if op.hyp_index().is_some() {
            consumed += 1;
        }
    }
    before
}
