//! Greedy block-shift search used by TER.
//!
//! Finding the cheapest mix of shifts and edits is intractable for realistic
//! lengths, so this is an approximation with a fixed, reproducible procedure:
//!
//! 1. enumerate the maximal hypothesis blocks (capped at `max_shift_size`
//!    tokens) that exactly match a reference span and are not already aligned
//!    to it;
//! 2. for each, move the block so it lines up with its reference span and
//!    re-align: net change = new edit cost + 1 - current edit cost;
//! 3. apply the candidate with the most negative change, ties broken by smallest
//!    source index, then smallest destination, then smallest reference start;
//! 4. stop when nothing improves or after `iteration_cap` applied shifts.
//!
//! Results depend only on the inputs and the limits.

use serde::{Deserialize, Serialize};

use crate::alignment::edit_distance::align;
use crate::types::EditScript;

mod candidate_selector;
mod candidates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftLimits {
    pub iteration_cap: usize,
    pub max_shift_size: usize,
    pub max_shift_distance: usize,
}

impl ShiftLimits {
    pub const DEFAULT_ITERATION_CAP: usize = 1_000;
    pub const DEFAULT_MAX_SHIFT_SIZE: usize = 10;
    pub const DEFAULT_MAX_SHIFT_DISTANCE: usize = 50;
}

impl Default for ShiftLimits {
    fn default() -> Self {
        Self {
            iteration_cap: Self::DEFAULT_ITERATION_CAP,
            max_shift_size: Self::DEFAULT_MAX_SHIFT_SIZE,
            max_shift_distance: Self::DEFAULT_MAX_SHIFT_DISTANCE,
        }
    }
}

/// One applied relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    /// Block start in the hypothesis order the shift was applied to.
    pub source_start: usize,
    pub length: usize,
    /// Insertion point in that order with the block removed.
    pub destination: usize,
    /// Reference span start the block matches.
    pub ref_start: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftedAlignment {
    /// `order[k]` is the original hypothesis index now at position `k`.
    pub order: Vec<usize>,
    /// Alignment of the reordered hypothesis against the reference.
    pub script: EditScript,
    pub shifts: Vec<Shift>,
    /// Edit cost before any shift.
    pub initial_cost: usize,
    /// False when the iteration cap stopped the search while a shift still helped.
    pub converged: bool,
}

impl ShiftedAlignment {
    /// Edit cost of the final alignment plus one unit per shift.
    pub fn total_cost(&self) -> usize {
        self.script.cost() + self.shifts.len()
    }

    pub fn shift_count(&self) -> usize {
        self.shifts.len()
    }
}

/// Improve `initial` (the plain alignment of `hyp` against `reference`) with
/// block shifts. See the module docs for the exact procedure.
pub fn optimize<T: PartialEq>(
    hyp: &[T],
    reference: &[T],
    initial: EditScript,
    limits: ShiftLimits,
) -> ShiftedAlignment {
    debug_assert_eq!(initial.hyp_len(), hyp.len());
    debug_assert_eq!(initial.ref_len(), reference.len());

    let reference: Vec<&T> = reference.iter().collect();
    let initial_cost = initial.cost();
    let mut order: Vec<usize> = (0..hyp.len()).collect();
    let mut script = initial;
    let mut shifts = Vec::new();
    let mut converged = true;

    loop {
        let cost = script.cost();
        if cost == 0 {
            break;
        }

        let current: Vec<&T> = order.iter().map(|&k| &hyp[k]).collect();
        let found = candidates::enumerate(&current, &reference, &script, limits);
        let Some(selected) =
            candidate_selector::select_best(&current, &reference, &order, cost, found)
        else {
            break;
        };

        if shifts.len() >= limits.iteration_cap {
            tracing::warn!(
                iteration_cap = limits.iteration_cap,
                remaining_cost = cost,
                "shift search stopped at iteration cap"
            );
            converged = false;
            break;
        }

        tracing::debug!(
            source_start = selected.candidate.source_start,
            length = selected.candidate.length,
            destination = selected.candidate.destination,
            ref_start = selected.candidate.ref_start,
            cost_before = cost,
            cost_after = selected.edit_cost,
            "shift: applied block relocation"
        );

        shifts.push(Shift {
            source_start: selected.candidate.source_start,
            length: selected.candidate.length,
            destination: selected.candidate.destination,
            ref_start: selected.candidate.ref_start,
        });
        order = selected.order;
        let shifted: Vec<&T> = order.iter().map(|&k| &hyp[k]).collect();
        script = align(&shifted, &reference);
    }

    ShiftedAlignment {
        order,
        script,
        shifts,
        initial_cost,
        converged,
    }
}
