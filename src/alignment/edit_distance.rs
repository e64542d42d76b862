use crate::types::{EditOp, EditScript};

/// Minimum-cost edit script turning `hyp` into `reference`.
///
/// Fills a `(hyp.len() + 1) x (reference.len() + 1)` Levenshtein table with unit
/// costs, then backtracks from the bottom-right corner. When several
/// predecessors reach a cell at the same cost the choice is fixed:
/// Match > Substitution > Deletion > Insertion.
pub fn align<T: PartialEq>(hyp: &[T], reference: &[T]) -> EditScript {
    let h_len = hyp.len();
    let r_len = reference.len();
    let stride = r_len + 1;
    let table = fill_table(hyp, reference);

    let mut ops = Vec::with_capacity(h_len.max(r_len));
    let (mut i, mut j) = (h_len, r_len);
    while i > 0 || j > 0 {
        let here = table[i * stride + j];
        if i > 0 && j > 0 {
            let diag = table[(i - 1) * stride + (j - 1)];
            let same = hyp[i - 1] == reference[j - 1];
            if same && diag == here {
                ops.push(EditOp::Match {
                    hyp: i - 1,
                    reference: j - 1,
                });
                i -= 1;
                j -= 1;
                continue;
            }
            if !same && diag + 1 == here {
                ops.push(EditOp::Substitution {
                    hyp: i - 1,
                    reference: j - 1,
                });
                i -= 1;
                j -= 1;
                continue;
            }
        }
        if j > 0 && table[i * stride + (j - 1)] + 1 == here {
            ops.push(EditOp::Deletion { reference: j - 1 });
            j -= 1;
            continue;
        }
        debug_assert!(i > 0 && table[(i - 1) * stride + j] + 1 == here);
        ops.push(EditOp::Insertion { hyp: i - 1 });
        i -= 1;
    }

    ops.reverse();
    EditScript::new(ops)
}

/// Cost of [`align`] without reconstructing the script; two rolling rows.
pub fn edit_distance<T: PartialEq>(hyp: &[T], reference: &[T]) -> usize {
    let r_len = reference.len();
    let mut prev: Vec<usize> = (0..=r_len).collect();
    let mut curr = vec![0usize; r_len + 1];

    for (i, h) in hyp.iter().enumerate() {
        curr[0] = i + 1;
        for (j, r) in reference.iter().enumerate() {
            let diag = prev[j] + usize::from(h != r);
            curr[j + 1] = diag.min(curr[j] + 1).min(prev[j + 1] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[r_len]
}

fn fill_table<T: PartialEq>(hyp: &[T], reference: &[T]) -> Vec<usize> {
    let h_len = hyp.len();
    let r_len = reference.len();
    let stride = r_len + 1;
    let mut table = vec![0usize; (h_len + 1) * stride];

    for j in 0..=r_len {
        table[j] = j;
    }
    for i in 1..=h_len {
        table[i * stride] = i;
        for j in 1..=r_len {
            let diag = table[(i - 1) * stride + (j - 1)] + usize::from(hyp[i - 1] != reference[j - 1]);
            let deletion = table[i * stride + (j - 1)] + 1;
            let insertion = table[(i - 1) * stride + j] + 1;
            table[i * stride + j] = diag.min(deletion).min(insertion);
        }
    }
    table
}
