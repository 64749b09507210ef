//! Approximate solver: greedy fill followed by exact local repair.
//!
//! 1. **Greedy fill.** Visit cells from heaviest to lightest (positive cells
//!    only) and select each one that has no selected neighbour, until the card
//!    budget is spent.
//! 2. **Local repair.** Repeatedly pick a random window of rows, clear it,
//!    and re-solve it exactly with [`solve_bottom_up`], using the rows just
//!    outside the window as boundary masks and the budget left over by the
//!    rest of the board.
//!
//! The current selection is always feasible for the window's sub-problem, so
//! a repair never lowers the objective.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::*;
use crate::dp_solver::solve_bottom_up;
use crate::error::{SolveResult, SolverError};
use crate::row_scoring::path_value;
use crate::types::{Board, Boundary, Mask, Solution};

/// Tuning knobs for [`greedy_and_repair`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GreedyRepairParams {
    /// Number of repair rounds.
    pub iterations: usize,
    /// Repair window height as a fraction of the board height.
    pub region_fraction: f64,
}

impl Default for GreedyRepairParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_REPAIR_ITERATIONS,
            region_fraction: DEFAULT_REGION_FRACTION,
        }
    }
}

impl GreedyRepairParams {
    pub fn validate(&self) -> SolveResult<()> {
        if !(self.region_fraction > 0.0 && self.region_fraction <= 1.0) {
            return Err(SolverError::parameter(format!(
                "region_fraction must be in (0, 1], got {}",
                self.region_fraction
            )));
        }
        Ok(())
    }

    /// Window height in rows for a board of `rows` rows.
    pub fn region_rows(&self, rows: usize) -> usize {
        ((self.region_fraction * rows as f64) as usize).max(MIN_REGION_ROWS)
    }
}

/// Best selection found plus the objective after the fill and after every repair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GreedyRepairOutcome {
    pub solution: Solution,
    pub trace: Vec<i64>,
}

/// True if cell (row, col) is unselected and has no selected neighbour.
fn can_select(masks: &[Mask], row: usize, col: usize) -> bool {
    let bit: Mask = 1 << col;
    let row_neighbours = bit | (bit << 1) | (bit >> 1);
    masks[row] & row_neighbours == 0
        && (row == 0 || masks[row - 1] & bit == 0)
        && (row + 1 == masks.len() || masks[row + 1] & bit == 0)
}

/// Greedily select the heaviest positive cells that keep the selection independent.
pub fn greedy_fill(board: &Board, max_cards: usize) -> Vec<Mask> {
    let mut masks = vec![EMPTY_MASK; board.rows()];
    let mut cells: Vec<(i32, usize, usize)> = (0..board.rows())
        .flat_map(|r| (0..board.width()).map(move |c| (r, c)))
        .map(|(r, c)| (board.cell(r, c), r, c))
        .filter(|&(w, _, _)| w > 0)
        .collect();
    // Heaviest first; ties in row-major order.
    cells.sort_by(|a, b| b.0.cmp(&a.0).then((a.1, a.2).cmp(&(b.1, b.2))));

    let mut selected = 0usize;
    for (_, r, c) in cells {
        if selected >= max_cards {
            break;
        }
        if can_select(&masks, r, c) {
            masks[r] |= 1 << c;
            selected += 1;
        }
    }
    masks
}

/// Clear rows `first_row..first_row + region_rows` (clipped to the board) and
/// re-solve them exactly against the surrounding selection.
pub fn repair_region(
    board: &Board,
    masks: &mut [Mask],
    first_row: usize,
    region_rows: usize,
    max_cards: usize,
) -> SolveResult<()> {
    let rows = board.rows();
    let last_row = (first_row + region_rows).min(rows);
    let boundary = Boundary::new(
        if first_row > 0 { masks[first_row - 1] } else { EMPTY_MASK },
        if last_row < rows { masks[last_row] } else { EMPTY_MASK },
    );
    let count = |ms: &[Mask]| ms.iter().map(|m| m.count_ones() as usize).sum::<usize>();
    let outside = count(masks) - count(&masks[first_row..last_row]);
    let budget = max_cards.saturating_sub(outside);

    let window = board.slice_rows(first_row..last_row)?;
    let repaired = solve_bottom_up(&window, budget, boundary)?;
    masks[first_row..last_row].copy_from_slice(&repaired.path);
    Ok(())
}

/// Greedy fill plus `params.iterations` random window repairs.
pub fn greedy_and_repair(
    board: &Board,
    max_cards: usize,
    params: &GreedyRepairParams,
    seed: u64,
) -> SolveResult<GreedyRepairOutcome> {
    params.validate()?;
    let rows = board.rows();
    let region_rows = params.region_rows(rows);
    let mut rng = SmallRng::seed_from_u64(seed);

    let mut masks = greedy_fill(board, max_cards);
    let mut trace = Vec::with_capacity(params.iterations + 1);
    trace.push(path_value(board, &masks));
    debug!(value = trace[0], rows, max_cards, "greedy fill done");

    for _ in 0..params.iterations {
        let first_row = rng.random_range(0..rows);
        repair_region(board, &mut masks, first_row, region_rows, max_cards)?;
        trace.push(path_value(board, &masks));
    }

    let value = trace.last().copied().unwrap_or(0);
    debug!(
        value,
        iterations = params.iterations,
        region_rows,
        "greedy repair done"
    );
    Ok(GreedyRepairOutcome {
        solution: Solution { value, path: masks },
        trace,
    })
}
