//! Admissible reward-to-go bound h(row, previous mask, cards left) for A*.
//!
//! Rows are partitioned into windows ("blocks") of `block_size` rows,
//! processed from the last block to the first:
//!
//! 1. **Exact block DP.** Inside a block the profile DP runs row by row,
//!    seeded at the block's trailing edge by the table already computed for
//!    the first row after the block (row R is the all-zero base case). Only
//!    positive cells are counted, so a mask never scores below what any of its
//!    subsets could earn.
//! 2. **Boundary inflation.** Before stepping to the next block toward the
//!    front, every row of that block is provisionally set to
//!    `max(h(row + 1, mask, k), top_k[k])`, where `top_k[k]` is the sum of the
//!    `k` largest positive cells from the new block's first row to the end of
//!    the board (placement constraints ignored). The exact block DP then
//!    replaces the provisional value and must never exceed it.
//!
//! The whole table is built once per solve; A* lookups are O(1).
//!
//! Admissibility: a selection from row `i` with at most `k` cards can never
//! beat the `k` best positive cells from row `i` on, and within a block the
//! table equals the optimum of the positive-part relaxation, which in turn is
//! at least the true optimum.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::constants::*;
use crate::error::{SolveResult, SolverError};
use crate::mask_tables::MaskTables;
use crate::row_scoring::positive_row_sum;
use crate::types::{Board, Mask};

/// Precomputed heuristic table for one board and card budget.
pub struct BlockHeuristic {
    tables: Arc<MaskTables>,
    rows: usize,
    card_limit: usize,
    block_size: usize,
    /// values[state_index(row, mask, cards_left)] for rows 0..=R.
    values: Vec<i64>,
}

impl BlockHeuristic {
    pub fn new(board: &Board, max_cards: usize, block_size: usize) -> SolveResult<Self> {
        if block_size == 0 {
            return Err(SolverError::InvalidBlockSize(block_size));
        }
        let start = Instant::now();
        let tables = MaskTables::shared(board.width())?;
        let rows = board.rows();
        let card_limit = max_cards.min(board.max_selectable());
        let n = tables.num_masks();

        let mut heuristic = Self {
            values: vec![0; num_states(rows, n, card_limit)],
            tables,
            rows,
            card_limit,
            block_size,
        };

        let mut block_end = rows;
        let mut blocks = 0usize;
        while block_end > 0 {
            let block_start = block_end.saturating_sub(block_size);
            for row in (block_start..block_end).rev() {
                heuristic.solve_row(board, row);
            }
            blocks += 1;
            if block_start > 0 {
                let next_start = block_start.saturating_sub(block_size);
                let top_k = suffix_top_k(board, next_start, card_limit);
                heuristic.inflate(next_start..block_start, &top_k);
            }
            block_end = block_start;
        }

        debug!(
            rows,
            block_size,
            blocks,
            card_limit,
            states = heuristic.values.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
            "block heuristic built"
        );
        Ok(heuristic)
    }

    #[inline(always)]
    fn index(&self, row: usize, mask_index: usize, cards_left: usize) -> usize {
        state_index(
            row,
            mask_index,
            cards_left,
            self.tables.num_masks(),
            self.card_limit,
        )
    }

    /// Exact DP step for one row, reading the already-final row below it.
    fn solve_row(&mut self, board: &Board, row: usize) {
        let tables = Arc::clone(&self.tables);
        let n = tables.num_masks();
        let cells = board.row(row);
        let gains: Vec<i64> = tables
            .masks
            .iter()
            .map(|&m| positive_row_sum(cells, m))
            .collect();

        for prev in 0..n {
            let base = self.index(row, prev, 0);
            self.values[base] = 0;
            for cards_left in 1..=self.card_limit {
                let mut best = 0i64;
                for &m in &tables.compatible[prev] {
                    let used = tables.bit_counts[m];
                    if used > cards_left {
                        continue;
                    }
                    let value = gains[m] + self.values[self.index(row + 1, m, cards_left - used)];
                    if value > best {
                        best = value;
                    }
                }
                debug_assert!(
                    row + self.block_size >= self.rows || best <= self.values[base + cards_left],
                    "block value {} exceeds the relaxed bound {} at row {row}",
                    best,
                    self.values[base + cards_left]
                );
                self.values[base + cards_left] = best;
            }
        }
    }

    /// Provisional bound for the rows of the next block toward the front.
    fn inflate(&mut self, rows: std::ops::Range<usize>, top_k: &[i64]) {
        let n = self.tables.num_masks();
        for row in rows.rev() {
            for mask in 0..n {
                for cards_left in 0..=self.card_limit {
                    let below = self.values[self.index(row + 1, mask, cards_left)];
                    let slot = self.index(row, mask, cards_left);
                    self.values[slot] = below.max(top_k[cards_left]);
                }
            }
        }
    }

    /// Upper bound on the reward obtainable from `row` onward, given the
    /// previous row's `mask` and `cards_left` remaining cards.
    pub fn h(&self, row: usize, mask: Mask, cards_left: usize) -> SolveResult<i64> {
        let mask_index = self.tables.require_index(mask)?;
        if row > self.rows {
            return Err(SolverError::parameter(format!(
                "row {row} is past the terminal row {}",
                self.rows
            )));
        }
        Ok(self.h_at(row, mask_index, cards_left.min(self.card_limit)))
    }

    /// Unchecked lookup by mask index for the search hot loop.
    #[inline(always)]
    pub(crate) fn h_at(&self, row: usize, mask_index: usize, cards_left: usize) -> i64 {
        self.values[self.index(row, mask_index, cards_left)]
    }

    pub fn card_limit(&self) -> usize {
        self.card_limit
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn tables(&self) -> &Arc<MaskTables> {
        &self.tables
    }
}

/// top_k[k] = sum of the `k` largest positive cells in rows `from_row..`,
/// for k in 0..=limit. Saturates once the positive cells run out.
pub fn suffix_top_k(board: &Board, from_row: usize, limit: usize) -> Vec<i64> {
    let mut positives: Vec<i64> = board.cells()[from_row * board.width()..]
        .iter()
        .filter(|&&v| v > 0)
        .map(|&v| v as i64)
        .collect();
    positives.sort_unstable_by(|a, b| b.cmp(a));

    let mut top_k = vec![0i64; limit + 1];
    for k in 1..=limit {
        top_k[k] = top_k[k - 1] + positives.get(k - 1).copied().unwrap_or(0);
    }
    top_k
}
