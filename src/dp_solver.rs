//! Exact profile DP over (row, previous-row mask, cards) states.
//!
//! Two formulations that agree on the optimal value:
//!
//! - [`solve_bottom_up`]: tabulates rows from last to first. Each layer is a
//!   sparse map from (mask, cards used from this row to the end) to the best
//!   reward, holding only reachable pairs. Ties keep the most recently
//!   computed entry.
//! - [`solve_top_down`]: memoized reward-to-go from (row, cards used, previous
//!   mask), evaluated with an explicit work stack so that board height is not
//!   limited by the call stack. Ties keep the first maximizer found.
//!
//! Both accept a [`Boundary`] so a bounded window of a larger board can be
//! re-solved against the fixed rows just outside it.
//!
//! Paths are reconstructed from per-state choices rather than by carrying
//! whole paths in the tables.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::time::Instant;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::constants::*;
use crate::error::{SolveResult, SolverError};
use crate::mask_tables::MaskTables;
use crate::row_scoring::row_sum;
use crate::types::{Board, Boundary, Solution};

/// Per-row lists of masks (by index) allowed after each previous mask.
///
/// Only the first and last rows differ from plain compatibility, because
/// they are also constrained by the boundary masks.
pub(crate) struct AllowedMoves {
    rows: usize,
    first: Vec<Vec<usize>>,
    middle: Vec<Vec<usize>>,
    last: Vec<Vec<usize>>,
    single: Vec<Vec<usize>>,
}

impl AllowedMoves {
    pub(crate) fn new(tables: &MaskTables, rows: usize, initial: usize, last: usize) -> Self {
        let build = |row: usize, rows: usize| -> Vec<Vec<usize>> {
            (0..tables.num_masks())
                .map(|prev| tables.allowed_after(prev, row, rows, initial, last))
                .collect()
        };
        Self {
            rows,
            first: build(0, usize::MAX),
            middle: tables.compatible.clone(),
            last: build(1, 2),
            single: build(0, 1),
        }
    }

    #[inline(always)]
    pub(crate) fn for_row(&self, row: usize) -> &[Vec<usize>] {
        match (row == 0, row + 1 == self.rows) {
            (true, true) => &self.single,
            (true, false) => &self.first,
            (false, true) => &self.last,
            (false, false) => &self.middle,
        }
    }
}

/// Validated inputs shared by both DP formulations.
struct DpSetup {
    tables: std::sync::Arc<MaskTables>,
    rows: usize,
    card_limit: usize,
    initial: usize,
    moves: AllowedMoves,
}

impl DpSetup {
    fn new(board: &Board, max_cards: usize, boundary: Boundary) -> SolveResult<Self> {
        boundary.validate(board)?;
        let tables = MaskTables::shared(board.width())?;
        let initial = tables.require_index(boundary.initial_mask)?;
        let last = tables.require_index(boundary.final_mask)?;
        let rows = board.rows();
        let moves = AllowedMoves::new(&tables, rows, initial, last);
        Ok(Self {
            // A budget above the selectable cell count never binds.
            card_limit: max_cards.min(board.max_selectable()),
            tables,
            rows,
            initial,
            moves,
        })
    }
}

/// Exact optimum with the default formulation (bottom-up tabulation).
pub fn solve_dp(board: &Board, max_cards: usize, boundary: Boundary) -> SolveResult<Solution> {
    solve_bottom_up(board, max_cards, boundary)
}

/// Tabulated layer entry: best reward from this row to the end, and the mask
/// (by index) chosen for the row below.
#[derive(Clone, Copy, Debug)]
struct LayerEntry {
    value: i64,
    next: usize,
}

/// Layer key: (mask index of this row, cards used from this row to the end).
type Layer = BTreeMap<(usize, usize), LayerEntry>;

/// Bottom-up tabulation from the last row to the first.
pub fn solve_bottom_up(
    board: &Board,
    max_cards: usize,
    boundary: Boundary,
) -> SolveResult<Solution> {
    let start = Instant::now();
    let setup = DpSetup::new(board, max_cards, boundary)?;
    let tables = &setup.tables;
    let rows = setup.rows;

    // Virtual row below the board: every mask, zero cards, zero reward.
    let below: Layer = (0..tables.num_masks())
        .map(|m| ((m, 0), LayerEntry { value: 0, next: m }))
        .collect();

    // Built last row first; reversed below so that layers[row] is that row.
    let mut layers: Vec<Layer> = Vec::with_capacity(rows);
    let mut total_states = 0usize;

    for row in (0..rows).rev() {
        let cells = board.row(row);
        let scores: Vec<i64> = tables.masks.iter().map(|&m| row_sum(cells, m)).collect();
        let moves = setup.moves.for_row(row);
        let prev_layer = layers.last().unwrap_or(&below);

        let mut layer = Layer::new();
        for (&(prev, used), entry) in prev_layer {
            for &m in &moves[prev] {
                let cards = used + tables.bit_counts[m];
                if cards > setup.card_limit {
                    continue;
                }
                let value = entry.value + scores[m];
                match layer.entry((m, cards)) {
                    Entry::Vacant(slot) => {
                        slot.insert(LayerEntry { value, next: prev });
                    }
                    Entry::Occupied(mut slot) => {
                        if value >= slot.get().value {
                            *slot.get_mut() = LayerEntry { value, next: prev };
                        }
                    }
                }
            }
        }
        total_states += layer.len();
        layers.push(layer);
    }
    layers.reverse();

    let mut best: Option<((usize, usize), i64)> = None;
    for (&key, entry) in &layers[0] {
        if best.map_or(true, |(_, v)| entry.value >= v) {
            best = Some((key, entry.value));
        }
    }
    let ((mut mask, mut cards), value) =
        best.ok_or_else(|| SolverError::invariant("bottom-up DP produced no first-row state"))?;

    let mut path = Vec::with_capacity(rows);
    for row in 0..rows {
        let entry = layers[row].get(&(mask, cards)).ok_or_else(|| {
            SolverError::invariant(format!(
                "bottom-up state (row {row}, mask #{mask}, cards {cards}) missing during reconstruction"
            ))
        })?;
        path.push(tables.masks[mask]);
        cards -= tables.bit_counts[mask];
        mask = entry.next;
    }

    debug!(
        rows,
        width = board.width(),
        max_cards,
        states = total_states,
        value,
        elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
        "bottom-up DP solved"
    );
    Ok(Solution { value, path })
}

/// Memoized reward-to-go for a non-terminal state.
#[derive(Clone, Copy, Debug)]
struct MemoEntry {
    value: i64,
    /// Mask index selected in this row; `None` when selecting nothing more is optimal.
    choice: Option<usize>,
}

/// Memoized recursion `solve(row, cards_used, previous_mask)`, driven by an
/// explicit stack of pending states.
pub fn solve_top_down(
    board: &Board,
    max_cards: usize,
    boundary: Boundary,
) -> SolveResult<Solution> {
    let start = Instant::now();
    let setup = DpSetup::new(board, max_cards, boundary)?;
    let tables = &setup.tables;
    let rows = setup.rows;
    let limit = setup.card_limit;
    let n = tables.num_masks();

    if limit == 0 {
        return Ok(Solution::empty(rows));
    }

    let is_terminal = |row: usize, cards: usize| row == rows || cards == limit;
    let key = |row: usize, prev: usize, cards: usize| state_index(row, prev, cards, n, limit);

    let mut memo: FxHashMap<usize, MemoEntry> = FxHashMap::default();
    let mut stack: Vec<(usize, usize, usize)> = vec![(0, 0, setup.initial)];

    while let Some(&(row, cards, prev)) = stack.last() {
        if memo.contains_key(&key(row, prev, cards)) {
            stack.pop();
            continue;
        }
        let moves = &setup.moves.for_row(row)[prev];

        let mut ready = true;
        for &m in moves {
            let next_cards = cards + tables.bit_counts[m];
            if next_cards > limit || is_terminal(row + 1, next_cards) {
                continue;
            }
            if !memo.contains_key(&key(row + 1, m, next_cards)) {
                stack.push((row + 1, next_cards, m));
                ready = false;
            }
        }
        if !ready {
            continue;
        }

        let cells = board.row(row);
        let mut best = MemoEntry {
            value: 0,
            choice: None,
        };
        for &m in moves {
            let next_cards = cards + tables.bit_counts[m];
            if next_cards > limit {
                continue;
            }
            let rest = if is_terminal(row + 1, next_cards) {
                0
            } else {
                memo.get(&key(row + 1, m, next_cards))
                    .ok_or_else(|| {
                        SolverError::invariant(format!(
                            "top-down state (row {}, mask #{m}, cards {next_cards}) read before it was computed",
                            row + 1
                        ))
                    })?
                    .value
            };
            let value = row_sum(cells, tables.masks[m]) + rest;
            if value > best.value {
                best = MemoEntry {
                    value,
                    choice: Some(m),
                };
            }
        }
        memo.insert(key(row, prev, cards), best);
        stack.pop();
    }

    let root = memo
        .get(&key(0, setup.initial, 0))
        .ok_or_else(|| SolverError::invariant("top-down root state was never computed"))?;
    let value = root.value;

    let mut path = Vec::with_capacity(rows);
    let (mut row, mut cards, mut prev) = (0usize, 0usize, setup.initial);
    while !is_terminal(row, cards) {
        let entry = memo.get(&key(row, prev, cards)).ok_or_else(|| {
            SolverError::invariant(format!(
                "top-down state (row {row}, mask #{prev}, cards {cards}) missing during reconstruction"
            ))
        })?;
        let Some(m) = entry.choice else {
            break;
        };
        path.push(tables.masks[m]);
        cards += tables.bit_counts[m];
        prev = m;
        row += 1;
    }
    path.resize(rows, EMPTY_MASK);

    debug!(
        rows,
        width = board.width(),
        max_cards,
        states = memo.len(),
        value,
        elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
        "top-down DP solved"
    );
    Ok(Solution { value, path })
}
