//! A* best-first search over (row, previous mask, cards used) states.
//!
//! g = reward accumulated so far, h = [`BlockHeuristic`] bound on the reward
//! still obtainable. Nodes are popped in descending f = g + h.
//!
//! Node life cycle:
//!
//! | Stage | Action |
//! |-------|--------|
//! | queued | child pushed unless pruned by bound (`g + h <= best`) or dominated (`visited[key] >= g`) |
//! | popped, terminal | `row == R` or `cards == K`: recorded if it beats the best value, then dropped |
//! | popped, expanded | state key marked visited with its g, children generated |
//!
//! The search runs until the frontier is empty. Because h never underestimates,
//! pruning on `g + h <= best` discards only nodes that cannot improve the
//! incumbent, so the final best equals the DP optimum.
//!
//! Nodes live in a solve-scoped arena and refer to their parent by index.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::debug;

use crate::block_heuristic::BlockHeuristic;
use crate::constants::*;
use crate::error::{SolveResult, SolverError};
use crate::row_scoring::row_sum;
use crate::types::{Board, Solution};

/// Search counters reported alongside the solution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub expanded: usize,
    pub generated: usize,
    pub terminal: usize,
    pub pruned_by_bound: usize,
    pub pruned_dominated: usize,
    pub peak_frontier: usize,
}

/// Arena node. Created once, never mutated.
#[derive(Clone, Copy, Debug)]
struct SearchNode {
    g: i64,
    h: i64,
    row: usize,
    /// Index of the mask selected in `row - 1`.
    mask: usize,
    cards: usize,
    parent: Option<usize>,
}

/// Frontier handle ordered for a max-heap on f.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FrontierEntry {
    f: i64,
    g: i64,
    node: usize,
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Highest f first; among equals prefer more realized reward, then
        // the older node.
        self.f
            .cmp(&other.f)
            .then(self.g.cmp(&other.g))
            .then(other.node.cmp(&self.node))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Exact optimum via A* with the default heuristic window.
pub fn solve_astar(board: &Board, max_cards: usize) -> SolveResult<Solution> {
    solve_astar_with_stats(board, max_cards, DEFAULT_BLOCK_SIZE).map(|(solution, _)| solution)
}

/// Exact optimum via A* with an explicit heuristic window size.
pub fn solve_astar_with_block_size(
    board: &Board,
    max_cards: usize,
    block_size: usize,
) -> SolveResult<Solution> {
    solve_astar_with_stats(board, max_cards, block_size).map(|(solution, _)| solution)
}

/// A* search returning the solution and search counters.
pub fn solve_astar_with_stats(
    board: &Board,
    max_cards: usize,
    block_size: usize,
) -> SolveResult<(Solution, SearchStats)> {
    let start = Instant::now();
    let heuristic = BlockHeuristic::new(board, max_cards, block_size)?;
    let heuristic_ms = start.elapsed().as_secs_f64() * 1e3;
    let tables = heuristic.tables();
    let rows = board.rows();
    let limit = heuristic.card_limit();
    let n = tables.num_masks();
    let key = |row: usize, mask: usize, cards: usize| state_index(row, mask, cards, n, limit);

    let mut stats = SearchStats::default();
    let mut arena: Vec<SearchNode> = Vec::new();
    let mut frontier: BinaryHeap<FrontierEntry> = BinaryHeap::new();
    let mut visited: FxHashMap<usize, i64> = FxHashMap::default();
    let mut best: Option<(i64, usize)> = None;

    let root = SearchNode {
        g: 0,
        h: heuristic.h_at(0, 0, limit),
        row: 0,
        mask: 0,
        cards: 0,
        parent: None,
    };
    arena.push(root);
    frontier.push(FrontierEntry {
        f: root.g + root.h,
        g: root.g,
        node: 0,
    });

    while let Some(FrontierEntry { node: id, .. }) = frontier.pop() {
        let node = arena[id];

        if node.row == rows || node.cards == limit {
            stats.terminal += 1;
            if best.map_or(true, |(value, _)| node.g > value) {
                best = Some((node.g, id));
            }
            continue;
        }

        let state = key(node.row, node.mask, node.cards);
        if visited.get(&state).is_some_and(|&seen| seen >= node.g) {
            // A copy of this state with at least this reward was already expanded.
            stats.pruned_dominated += 1;
            continue;
        }
        visited.insert(state, node.g);
        stats.expanded += 1;

        let cells = board.row(node.row);
        for &m in &tables.compatible[node.mask] {
            let cards = node.cards + tables.bit_counts[m];
            if cards > limit {
                continue;
            }
            let child = SearchNode {
                g: node.g + row_sum(cells, tables.masks[m]),
                h: heuristic.h_at(node.row + 1, m, limit - cards),
                row: node.row + 1,
                mask: m,
                cards,
                parent: Some(id),
            };
            let f = child.g + child.h;
            if let Some((best_value, _)) = best {
                if f <= best_value {
                    stats.pruned_by_bound += 1;
                    continue;
                }
            }
            if visited
                .get(&key(child.row, m, cards))
                .is_some_and(|&seen| seen >= child.g)
            {
                stats.pruned_dominated += 1;
                continue;
            }
            arena.push(child);
            frontier.push(FrontierEntry {
                f,
                g: child.g,
                node: arena.len() - 1,
            });
            stats.generated += 1;
        }
        stats.peak_frontier = stats.peak_frontier.max(frontier.len());
    }

    let (value, best_id) = best.ok_or_else(|| {
        SolverError::invariant("A* frontier exhausted without reaching a terminal node")
    })?;

    let mut path = Vec::with_capacity(rows);
    let mut cursor = Some(best_id);
    while let Some(id) = cursor {
        let node = &arena[id];
        if node.row == 0 {
            break;
        }
        path.push(tables.masks[node.mask]);
        cursor = node.parent;
    }
    path.reverse();
    path.resize(rows, EMPTY_MASK);

    debug!(
        rows,
        width = board.width(),
        max_cards,
        block_size,
        value,
        expanded = stats.expanded,
        generated = stats.generated,
        pruned_by_bound = stats.pruned_by_bound,
        pruned_dominated = stats.pruned_dominated,
        heuristic_ms,
        elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
        "A* solved"
    );
    Ok((Solution { value, path }, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row_scoring::check_path;
    use crate::types::Boundary;

    fn board(rows: Vec<Vec<i32>>) -> Board {
        Board::new(rows).unwrap()
    }

    #[test]
    fn test_frontier_order() {
        let mut heap = BinaryHeap::new();
        heap.push(FrontierEntry { f: 3, g: 0, node: 0 });
        heap.push(FrontierEntry { f: 7, g: 1, node: 1 });
        heap.push(FrontierEntry { f: 7, g: 5, node: 2 });
        heap.push(FrontierEntry { f: 7, g: 5, node: 3 });
        let order: Vec<usize> = std::iter::from_fn(|| heap.pop().map(|e| e.node)).collect();
        assert_eq!(order, vec![2, 3, 1, 0]);
    }

    #[test]
    fn test_two_row_example() {
        let b = board(vec![vec![5, 3, 10, -1], vec![0, -3, 9, -2]]);
        let (sol, stats) = solve_astar_with_stats(&b, 8, DEFAULT_BLOCK_SIZE).unwrap();
        assert_eq!(sol.value, 15);
        assert_eq!(check_path(&b, &sol.path, 8, Boundary::default()).unwrap(), 15);
        assert!(stats.expanded >= 1);
        assert!(stats.terminal >= 1);
    }

    #[test]
    fn test_zero_budget_terminates_at_root() {
        let b = board(vec![vec![4, 4], vec![4, 4]]);
        let (sol, stats) = solve_astar_with_stats(&b, 0, 3).unwrap();
        assert_eq!(sol, Solution::empty(2));
        assert_eq!(stats.expanded, 0);
        assert_eq!(stats.terminal, 1);
    }

    #[test]
    fn test_budget_exhausted_before_last_row_pads_path() {
        let b = board(vec![vec![0, 9, 0], vec![1, 0, 1], vec![2, 0, 2]]);
        let sol = solve_astar(&b, 1).unwrap();
        assert_eq!(sol.value, 9);
        assert_eq!(sol.path, vec![0b010, 0, 0]);
    }

    #[test]
    fn test_block_sizes_agree() {
        let rows: Vec<Vec<i32>> = (0..31)
            .map(|i| vec![(i * 7) % 11 - 4, (i * 3) % 5 - 1, 6 - i % 9, (i * 5) % 13 - 6])
            .collect();
        let b = board(rows);
        let expected = crate::dp_solver::solve_bottom_up(&b, 15, Boundary::default())
            .unwrap()
            .value;
        for block_size in [1, 3, 10, 64] {
            let sol = solve_astar_with_block_size(&b, 15, block_size).unwrap();
            assert_eq!(sol.value, expected, "block_size={block_size}");
            check_path(&b, &sol.path, 15, Boundary::default()).unwrap();
        }
    }
}
