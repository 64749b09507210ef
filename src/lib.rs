//! # MWIS Grid: cardinality-constrained independent sets on narrow grids
//!
//! Given an R × W board of signed integer weights (W small, R possibly in the
//! thousands) and a card budget K, select at most K cells, no two sharing an
//! edge, maximizing the total weight of the selected cells.
//!
//! ## Algorithm overview
//!
//! Every solver works on the same layered state space: a state is
//! (row, mask chosen for the previous row, cards used so far), and a
//! transition picks the next row's mask among those compatible with it.
//!
//! | Component | Rust module | Description |
//! |-----------|-------------|-------------|
//! | Mask library | [`mask_tables`] | Valid row masks (no horizontal adjacency), popcounts, vertical compatibility lists |
//! | Row scorer | [`row_scoring`] | Weight of a mask on a row, path value and feasibility checks |
//! | DP solver | [`dp_solver`] | Exact optimum by bottom-up or memoized top-down profile DP, with optional boundary masks |
//! | Block heuristic | [`block_heuristic`] | Admissible h(row, mask, cards left) from windowed exact DP on positive weights |
//! | A* engine | [`astar`] | Best-first search on f = g + h with bound and dominance pruning |
//! | Greedy repair | [`greedy_repair`] | Approximate: greedy fill, then exact DP repairs of random row windows |
//! | Experiments | [`board_gen`], [`experiment`] | Seeded random boards and parallel algorithm sweeps |
//!
//! ## State representation
//!
//! Masks are `u32` with bit `j` for column `j`. Solvers address masks by
//! their index in [`mask_tables::MaskTables::masks`]; mask index 0 is always
//! the empty mask. Dense tables use
//! `state_index(row, mask, cards) = (row * num_masks + mask) * (K' + 1) + cards`
//! where K' = min(K, R × ⌈W/2⌉), since a larger budget can never bind.
//!
//! ## Boundaries
//!
//! The DP solvers accept a [`types::Boundary`]: a fixed mask just above the
//! first row and one just below the last row. This is what lets a window of a
//! larger board be re-solved in place (see [`greedy_repair`]).

#![allow(clippy::needless_range_loop)]

pub mod astar;
pub mod block_heuristic;
pub mod board_gen;
pub mod constants;
pub mod dp_solver;
pub mod env_config;
pub mod error;
pub mod experiment;
pub mod greedy_repair;
pub mod mask_tables;
pub mod row_scoring;
pub mod types;

pub use astar::{solve_astar, solve_astar_with_block_size, solve_astar_with_stats, SearchStats};
pub use dp_solver::{solve_bottom_up, solve_dp, solve_top_down};
pub use error::{card_budget, SolveResult, SolverError};
pub use greedy_repair::{greedy_and_repair, GreedyRepairOutcome, GreedyRepairParams};
pub use types::{Board, Boundary, Mask, Solution};
