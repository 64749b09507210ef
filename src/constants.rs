//! Solver constants and state-indexing functions.
//!
//! A search/DP state is the triple (row, previous-row mask, cards). Dense tables
//! lay states out row-major: all (mask, cards) pairs of one row are contiguous,
//! with the card count varying fastest. See [`state_index`].

/// Widest board accepted. The valid-mask count grows like Fibonacci(width + 2)
/// and the compatibility table quadratically in that, so 12 columns
/// (377 masks) is the practical ceiling.
pub const MAX_WIDTH: usize = 12;

/// Board width used by the experiment drivers.
pub const DEFAULT_WIDTH: usize = 4;

/// Rows per exact-DP window when building the A* heuristic.
pub const DEFAULT_BLOCK_SIZE: usize = 10;

/// Default number of local-repair rounds for the greedy solver.
pub const DEFAULT_REPAIR_ITERATIONS: usize = 200;

/// Default repair window, as a fraction of the board height.
pub const DEFAULT_REGION_FRACTION: f64 = 0.05;

/// Smallest repair window, in rows.
pub const MIN_REGION_ROWS: usize = 2;

/// The empty row selection. Always valid and compatible with every mask.
pub const EMPTY_MASK: u32 = 0;

/// Maximum number of cells a single valid row mask can select: ceil(width / 2).
#[inline(always)]
pub fn max_cards_per_row(width: usize) -> usize {
    width.div_ceil(2)
}

/// Map state (row, mask_index, cards) to a flat array index.
///
/// Layout: `(row * num_masks + mask_index) * (card_limit + 1) + cards`.
/// Rows may run one past the last board row (the terminal row).
#[inline(always)]
pub fn state_index(
    row: usize,
    mask_index: usize,
    cards: usize,
    num_masks: usize,
    card_limit: usize,
) -> usize {
    (row * num_masks + mask_index) * (card_limit + 1) + cards
}

/// Total slots needed for `rows + 1` rows of states.
#[inline(always)]
pub fn num_states(rows: usize, num_masks: usize, card_limit: usize) -> usize {
    (rows + 1) * num_masks * (card_limit + 1)
}
