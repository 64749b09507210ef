//! Row scoring and selection-path checks.

use crate::error::{SolveResult, SolverError};
use crate::types::{is_valid_mask, Board, Boundary, Mask};

/// Sum of `row[j]` over every set bit `j` of `mask`.
#[inline]
pub fn row_sum(row: &[i32], mask: Mask) -> i64 {
    let mut sum = 0i64;
    let mut bits = mask;
    while bits != 0 {
        let j = bits.trailing_zeros() as usize;
        sum += row[j] as i64;
        bits &= bits - 1;
    }
    sum
}

/// Like [`row_sum`] but only counts positive cells. Used by the heuristic,
/// which must never underestimate what a row can contribute.
#[inline]
pub fn positive_row_sum(row: &[i32], mask: Mask) -> i64 {
    let mut sum = 0i64;
    let mut bits = mask;
    while bits != 0 {
        let j = bits.trailing_zeros() as usize;
        sum += row[j].max(0) as i64;
        bits &= bits - 1;
    }
    sum
}

/// Total weight selected by `path` (one mask per row).
pub fn path_value(board: &Board, path: &[Mask]) -> i64 {
    path.iter()
        .enumerate()
        .map(|(r, &mask)| row_sum(board.row(r), mask))
        .sum()
}

/// Verify that `path` is a feasible selection on `board` and return its value.
///
/// Checks: one mask per row, each mask valid for the width, no vertical
/// adjacency between consecutive rows or with the boundary masks, and at most
/// `max_cards` selected cells.
pub fn check_path(
    board: &Board,
    path: &[Mask],
    max_cards: usize,
    boundary: Boundary,
) -> SolveResult<i64> {
    if path.len() != board.rows() {
        return Err(SolverError::invariant(format!(
            "path has {} masks for a board of {} rows",
            path.len(),
            board.rows()
        )));
    }
    let mut previous = boundary.initial_mask;
    let mut cards = 0usize;
    for (r, &mask) in path.iter().enumerate() {
        board.check_mask(mask)?;
        debug_assert!(is_valid_mask(mask));
        if mask & previous != 0 {
            return Err(SolverError::invariant(format!(
                "row {r} mask {mask:#b} is vertically adjacent to {previous:#b}"
            )));
        }
        cards += mask.count_ones() as usize;
        previous = mask;
    }
    if previous & boundary.final_mask != 0 {
        return Err(SolverError::invariant(format!(
            "last row mask {previous:#b} touches the final boundary {:#b}",
            boundary.final_mask
        )));
    }
    if cards > max_cards {
        return Err(SolverError::invariant(format!(
            "path uses {cards} cards, budget is {max_cards}"
        )));
    }
    Ok(path_value(board, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_sum() {
        let row = [5, 3, 10, -1];
        assert_eq!(row_sum(&row, 0b0000), 0);
        assert_eq!(row_sum(&row, 0b0001), 5);
        assert_eq!(row_sum(&row, 0b0101), 15);
        assert_eq!(row_sum(&row, 0b1010), 2);
        assert_eq!(positive_row_sum(&row, 0b1010), 3);
    }

    #[test]
    fn test_row_sum_empty_row() {
        assert_eq!(row_sum(&[], 0), 0);
    }

    #[test]
    fn test_check_path() {
        let board = Board::new(vec![vec![5, 3, 10, -1], vec![0, -3, 9, -2]]).unwrap();
        assert_eq!(
            check_path(&board, &[0b0101, 0b0000], 8, Boundary::default()).unwrap(),
            15
        );
        // vertical conflict on column 2
        assert!(check_path(&board, &[0b0100, 0b0100], 8, Boundary::default()).is_err());
        // horizontal conflict
        assert!(check_path(&board, &[0b0011, 0], 8, Boundary::default()).is_err());
        // budget
        assert!(check_path(&board, &[0b0101, 0], 1, Boundary::default()).is_err());
        // wrong length
        assert!(check_path(&board, &[0b0101], 8, Boundary::default()).is_err());
        // boundaries
        assert!(check_path(&board, &[0b0101, 0], 8, Boundary::new(0b0001, 0)).is_err());
        assert!(check_path(&board, &[0, 0b0100], 8, Boundary::new(0, 0b0100)).is_err());
    }
}
