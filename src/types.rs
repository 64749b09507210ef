//! Core data structures: board, row masks, boundary constraints and solutions.
//!
//! The [`Board`] is validated once at construction (non-empty, rectangular,
//! width at most [`MAX_WIDTH`]) and then shared immutably by every solver.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{SolveResult, SolverError};

/// Selection of columns in one row: bit `j` set means column `j` is selected.
pub type Mask = u32;

/// A mask is valid iff no two horizontally adjacent bits are set.
#[inline(always)]
pub fn is_valid_mask(mask: Mask) -> bool {
    mask & (mask << 1) == 0
}

/// Immutable rectangular grid of signed weights, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<i32>>", into = "Vec<Vec<i32>>")]
pub struct Board {
    cells: Vec<i32>,
    rows: usize,
    width: usize,
}

impl Board {
    /// Validate and build a board from nested rows.
    pub fn new(rows: Vec<Vec<i32>>) -> SolveResult<Self> {
        let Some(first) = rows.first() else {
            return Err(SolverError::EmptyBoard);
        };
        let width = first.len();
        if width > MAX_WIDTH {
            return Err(SolverError::WidthTooLarge {
                width,
                max: MAX_WIDTH,
            });
        }
        let mut cells = Vec::with_capacity(rows.len() * width);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(SolverError::RaggedBoard {
                    row: i,
                    expected: width,
                    found: row.len(),
                });
            }
            cells.extend_from_slice(row);
        }
        Ok(Self {
            cells,
            rows: rows.len(),
            width,
        })
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of cells (rows × width).
    pub fn size(&self) -> usize {
        self.rows * self.width
    }

    #[inline(always)]
    pub fn row(&self, row: usize) -> &[i32] {
        let start = row * self.width;
        &self.cells[start..start + self.width]
    }

    #[inline(always)]
    pub fn cell(&self, row: usize, col: usize) -> i32 {
        self.cells[row * self.width + col]
    }

    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    /// Copy out a contiguous range of rows as a standalone board.
    pub fn slice_rows(&self, rows: Range<usize>) -> SolveResult<Board> {
        if rows.start >= rows.end || rows.end > self.rows {
            return Err(SolverError::parameter(format!(
                "row range {}..{} is empty or outside a board of {} rows",
                rows.start, rows.end, self.rows
            )));
        }
        Ok(Board {
            cells: self.cells[rows.start * self.width..rows.end * self.width].to_vec(),
            rows: rows.len(),
            width: self.width,
        })
    }

    /// Largest card count any selection on this board can use.
    pub fn max_selectable(&self) -> usize {
        self.rows * max_cards_per_row(self.width)
    }

    /// Check that `mask` is a valid selection for this board's width.
    pub fn check_mask(&self, mask: Mask) -> SolveResult<()> {
        let fits = self.width >= Mask::BITS as usize || mask >> self.width == 0;
        if fits && is_valid_mask(mask) {
            Ok(())
        } else {
            Err(SolverError::InvalidMask {
                mask,
                width: self.width,
            })
        }
    }

    pub fn to_rows(&self) -> Vec<Vec<i32>> {
        (0..self.rows).map(|r| self.row(r).to_vec()).collect()
    }
}

impl TryFrom<Vec<Vec<i32>>> for Board {
    type Error = SolverError;

    fn try_from(rows: Vec<Vec<i32>>) -> SolveResult<Self> {
        Board::new(rows)
    }
}

impl From<Board> for Vec<Vec<i32>> {
    fn from(board: Board) -> Self {
        board.to_rows()
    }
}

/// Fixed selections just outside a sub-window: `initial_mask` is the row
/// above the first row, `final_mask` the row below the last. Both default to
/// empty (no constraint).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boundary {
    pub initial_mask: Mask,
    pub final_mask: Mask,
}

impl Boundary {
    pub fn new(initial_mask: Mask, final_mask: Mask) -> Self {
        Self {
            initial_mask,
            final_mask,
        }
    }

    pub fn validate(&self, board: &Board) -> SolveResult<()> {
        board.check_mask(self.initial_mask)?;
        board.check_mask(self.final_mask)
    }
}

/// Optimal (or best found) value and one mask per board row realizing it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub value: i64,
    pub path: Vec<Mask>,
}

impl Solution {
    /// The all-empty selection for a board of `rows` rows.
    pub fn empty(rows: usize) -> Self {
        Self {
            value: 0,
            path: vec![EMPTY_MASK; rows],
        }
    }

    /// Cards used by the path.
    pub fn cards(&self) -> usize {
        self.path.iter().map(|m| m.count_ones() as usize).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_mask() {
        assert!(is_valid_mask(0b0000));
        assert!(is_valid_mask(0b0101));
        assert!(is_valid_mask(0b1010));
        assert!(is_valid_mask(0b1001));
        assert!(!is_valid_mask(0b0011));
        assert!(!is_valid_mask(0b0110));
    }

    #[test]
    fn test_board_validation() {
        assert!(matches!(Board::new(vec![]), Err(SolverError::EmptyBoard)));
        assert!(matches!(
            Board::new(vec![vec![1, 2], vec![3]]),
            Err(SolverError::RaggedBoard {
                row: 1,
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            Board::new(vec![vec![0; MAX_WIDTH + 1]]),
            Err(SolverError::WidthTooLarge { .. })
        ));
        let empty = Board::new(vec![vec![]]).unwrap();
        assert_eq!(empty.rows(), 1);
        assert_eq!(empty.width(), 0);
        assert_eq!(empty.row(0), &[] as &[i32]);
    }

    #[test]
    fn test_slice_rows() {
        let board = Board::new(vec![vec![1, 2], vec![3, 4], vec![5, 6]]).unwrap();
        let sub = board.slice_rows(1..3).unwrap();
        assert_eq!(sub.to_rows(), vec![vec![3, 4], vec![5, 6]]);
        assert!(board.slice_rows(2..2).is_err());
        assert!(board.slice_rows(1..4).is_err());
    }

    #[test]
    fn test_check_mask() {
        let board = Board::new(vec![vec![1, 2, 3, 4]]).unwrap();
        assert!(board.check_mask(0b0101).is_ok());
        assert!(board.check_mask(0b0011).is_err());
        assert!(board.check_mask(0b10000).is_err());
        let empty = Board::new(vec![vec![]]).unwrap();
        assert!(empty.check_mask(0).is_ok());
        assert!(empty.check_mask(1).is_err());
    }

    #[test]
    fn test_board_json() {
        let board: Board = serde_json::from_str("[[1,-2],[3,4]]").unwrap();
        assert_eq!(board.cell(0, 1), -2);
        assert_eq!(serde_json::to_string(&board).unwrap(), "[[1,-2],[3,4]]");
        assert!(serde_json::from_str::<Board>("[[1,2],[3]]").is_err());
    }
}
