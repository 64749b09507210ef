//! Error types for board validation and solving.

use thiserror::Error;

/// Result type for solver operations.
pub type SolveResult<T> = Result<T, SolverError>;

/// Errors surfaced to the caller of a solve.
///
/// Configuration problems are reported before any table is built. An
/// [`SolverError::InvariantViolation`] means a defect in the solver itself.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("board has no rows")]
    EmptyBoard,

    #[error("board is not rectangular: row {row} has {found} cells, expected {expected}")]
    RaggedBoard {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("board width {width} exceeds the supported maximum of {max}")]
    WidthTooLarge { width: usize, max: usize },

    #[error("mask {mask:#b} is not a valid row selection for width {width}")]
    InvalidMask { mask: u32, width: usize },

    #[error("card budget must be non-negative, got {0}")]
    NegativeCardBudget(i64),

    #[error("block size must be at least 1, got {0}")]
    InvalidBlockSize(usize),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SolverError {
    pub fn invariant(message: impl Into<String>) -> Self {
        SolverError::InvariantViolation(message.into())
    }

    pub fn parameter(message: impl Into<String>) -> Self {
        SolverError::InvalidParameter(message.into())
    }
}

/// Validate a caller-supplied card budget.
pub fn card_budget(max_cards: i64) -> SolveResult<usize> {
    if max_cards < 0 {
        return Err(SolverError::NegativeCardBudget(max_cards));
    }
    usize::try_from(max_cards)
        .map_err(|_| SolverError::parameter(format!("card budget {max_cards} does not fit in usize")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_budget() {
        assert_eq!(card_budget(0).unwrap(), 0);
        assert_eq!(card_budget(17).unwrap(), 17);
        assert!(matches!(
            card_budget(-3),
            Err(SolverError::NegativeCardBudget(-3))
        ));
    }

    #[test]
    fn test_messages() {
        let err = SolverError::RaggedBoard {
            row: 2,
            expected: 4,
            found: 3,
        };
        assert_eq!(
            err.to_string(),
            "board is not rectangular: row 2 has 3 cells, expected 4"
        );
        let err = SolverError::InvalidMask { mask: 3, width: 4 };
        assert_eq!(
            err.to_string(),
            "mask 0b11 is not a valid row selection for width 4"
        );
    }
}
