//! Reproducible random boards for experiments.
//!
//! A [`BoardConfig`] fixes the shape and the value distribution; the seed
//! fixes the instance. The same (config, seed) pair always yields the same
//! board.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_WIDTH;
use crate::error::{SolveResult, SolverError};
use crate::types::Board;

/// Cell value distribution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueDistribution {
    /// Every integer in `low..=high` equally likely.
    Uniform { low: i32, high: i32 },
    /// With probability `negative_ratio` a value in `low..=-1`, otherwise one
    /// in `1..=high`. Never zero.
    Skewed {
        low: i32,
        high: i32,
        negative_ratio: f64,
    },
}

impl ValueDistribution {
    pub fn validate(&self) -> SolveResult<()> {
        match *self {
            ValueDistribution::Uniform { low, high } if low > high => Err(SolverError::parameter(
                format!("uniform distribution has low {low} > high {high}"),
            )),
            ValueDistribution::Skewed {
                low,
                high,
                negative_ratio,
            } => {
                if low > -1 || high < 1 {
                    return Err(SolverError::parameter(format!(
                        "skewed distribution needs low <= -1 and high >= 1, got {low}..{high}"
                    )));
                }
                if !(0.0..=1.0).contains(&negative_ratio) {
                    return Err(SolverError::parameter(format!(
                        "negative_ratio must be in [0, 1], got {negative_ratio}"
                    )));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Draw one cell value. Assumes [`Self::validate`] passed.
    pub fn sample(&self, rng: &mut SmallRng) -> i32 {
        match *self {
            ValueDistribution::Uniform { low, high } => rng.random_range(low..=high),
            ValueDistribution::Skewed {
                low,
                high,
                negative_ratio,
            } => {
                if rng.random::<f64>() > negative_ratio {
                    rng.random_range(1..=high)
                } else {
                    rng.random_range(low..=-1)
                }
            }
        }
    }

    /// Short label used in result tables.
    pub fn label(&self) -> String {
        match *self {
            ValueDistribution::Uniform { low, high } => format!("uniform({low}, {high})"),
            ValueDistribution::Skewed {
                low,
                high,
                negative_ratio,
            } => format!("skewed({low}, {high}, p={negative_ratio:.2})"),
        }
    }
}

/// Board shape plus value distribution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub config_id: usize,
    pub rows: usize,
    pub columns: usize,
    pub distribution: ValueDistribution,
}

impl BoardConfig {
    pub fn size(&self) -> usize {
        self.rows * self.columns
    }

    /// Generate the board for `seed`, row by row.
    pub fn generate(&self, seed: u64) -> SolveResult<Board> {
        if self.rows == 0 {
            return Err(SolverError::EmptyBoard);
        }
        if self.columns > MAX_WIDTH {
            return Err(SolverError::WidthTooLarge {
                width: self.columns,
                max: MAX_WIDTH,
            });
        }
        self.distribution.validate()?;
        let mut rng = SmallRng::seed_from_u64(seed);
        let rows = (0..self.rows)
            .map(|_| {
                (0..self.columns)
                    .map(|_| self.distribution.sample(&mut rng))
                    .collect()
            })
            .collect();
        Board::new(rows)
    }
}
