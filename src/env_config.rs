//! Shared environment configuration for the `mwis-*` binaries.
//!
//! Consolidates the `RAYON_NUM_THREADS`, `MWIS_BLOCK_SIZE` and `RUST_LOG`
//! reads shared by every binary.

use tracing_subscriber::EnvFilter;

use crate::constants::DEFAULT_BLOCK_SIZE;
use crate::error::{SolveResult, SolverError};

fn configured_threads() -> usize {
    std::env::var("RAYON_NUM_THREADS")
        .or_else(|_| std::env::var("OMP_NUM_THREADS"))
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8)
}

/// Read `RAYON_NUM_THREADS` (fallback `OMP_NUM_THREADS`, default 8).
/// Builds rayon global thread pool. Returns thread count.
pub fn init_rayon_threads() -> SolveResult<usize> {
    let num_threads = configured_threads();
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .map_err(|e| SolverError::parameter(format!("rayon pool: {e}")))?;
    tracing::info!(num_threads, "rayon pool ready");
    Ok(num_threads)
}

/// Read `MWIS_BLOCK_SIZE` (default 10). Zero or garbage is an error.
pub fn block_size() -> SolveResult<usize> {
    match std::env::var("MWIS_BLOCK_SIZE") {
        Err(_) => Ok(DEFAULT_BLOCK_SIZE),
        Ok(raw) => parse_block_size(&raw),
    }
}

fn parse_block_size(raw: &str) -> SolveResult<usize> {
    let value: usize = raw
        .trim()
        .parse()
        .map_err(|_| SolverError::parameter(format!("MWIS_BLOCK_SIZE={raw:?} is not an integer")))?;
    if value == 0 {
        return Err(SolverError::InvalidBlockSize(value));
    }
    Ok(value)
}

/// Install the global `tracing` subscriber. Filter from `RUST_LOG`, default `info`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_block_size() {
        assert_eq!(parse_block_size("12").unwrap(), 12);
        assert_eq!(parse_block_size(" 3 ").unwrap(), 3);
        assert!(matches!(
            parse_block_size("0"),
            Err(SolverError::InvalidBlockSize(0))
        ));
        assert!(parse_block_size("ten").is_err());
    }
}
