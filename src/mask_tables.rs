//! Width-dependent lookup tables: valid row masks, popcounts and compatibility.
//!
//! Everything here is a pure function of the board width. The tables are built
//! once per width and shared read-only by every solve ([`MaskTables::shared`]).
//!
//! All per-mask tables are indexed by the mask's position in the ascending
//! valid-mask list, not by the mask value itself. [`MaskTables::index_of`]
//! translates a mask value to that position.

use std::sync::{Arc, OnceLock};

use crate::constants::*;
use crate::error::{SolveResult, SolverError};
use crate::types::{is_valid_mask, Mask};

const NO_INDEX: u32 = u32::MAX;

static SHARED: [OnceLock<Arc<MaskTables>>; MAX_WIDTH + 1] = [const { OnceLock::new() }; MAX_WIDTH + 1];

/// Enumerate the `2^width` candidate masks and keep those with no two
/// horizontally adjacent bits, in ascending order.
pub fn enumerate_valid_masks(width: usize) -> Vec<Mask> {
    (0..(1 as Mask) << width)
        .filter(|&mask| is_valid_mask(mask))
        .collect()
}

/// Popcount of each mask, parallel to `masks`.
pub fn bit_counts(masks: &[Mask]) -> Vec<usize> {
    masks.iter().map(|m| m.count_ones() as usize).collect()
}

/// For each mask, the indices of all masks sharing no bit with it
/// (no vertically adjacent selection between consecutive rows).
/// Index lists are ascending.
pub fn compatibility(masks: &[Mask]) -> Vec<Vec<usize>> {
    masks
        .iter()
        .map(|&m1| {
            masks
                .iter()
                .enumerate()
                .filter(|&(_, &m2)| m1 & m2 == 0)
                .map(|(j, _)| j)
                .collect()
        })
        .collect()
}

/// Intersection of two ascending index lists.
pub fn merge_compatibility(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut merged = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                merged.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    merged
}

/// All width-derived tables.
#[derive(Debug)]
pub struct MaskTables {
    pub width: usize,
    /// Valid masks in ascending order. Index 0 is always the empty mask.
    pub masks: Vec<Mask>,
    /// bit_counts[i] = popcount(masks[i]).
    pub bit_counts: Vec<usize>,
    /// compatible[i] = indices j with masks[i] & masks[j] == 0.
    pub compatible: Vec<Vec<usize>>,
    /// Reverse lookup: mask value -> index, NO_INDEX for invalid masks.
    index_lookup: Vec<u32>,
}

impl MaskTables {
    pub fn new(width: usize) -> SolveResult<Self> {
        if width > MAX_WIDTH {
            return Err(SolverError::WidthTooLarge {
                width,
                max: MAX_WIDTH,
            });
        }
        let masks = enumerate_valid_masks(width);
        let mut index_lookup = vec![NO_INDEX; 1 << width];
        for (i, &m) in masks.iter().enumerate() {
            index_lookup[m as usize] = i as u32;
        }
        Ok(Self {
            width,
            bit_counts: bit_counts(&masks),
            compatible: compatibility(&masks),
            masks,
            index_lookup,
        })
    }

    /// Process-wide tables for `width`, built on first use.
    pub fn shared(width: usize) -> SolveResult<Arc<Self>> {
        let slot = SHARED.get(width).ok_or(SolverError::WidthTooLarge {
            width,
            max: MAX_WIDTH,
        })?;
        if let Some(tables) = slot.get() {
            return Ok(Arc::clone(tables));
        }
        let built = Arc::new(Self::new(width)?);
        Ok(Arc::clone(slot.get_or_init(|| built)))
    }

    #[inline(always)]
    pub fn num_masks(&self) -> usize {
        self.masks.len()
    }

    /// Position of `mask` in the valid-mask list.
    #[inline(always)]
    pub fn index_of(&self, mask: Mask) -> Option<usize> {
        match self.index_lookup.get(mask as usize) {
            Some(&i) if i != NO_INDEX => Some(i as usize),
            _ => None,
        }
    }

    /// Like [`index_of`](Self::index_of) but reports an invalid mask as an error.
    pub fn require_index(&self, mask: Mask) -> SolveResult<usize> {
        self.index_of(mask).ok_or(SolverError::InvalidMask {
            mask,
            width: self.width,
        })
    }

    /// Masks allowed in `row` after `prev` (by index), honoring the external
    /// boundary masks on the first and last rows of the board.
    pub fn allowed_after(
        &self,
        prev: usize,
        row: usize,
        rows: usize,
        initial: usize,
        last: usize,
    ) -> Vec<usize> {
        let mut allowed = self.compatible[prev].clone();
        if row == 0 {
            allowed = merge_compatibility(&allowed, &self.compatible[initial]);
        }
        if row + 1 == rows {
            allowed = merge_compatibility(&allowed, &self.compatible[last]);
        }
        allowed
    }
}
