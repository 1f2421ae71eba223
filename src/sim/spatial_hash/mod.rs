use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::warn;

use crate::sim::fixed_math::FixedNum;

mod grid;
mod query;

/// Body identifier as assigned by the collision system.
pub type BodyId = u32;

/// Integer cell coordinate `(floor(x / cell_size), floor(y / cell_size))`.
pub type CellCoord = (i32, i32);

/// Default edge length of one grid cell in world units.
pub const DEFAULT_CELL_SIZE: FixedNum = FixedNum::from_int(64);

/// Inserts covering more cells than this are logged as suspicious.
pub const LARGE_INSERT_CELLS: i64 = 4096;

/// Uniform-grid broad phase over body AABBs.
///
/// The world is unbounded: cells are keyed by integer coordinate in a hash
/// map and only exist while they hold at least one body. Each body is stored
/// in every cell its AABB overlaps, so a query over an area visits exactly
/// the cells that area covers.
///
/// # Guarantees
///
/// - **No false negatives:** if two AABBs overlap, a query with one returns
///   the other.
/// - **False positives are fine:** callers run a narrow-phase test on every
///   candidate.
/// - **Derived data:** the hash never owns body state and can always be
///   rebuilt from the live body set.
///
/// # Implementation Notes
///
/// - `FxHashMap` keeps hashing deterministic and cheap for small integer keys
/// - Cell buckets are `SmallVec`s since most cells hold a handful of ids
/// - Each body remembers its occupied cells so removal never scans the grid
#[derive(Debug, Clone)]
pub struct SpatialHash {
    cell_size: FixedNum,
    cells: FxHashMap<CellCoord, SmallVec<[BodyId; 8]>>,
    occupied: FxHashMap<BodyId, SmallVec<[CellCoord; 4]>>,
}

impl SpatialHash {
    pub fn new(cell_size: FixedNum) -> Self {
        let cell_size = if cell_size > FixedNum::ZERO {
            cell_size
        } else {
            warn!(
                "[SPATIAL_HASH] Invalid cell size {}; falling back to {}",
                cell_size, DEFAULT_CELL_SIZE
            );
            DEFAULT_CELL_SIZE
        };

        Self {
            cell_size,
            cells: FxHashMap::default(),
            occupied: FxHashMap::default(),
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.occupied.clear();
    }

    pub fn cell_size(&self) -> FixedNum {
        self.cell_size
    }

    /// Number of bodies currently indexed.
    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.occupied.contains_key(&id)
    }

    /// Count the total number of id entries across all cells.
    /// Useful for debugging and diagnostics.
    pub fn total_entries(&self) -> usize {
        self.cells.values().map(|cell| cell.len()).sum()
    }

    /// Count the number of non-empty cells.
    pub fn non_empty_cells(&self) -> usize {
        self.cells.len()
    }
}

impl Default for SpatialHash {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}
