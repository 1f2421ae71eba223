use smallvec::SmallVec;
use tracing::warn;

use crate::sim::aabb::Aabb;
use crate::sim::fixed_math::FixedNum;
use super::{BodyId, CellCoord, SpatialHash, LARGE_INSERT_CELLS};

impl SpatialHash {
    /// Cell index along one axis: exact `floor(coord / cell_size)` on the raw bits.
    pub(crate) fn cell_coord(&self, coord: FixedNum) -> i32 {
        coord.to_bits().div_euclid(self.cell_size.to_bits())
    }

    /// Inclusive cell range `(min_cx, min_cy, max_cx, max_cy)` covered by `aabb`.
    pub fn cell_range(&self, aabb: &Aabb) -> (i32, i32, i32, i32) {
        (
            self.cell_coord(aabb.min_x),
            self.cell_coord(aabb.min_y),
            self.cell_coord(aabb.max_x),
            self.cell_coord(aabb.max_y),
        )
    }

    /// Number of cells `aabb` covers, saturating at `i64::MAX`.
    pub fn cell_span(&self, aabb: &Aabb) -> i64 {
        let (min_cx, min_cy, max_cx, max_cy) = self.cell_range(aabb);
        let width = max_cx as i64 - min_cx as i64 + 1;
        let height = max_cy as i64 - min_cy as i64 + 1;
        width.saturating_mul(height)
    }

    /// Add `id` to every cell `aabb` overlaps.
    ///
    /// Inserting an id that is already indexed replaces its old cells, so
    /// `insert` is safe to call for moved bodies too.
    pub fn insert(&mut self, id: BodyId, aabb: &Aabb) {
        if self.occupied.contains_key(&id) {
            self.remove(id);
        }

        let span = self.cell_span(aabb);
        if span > LARGE_INSERT_CELLS {
            warn!(
                "[SPATIAL_HASH] Body {} covers {} cells (cell size {}); check its bounds",
                id, span, self.cell_size
            );
        }

        let (min_cx, min_cy, max_cx, max_cy) = self.cell_range(aabb);
        let mut covered: SmallVec<[CellCoord; 4]> = SmallVec::new();

        for cy in min_cy..=max_cy {
            for cx in min_cx..=max_cx {
                let bucket = self.cells.entry((cx, cy)).or_default();
                if !bucket.contains(&id) {
                    bucket.push(id);
                }
                covered.push((cx, cy));
            }
        }

        self.occupied.insert(id, covered);
    }

    /// Re-index a body after it moved. Always recomputes from scratch.
    pub fn update(&mut self, id: BodyId, aabb: &Aabb) {
        self.remove(id);
        self.insert(id, aabb);
    }

    /// Remove `id` from every cell it was recorded in. Returns false if it was not indexed.
    pub fn remove(&mut self, id: BodyId) -> bool {
        let Some(covered) = self.occupied.remove(&id) else {
            return false;
        };

        for coord in covered {
            if let Some(bucket) = self.cells.get_mut(&coord) {
                bucket.retain(|other| *other != id);
                if bucket.is_empty() {
                    self.cells.remove(&coord);
                }
            }
        }
        true
    }
}
