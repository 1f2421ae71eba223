use crate::sim::aabb::Aabb;
use super::{BodyId, SpatialHash};

impl SpatialHash {
    /// Ids of all bodies sharing a cell with `aabb`, sorted ascending and deduplicated.
    ///
    /// Populates `out_ids` instead of allocating a new Vec. Clears `out_ids`
    /// before populating.
    ///
    /// NOTE: Results are broad-phase candidates. Callers must run their own
    /// overlap test against the actual bodies.
    pub fn query_into(&self, aabb: &Aabb, out_ids: &mut Vec<BodyId>) {
        out_ids.clear();

        let (min_cx, min_cy, max_cx, max_cy) = self.cell_range(aabb);
        let span = self.cell_span(aabb);

        // A query wider than the populated grid is cheaper as a scan of live cells.
        if span > self.cells.len() as i64 {
            for (&(cx, cy), bucket) in &self.cells {
                if cx >= min_cx && cx <= max_cx && cy >= min_cy && cy <= max_cy {
                    out_ids.extend_from_slice(bucket);
                }
            }
        } else {
            for cy in min_cy..=max_cy {
                for cx in min_cx..=max_cx {
                    if let Some(bucket) = self.cells.get(&(cx, cy)) {
                        out_ids.extend_from_slice(bucket);
                    }
                }
            }
        }

        out_ids.sort_unstable();
        out_ids.dedup();
    }

    /// Allocating variant of [`query_into`](Self::query_into).
    pub fn query(&self, aabb: &Aabb) -> Vec<BodyId> {
        let mut ids = Vec::new();
        self.query_into(aabb, &mut ids);
        ids
    }
}
