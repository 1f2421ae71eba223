use serde::{Deserialize, Serialize};

use crate::sim::fixed_math::{FixedNum, FixedVec2};

/// Axis-aligned bounding box in fixed-point world units.
///
/// Constructors keep `min <= max` on both axes; nothing checks it at runtime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aabb {
    pub min_x: FixedNum,
    pub min_y: FixedNum,
    pub max_x: FixedNum,
    pub max_y: FixedNum,
}

impl Aabb {
    pub const fn new(min_x: FixedNum, min_y: FixedNum, max_x: FixedNum, max_y: FixedNum) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Box with its min corner at `(x, y)`. Negative sizes are treated as zero.
    pub fn from_position_size(x: FixedNum, y: FixedNum, width: FixedNum, height: FixedNum) -> Self {
        let width = width.max(FixedNum::ZERO);
        let height = height.max(FixedNum::ZERO);
        Self::new(x, y, x + width, y + height)
    }

    pub fn from_center(center: FixedVec2, half_extents: FixedVec2) -> Self {
        let hx = half_extents.x.abs();
        let hy = half_extents.y.abs();
        Self::new(center.x - hx, center.y - hy, center.x + hx, center.y + hy)
    }

    pub fn width(&self) -> FixedNum {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> FixedNum {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> FixedVec2 {
        FixedVec2::new(
            self.min_x + self.width() * FixedNum::HALF,
            self.min_y + self.height() * FixedNum::HALF,
        )
    }

    /// Open-interval overlap test: boxes that merely touch do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Closed-interval point test: points on the boundary are contained.
    pub fn contains_point(&self, p: FixedVec2) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    pub fn contains_aabb(&self, other: &Aabb) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Overlapping region, or `None` if the boxes do not intersect.
    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        if !self.intersects(other) {
            return None;
        }
        Some(Aabb::new(
            self.min_x.max(other.min_x),
            self.min_y.max(other.min_y),
            self.max_x.min(other.max_x),
            self.max_y.min(other.max_y),
        ))
    }

    /// Penetration depth on each axis; non-positive components mean no overlap there.
    pub fn overlap(&self, other: &Aabb) -> FixedVec2 {
        FixedVec2::new(
            self.max_x.min(other.max_x) - self.min_x.max(other.min_x),
            self.max_y.min(other.max_y) - self.min_y.max(other.min_y),
        )
    }

    /// Dilate by `margin` on all four sides.
    pub fn expand(&self, margin: FixedNum) -> Aabb {
        Aabb::new(
            self.min_x - margin,
            self.min_y - margin,
            self.max_x + margin,
            self.max_y + margin,
        )
    }

    pub fn translate(&mut self, delta: FixedVec2) {
        self.min_x += delta.x;
        self.max_x += delta.x;
        self.min_y += delta.y;
        self.max_y += delta.y;
    }

    pub fn translated(mut self, delta: FixedVec2) -> Aabb {
        self.translate(delta);
        self
    }
}
