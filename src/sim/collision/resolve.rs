//! Narrow phase and impulse resolution for a single body pair.

use crate::sim::aabb::Aabb;
use crate::sim::fixed_math::{FixedNum, FixedVec2};
use super::{BodyId, Collision, CollisionBody, CollisionSystem};

/// Result of the AABB narrow phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Contact {
    pub normal: FixedVec2,
    pub penetration: FixedNum,
    pub point: FixedVec2,
}

/// Minimum-translation contact between two boxes, or `None` if they do not overlap.
///
/// The separation axis is the one with the smaller overlap (x on ties). The
/// normal points from A's center toward B's; coincident centers resolve
/// toward positive.
pub(crate) fn narrow_phase(a: &Aabb, b: &Aabb) -> Option<Contact> {
    let overlap = a.overlap(b);
    if overlap.x <= FixedNum::ZERO || overlap.y <= FixedNum::ZERO {
        return None;
    }

    let delta = b.center() - a.center();
    let direction = |d: FixedNum| if d.is_negative() { -FixedNum::ONE } else { FixedNum::ONE };

    let (normal, penetration) = if overlap.x <= overlap.y {
        (FixedVec2::new(direction(delta.x), FixedNum::ZERO), overlap.x)
    } else {
        (FixedVec2::new(FixedNum::ZERO, direction(delta.y)), overlap.y)
    };

    let point = a.intersection(b).map(|region| region.center()).unwrap_or_else(|| a.center());

    Some(Contact { normal, penetration, point })
}

/// Portion of `pen` owed to the body opposite `other_mass`: `pen * other / (own + other)`.
///
/// Evaluated on raw bits in i64 so the intermediate product cannot wrap.
fn mass_share(pen: FixedNum, other_mass: FixedNum, own_mass: FixedNum) -> FixedNum {
    let total = own_mass.to_bits() as i64 + other_mass.to_bits() as i64;
    if total == 0 {
        return pen * FixedNum::HALF;
    }
    FixedNum::from_bits((pen.to_bits() as i64 * other_mass.to_bits() as i64 / total) as i32)
}

/// Push both bodies apart and exchange an impulse along `contact.normal`.
///
/// Returns false when both bodies are static and nothing was done.
pub(crate) fn apply_contact(a: &mut CollisionBody, b: &mut CollisionBody, contact: &Contact) -> bool {
    if a.is_static && b.is_static {
        return false;
    }

    let normal = contact.normal;
    let pen = contact.penetration;

    // Positional correction: heavier body moves less.
    if a.is_static {
        b.aabb.translate(normal * pen);
    } else if b.is_static {
        a.aabb.translate(-(normal * pen));
    } else {
        let move_a = mass_share(pen, b.mass, a.mass);
        // Remainder goes to B so the pair separates fully despite rounding.
        let move_b = pen - move_a;
        a.aabb.translate(-(normal * move_a));
        b.aabb.translate(normal * move_b);
    }

    // Velocity resolution.
    let relative = b.velocity - a.velocity;
    let vel_along_normal = relative.dot(normal);
    if vel_along_normal > FixedNum::ZERO {
        return true;
    }

    let inv_a = a.inv_mass();
    let inv_b = b.inv_mass();
    let inv_sum = inv_a + inv_b;
    if inv_sum.is_zero() {
        return true;
    }

    let e = a.restitution.min(b.restitution);
    let j = -(FixedNum::ONE + e) * vel_along_normal / inv_sum;
    let impulse = normal * j;

    if !a.is_static {
        a.velocity = a.velocity - impulse * inv_a;
    }
    if !b.is_static {
        b.velocity = b.velocity + impulse * inv_b;
    }
    true
}

impl CollisionSystem {
    /// Narrow phase plus resolution for one candidate pair; keeps the index in sync.
    pub(super) fn resolve_pair(&mut self, id_a: BodyId, id_b: BodyId) -> Option<Collision> {
        // Stale ids simply mean no collision.
        let mut a = self.bodies.get(&id_a)?.clone();
        let mut b = self.bodies.get(&id_b)?.clone();

        let (before_a, before_b) = (a.aabb, b.aabb);

        let contact = narrow_phase(&a.aabb, &b.aabb)?;
        if !apply_contact(&mut a, &mut b, &contact) {
            return None;
        }

        if a.aabb != before_a {
            self.spatial_hash.update(id_a, &a.aabb);
        }
        if b.aabb != before_b {
            self.spatial_hash.update(id_b, &b.aabb);
        }
        self.bodies.insert(id_a, a);
        self.bodies.insert(id_b, b);

        Some(Collision {
            body_a: id_a,
            body_b: id_b,
            normal: contact.normal,
            penetration: contact.penetration,
            point: contact.point,
        })
    }
}
