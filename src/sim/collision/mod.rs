//! Collision detection and resolution.
//!
//! This module handles:
//! - The authoritative set of collidable bodies
//! - Broad phase through the [`SpatialHash`]
//! - AABB narrow phase and impulse resolution (see `resolve`)
//! - Snapshots for rollback (see `snapshot`)
//!
//! # Determinism
//!
//! Bodies live in a `BTreeMap` keyed by id, so every pass over them runs in
//! ascending id order. Pair resolution order, and therefore final positions
//! after several simultaneous contacts, depends only on ids and never on hash
//! map iteration order.

use std::collections::BTreeMap;

use bevy::prelude::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::sim::aabb::Aabb;
use crate::sim::checksum::Fnv1a;
use crate::sim::fixed_math::{FixedNum, FixedVec2};
use crate::sim::spatial_hash::SpatialHash;

pub use crate::sim::spatial_hash::BodyId;
pub use snapshot::CollisionSnapshot;

mod resolve;
mod snapshot;

/// First id handed out by [`CollisionSystem::add_body`].
pub const FIRST_BODY_ID: BodyId = 1;

// ============================================================================
// Bodies
// ============================================================================

/// A collidable body owned by the [`CollisionSystem`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionBody {
    pub id: BodyId,
    pub aabb: Aabb,
    pub velocity: FixedVec2,
    pub mass: FixedNum,
    pub is_static: bool,
    /// Bounciness in [0, 1].
    pub restitution: FixedNum,
}

impl CollisionBody {
    /// Static bodies have infinite mass and contribute nothing.
    pub fn inv_mass(&self) -> FixedNum {
        if self.is_static || self.mass <= FixedNum::ZERO {
            FixedNum::ZERO
        } else {
            FixedNum::ONE / self.mass
        }
    }
}

/// Everything needed to create a body; the id is assigned on insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyDesc {
    pub aabb: Aabb,
    pub velocity: FixedVec2,
    pub mass: FixedNum,
    pub is_static: bool,
    pub restitution: FixedNum,
}

impl BodyDesc {
    /// Unit-mass dynamic body at rest with no bounce.
    pub fn dynamic(aabb: Aabb) -> Self {
        Self {
            aabb,
            velocity: FixedVec2::ZERO,
            mass: FixedNum::ONE,
            is_static: false,
            restitution: FixedNum::ZERO,
        }
    }

    /// Immovable body (walls, floors).
    pub fn fixed(aabb: Aabb) -> Self {
        Self {
            aabb,
            velocity: FixedVec2::ZERO,
            mass: FixedNum::ZERO,
            is_static: true,
            restitution: FixedNum::ZERO,
        }
    }

    pub fn with_velocity(mut self, velocity: FixedVec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_mass(mut self, mass: FixedNum) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_restitution(mut self, restitution: FixedNum) -> Self {
        self.restitution = restitution;
        self
    }
}

/// One resolved contact, reported by [`CollisionSystem::step`] in resolution order.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// Unit normal pointing from A toward B along the separation axis.
    pub normal: FixedVec2,
    pub penetration: FixedNum,
    /// Center of the overlap region before separation.
    pub point: FixedVec2,
}

// ============================================================================
// Collision System
// ============================================================================

/// Owns all collidable bodies and the broad-phase index derived from them.
///
/// The only mutators are [`add_body`](Self::add_body),
/// [`remove_body`](Self::remove_body), [`update_body`](Self::update_body),
/// [`set_velocity`](Self::set_velocity), [`integrate`](Self::integrate) and
/// [`step`](Self::step). Body references must not be held across a `step()`
/// call; positions are mutated in place.
#[derive(Resource, Debug, Clone)]
pub struct CollisionSystem {
    bodies: BTreeMap<BodyId, CollisionBody>,
    spatial_hash: SpatialHash,
    next_id: BodyId,
    // Scratch buffers reused across steps
    checked_pairs: FxHashSet<(BodyId, BodyId)>,
    candidates: Vec<BodyId>,
}

impl CollisionSystem {
    pub fn new(cell_size: FixedNum) -> Self {
        Self {
            bodies: BTreeMap::new(),
            spatial_hash: SpatialHash::new(cell_size),
            next_id: FIRST_BODY_ID,
            checked_pairs: FxHashSet::default(),
            candidates: Vec::new(),
        }
    }

    /// Insert a body and return its id. Ids are never reused.
    ///
    /// Restitution is clamped into [0, 1]; a dynamic body with non-positive
    /// mass is given unit mass.
    pub fn add_body(&mut self, desc: BodyDesc) -> BodyId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        let mass = if !desc.is_static && desc.mass <= FixedNum::ZERO {
            warn!("[COLLISION] Body {} added with non-positive mass {}; using 1", id, desc.mass);
            FixedNum::ONE
        } else {
            desc.mass
        };

        let body = CollisionBody {
            id,
            aabb: desc.aabb,
            velocity: desc.velocity,
            mass,
            is_static: desc.is_static,
            restitution: desc.restitution.clamp(FixedNum::ZERO, FixedNum::ONE),
        };

        self.spatial_hash.insert(id, &body.aabb);
        self.bodies.insert(id, body);
        id
    }

    pub fn remove_body(&mut self, id: BodyId) -> Option<CollisionBody> {
        let body = self.bodies.remove(&id)?;
        self.spatial_hash.remove(id);
        Some(body)
    }

    /// Move a body to `aabb`. Returns false if the id is unknown.
    pub fn update_body(&mut self, id: BodyId, aabb: Aabb) -> bool {
        let Some(body) = self.bodies.get_mut(&id) else {
            return false;
        };
        body.aabb = aabb;
        self.spatial_hash.update(id, &aabb);
        true
    }

    pub fn set_velocity(&mut self, id: BodyId, velocity: FixedVec2) -> bool {
        let Some(body) = self.bodies.get_mut(&id) else {
            return false;
        };
        body.velocity = velocity;
        true
    }

    pub fn get_body(&self, id: BodyId) -> Option<&CollisionBody> {
        self.bodies.get(&id)
    }

    /// Live bodies in ascending id order.
    pub fn bodies(&self) -> impl Iterator<Item = &CollisionBody> {
        self.bodies.values()
    }

    /// Owned copy of every body in ascending id order, for readers outside the tick.
    pub fn get_bodies(&self) -> Vec<CollisionBody> {
        self.bodies.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Remove every body. Id assignment continues where it left off.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.spatial_hash.clear();
    }

    pub fn spatial_hash(&self) -> &SpatialHash {
        &self.spatial_hash
    }

    /// Apply each dynamic body's velocity to its position (one tick) and re-index it.
    pub fn integrate(&mut self) {
        for body in self.bodies.values_mut() {
            if body.is_static || body.velocity == FixedVec2::ZERO {
                continue;
            }
            body.aabb.translate(body.velocity);
            self.spatial_hash.update(body.id, &body.aabb);
        }
    }

    /// Ids of bodies whose AABB strictly overlaps `region`, ascending.
    pub fn query_region(&self, region: &Aabb) -> Vec<BodyId> {
        self.spatial_hash
            .query(region)
            .into_iter()
            .filter(|id| {
                self.bodies
                    .get(id)
                    .map(|body| body.aabb.intersects(region))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Detect and resolve all contacts for one tick.
    ///
    /// Bodies are visited in ascending id order; each unordered pair is
    /// examined at most once per call. Ids the index still mentions but that
    /// no longer exist are skipped.
    pub fn step(&mut self) -> Vec<Collision> {
        let mut collisions = Vec::new();
        let mut candidates = std::mem::take(&mut self.candidates);
        self.checked_pairs.clear();

        let ids: Vec<BodyId> = self.bodies.keys().copied().collect();

        for id_a in ids {
            let Some(aabb_a) = self.bodies.get(&id_a).map(|body| body.aabb) else {
                continue;
            };
            self.spatial_hash.query_into(&aabb_a, &mut candidates);

            for &id_b in &candidates {
                if id_a == id_b {
                    continue;
                }
                let pair = (id_a.min(id_b), id_a.max(id_b));
                if !self.checked_pairs.insert(pair) {
                    continue;
                }
                if let Some(collision) = self.resolve_pair(id_a, id_b) {
                    collisions.push(collision);
                }
            }
        }

        self.candidates = candidates;

        if !collisions.is_empty() {
            debug!(
                "[COLLISION_STEP] Bodies: {} | Pairs checked: {} | Collisions: {}",
                self.bodies.len(),
                self.checked_pairs.len(),
                collisions.len()
            );
        }
        collisions
    }

    /// FNV-1a over every body's state in id order.
    ///
    /// Covers id, AABB, velocity, mass, static flag and restitution, each
    /// written as little-endian bits. Wall-clock data never enters the hash.
    pub fn compute_state_checksum(&self) -> u32 {
        let mut hasher = Fnv1a::new();
        for body in self.bodies.values() {
            hasher.write_u32(body.id);
            hasher.write_fixed(body.aabb.min_x);
            hasher.write_fixed(body.aabb.min_y);
            hasher.write_fixed(body.aabb.max_x);
            hasher.write_fixed(body.aabb.max_y);
            hasher.write_fixed(body.velocity.x);
            hasher.write_fixed(body.velocity.y);
            hasher.write_fixed(body.mass);
            hasher.write_bool(body.is_static);
            hasher.write_fixed(body.restitution);
        }
        hasher.finish()
    }
}

impl Default for CollisionSystem {
    fn default() -> Self {
        Self::new(crate::sim::spatial_hash::DEFAULT_CELL_SIZE)
    }
}
