use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::sim::error::SnapshotError;
use super::{BodyId, CollisionBody, CollisionSystem};

/// Complete, serializable collision state for one frame.
///
/// The spatial hash is not part of the snapshot; it is rebuilt on restore.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionSnapshot {
    pub next_id: BodyId,
    /// Bodies in ascending id order.
    pub bodies: Vec<CollisionBody>,
}

impl CollisionSnapshot {
    /// Compact binary form for rollback history.
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(SnapshotError::Encode)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        bincode::deserialize(bytes).map_err(SnapshotError::Decode)
    }
}

impl CollisionSystem {
    pub fn snapshot(&self) -> CollisionSnapshot {
        CollisionSnapshot {
            next_id: self.next_id,
            bodies: self.get_bodies(),
        }
    }

    /// Replace all state with `snapshot` and rebuild the broad phase from it.
    pub fn restore(&mut self, snapshot: &CollisionSnapshot) {
        self.bodies.clear();
        self.spatial_hash.clear();

        for body in &snapshot.bodies {
            self.spatial_hash.insert(body.id, &body.aabb);
            self.bodies.insert(body.id, body.clone());
        }
        self.next_id = snapshot.next_id;

        debug!(
            "[COLLISION] Restored {} bodies (next id {})",
            snapshot.bodies.len(),
            snapshot.next_id
        );
    }
}
