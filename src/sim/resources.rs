//! Resource definitions for the fixed-tick simulation.
//!
//! Tick bookkeeping, the input sampled for the current tick, and the bounded
//! per-frame history a rollback needs to rewind.

use bevy::prelude::*;
use tracing::{debug, warn};

use crate::sim::collections::FrameRingBuffer;
use crate::sim::collision::{CollisionSnapshot, CollisionSystem};
use crate::sim::config::SyncConfig;
use crate::sim::input::InputButtons;
use crate::sim::Frame;

// ============================================================================
// Tick
// ============================================================================

/// Number of fixed ticks completed. Doubles as the current frame number.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimTick(pub u64);

impl SimTick {
    pub fn frame(self) -> Frame {
        self.0 as Frame
    }
}

// ============================================================================
// Input
// ============================================================================

/// Buttons applied on the current tick.
///
/// Written by the embedding application before the tick runs; overwritten
/// from the recording while a replay is active.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput(pub InputButtons);

// ============================================================================
// Rollback History
// ============================================================================

/// Collision snapshots and applied inputs for the most recent frames.
#[derive(Resource, Clone, Debug)]
pub struct RollbackHistory {
    pub snapshots: FrameRingBuffer<CollisionSnapshot>,
    pub inputs: FrameRingBuffer<InputButtons>,
}

impl RollbackHistory {
    pub fn new(snapshot_capacity: usize, input_capacity: usize) -> Self {
        Self {
            snapshots: FrameRingBuffer::new(snapshot_capacity),
            inputs: FrameRingBuffer::new(input_capacity),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.snapshot_history_capacity, config.input_history_capacity)
    }

    /// Restore `world` to the end of `frame` and forget every later frame.
    ///
    /// Returns false, leaving everything untouched, if `frame` is no longer held.
    pub fn rewind_to(&mut self, frame: Frame, world: &mut CollisionSystem) -> bool {
        let Some(snapshot) = self.snapshots.get(frame) else {
            warn!(
                "[ROLLBACK] No snapshot for frame {} (oldest held: {:?})",
                frame,
                self.snapshots.oldest_frame()
            );
            return false;
        };
        world.restore(snapshot);

        let dropped = self.snapshots.discard_after(frame);
        self.inputs.discard_after(frame);
        debug!("[ROLLBACK] Rewound to frame {} ({} frames dropped)", frame, dropped);
        true
    }
}

impl Default for RollbackHistory {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}
