//! Fixed-tick systems that drive the core once per `FixedUpdate`.
//!
//! Run order (chained through [`SimSet`]):
//! input sampling → integration → collision step → checksum/history → frame advance.

use bevy::prelude::*;
use kestrel_macros::profile;
use tracing::trace;

use crate::profile_log;
use crate::sim::checksum::StateChecksumValidator;
use crate::sim::collision::{Collision, CollisionSystem};
use crate::sim::commands::CommandQueue;
use crate::sim::config::SyncConfig;
use crate::sim::input::InputRecorder;
use crate::sim::resources::{FrameInput, RollbackHistory, SimTick};

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum SimSet {
    Input,       // Sampling or replaying this tick's input, applying commands
    Integration, // Applying velocity to position
    Physics,     // Collision detection and resolution
    Checksum,    // Hashing state and storing rollback history
    Advance,     // Moving every frame counter forward
}

/// Record the tick's input, or replace it with the recorded one during replay.
pub fn sample_frame_input(mut input: ResMut<FrameInput>, mut recorder: ResMut<InputRecorder>) {
    if recorder.is_replaying() {
        input.0 = recorder
            .get_replay_input()
            .map(|recorded| recorded.buttons())
            .unwrap_or_default();
    } else {
        recorder.record_input(input.0);
    }
}

pub fn integrate_bodies(mut world: ResMut<CollisionSystem>) {
    world.integrate();
}

#[profile]
pub fn run_collision_step(
    mut world: ResMut<CollisionSystem>,
    mut collisions: MessageWriter<Collision>,
    #[allow(unused_variables)] tick: Res<SimTick>,
) {
    let resolved = world.step();

    profile_log!(
        tick,
        "[COLLISION_STEP] Tick: {} | Bodies: {} | Collisions: {}",
        tick.0,
        world.len(),
        resolved.len()
    );

    collisions.write_batch(resolved);
}

pub fn record_state_checksum(
    world: Res<CollisionSystem>,
    mut validator: ResMut<StateChecksumValidator>,
    tick: Res<SimTick>,
) {
    let checksum = world.compute_state_checksum();
    trace!("[CHECKSUM] Frame {}: {:#010x}", tick.0, checksum);
    validator.record_checksum(tick.frame(), checksum);
}

pub fn store_rollback_state(
    world: Res<CollisionSystem>,
    input: Res<FrameInput>,
    mut history: ResMut<RollbackHistory>,
    tick: Res<SimTick>,
) {
    let frame = tick.frame();
    history.snapshots.set(frame, world.snapshot());
    history.inputs.set(frame, input.0);
}

/// Advance the tick, the recorder and the command queue together, then drop
/// commands older than the retention window.
pub fn advance_sim_frame(
    mut tick: ResMut<SimTick>,
    mut recorder: ResMut<InputRecorder>,
    mut queue: ResMut<CommandQueue>,
    config: Res<SyncConfig>,
) {
    tick.0 += 1;
    recorder.next_frame();
    queue.advance_frame();

    let horizon = queue.current_frame() - config.command_retention_frames;
    queue.clear_before(horizon);
}
