use std::path::Path;

use bevy::prelude::*;
use tracing::info;

pub mod aabb;
pub mod checksum;
pub mod collections;
pub mod collision;
pub mod commands;
pub mod config;
pub mod error;
pub mod fixed_math;
pub mod input;
pub mod random;
pub mod resources;
pub mod spatial_hash;
pub mod systems;

use checksum::StateChecksumValidator;
use collision::{Collision, CollisionSystem};
use commands::CommandQueue;
use config::{InitialConfig, SyncConfig};
use input::InputRecorder;
use random::DeterministicRng;
use resources::{FrameInput, RollbackHistory, SimTick};
use systems::{
    advance_sim_frame, integrate_bodies, record_state_checksum, run_collision_step,
    sample_frame_input, store_rollback_state, SimSet,
};

/// Simulation frame number.
pub type Frame = i64;

/// Wall-clock milliseconds since the Unix epoch. Informational only; never hashed.
pub(crate) fn wall_clock_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Installs the deterministic core into a bevy `App`.
///
/// Every core object becomes a resource and one simulation frame runs per
/// `FixedUpdate`. Rendering, networking and gameplay stay with the embedding
/// application, which schedules its own systems relative to [`SimSet`].
pub struct SyncCorePlugin {
    pub config: InitialConfig,
}

impl SyncCorePlugin {
    pub fn new(config: InitialConfig) -> Self {
        Self { config }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Self::new(config::load_initial_config(path))
    }
}

impl Default for SyncCorePlugin {
    fn default() -> Self {
        Self::new(InitialConfig::default())
    }
}

impl Plugin for SyncCorePlugin {
    fn build(&self, app: &mut App) {
        fixed_math::trig::init_trig_tables();

        let sync = SyncConfig::from_initial(&self.config);
        info!(
            "[SYNC] Core starting: {} Hz, cell size {}, seed {}",
            self.config.tick_rate, sync.cell_size, sync.rng_seed
        );

        app.insert_resource(Time::<Fixed>::from_hz(self.config.tick_rate));
        app.insert_resource(CollisionSystem::new(sync.cell_size));
        app.insert_resource(StateChecksumValidator::new(sync.max_checksum_history));
        app.insert_resource(DeterministicRng::new(sync.rng_seed));
        app.insert_resource(RollbackHistory::from_config(&sync));
        app.insert_resource(self.config.clone());
        app.insert_resource(sync);
        app.init_resource::<CommandQueue>();
        app.init_resource::<InputRecorder>();
        app.init_resource::<FrameInput>();
        app.init_resource::<SimTick>();
        app.add_message::<Collision>();

        app.configure_sets(FixedUpdate, (
            SimSet::Input,
            SimSet::Integration,
            SimSet::Physics,
            SimSet::Checksum,
            SimSet::Advance,
        ).chain());

        app.add_systems(FixedUpdate, (
            sample_frame_input.in_set(SimSet::Input),
            integrate_bodies.in_set(SimSet::Integration),
            run_collision_step.in_set(SimSet::Physics),
            (record_state_checksum, store_rollback_state).in_set(SimSet::Checksum),
            advance_sim_frame.in_set(SimSet::Advance),
        ));
    }
}
