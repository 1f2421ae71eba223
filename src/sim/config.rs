use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::sim::checksum::DEFAULT_MAX_HISTORY;
use crate::sim::fixed_math::FixedNum;
use crate::sim::spatial_hash::DEFAULT_CELL_SIZE;
use crate::sim::Frame;

/// Default location of the startup config, relative to the working directory.
pub const INITIAL_CONFIG_PATH: &str = "assets/initial_config.ron";

/// Static configuration loaded once at startup. Every peer in a session must
/// load identical values; changing them mid-session breaks determinism.
#[derive(Resource, Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InitialConfig {
    // Simulation
    pub tick_rate: f64,
    pub cell_size: f32,
    pub rng_seed: u32,

    // Rollback history
    pub max_checksum_history: usize,
    pub input_history_capacity: usize,
    pub snapshot_history_capacity: usize,
    pub command_retention_frames: Frame,
}

impl Default for InitialConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            cell_size: DEFAULT_CELL_SIZE.to_f32(),
            rng_seed: 0x5eed,
            max_checksum_history: DEFAULT_MAX_HISTORY,
            input_history_capacity: 128,
            snapshot_history_capacity: 16,
            command_retention_frames: 16,
        }
    }
}

impl InitialConfig {
    pub fn from_ron_str(contents: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(contents)
    }
}

/// Read `path` as RON, falling back to defaults if it is missing or malformed.
pub fn load_initial_config(path: impl AsRef<Path>) -> InitialConfig {
    let path = path.as_ref();

    match std::fs::read_to_string(path) {
        Ok(contents) => match InitialConfig::from_ron_str(&contents) {
            Ok(config) => {
                info!("[CONFIG] Loaded initial config from {}", path.display());
                config
            }
            Err(e) => {
                error!("[CONFIG] Failed to parse initial config: {}", e);
                error!("[CONFIG] Using default InitialConfig");
                InitialConfig::default()
            }
        },
        Err(e) => {
            error!("[CONFIG] Failed to read {}: {}", path.display(), e);
            error!("[CONFIG] Using default InitialConfig");
            InitialConfig::default()
        }
    }
}

/// Fixed-point view of [`InitialConfig`] used by the running simulation.
///
/// Floats are converted once here and never touch simulation state.
#[derive(Resource, Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    pub cell_size: FixedNum,
    pub rng_seed: u32,
    pub max_checksum_history: usize,
    pub input_history_capacity: usize,
    pub snapshot_history_capacity: usize,
    pub command_retention_frames: Frame,
}

impl SyncConfig {
    pub fn from_initial(initial: &InitialConfig) -> Self {
        Self {
            cell_size: FixedNum::from_num(initial.cell_size as f64),
            rng_seed: initial.rng_seed,
            max_checksum_history: initial.max_checksum_history,
            input_history_capacity: initial.input_history_capacity,
            snapshot_history_capacity: initial.snapshot_history_capacity,
            command_retention_frames: initial.command_retention_frames.max(0),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::from_initial(&InitialConfig::default())
    }
}
