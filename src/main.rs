use bevy::prelude::*;

use kestrel::sim::collision::{BodyDesc, BodyId, Collision, CollisionSystem};
use kestrel::sim::commands::{CommandKind, CommandQueue};
use kestrel::sim::aabb::Aabb;
use kestrel::sim::checksum::StateChecksumValidator;
use kestrel::sim::config::{self, InitialConfig, INITIAL_CONFIG_PATH};
use kestrel::sim::fixed_math::{FixedNum, FixedVec2};
use kestrel::sim::input::InputButtons;
use kestrel::sim::random::DeterministicRng;
use kestrel::sim::resources::FrameInput;
use kestrel::sim::systems::SimSet;
use kestrel::sim::{Frame, SyncCorePlugin};

use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_TICKS: u64 = 1_800;
const ARENA_SIZE: i32 = 512;
const DYNAMIC_BODIES: usize = 64;
const PLAYERS: usize = 2;
/// Commands are scheduled this many frames ahead, like a networked input delay.
const INPUT_DELAY: Frame = 2;

fn setup_file_logging() -> Result<String, Box<dyn Error>> {
    let log_dir = PathBuf::from("logs");
    fs::create_dir_all(&log_dir)?;

    // Clean up old log files, keeping only the last 25
    cleanup_old_logs(&log_dir, 25);

    let now = chrono::Local::now();
    let log_filename = format!("kestrel_{}.log", now.format("%Y%m%d_%H%M%S"));
    let log_path_str = log_dir.join(&log_filename).to_string_lossy().to_string();

    let file_appender = RollingFileAppender::new(
        Rotation::NEVER, // One file per run
        &log_dir,
        &log_filename,
    );

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("kestrel=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(log_path_str)
}

fn cleanup_old_logs(log_dir: &Path, keep_count: usize) {
    if let Ok(entries) = fs::read_dir(log_dir) {
        let mut log_files: Vec<_> = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|s| s.starts_with("kestrel") && s.ends_with(".log"))
                    .unwrap_or(false)
            })
            .collect();

        // Oldest first
        log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

        if log_files.len() > keep_count {
            for file in log_files.iter().take(log_files.len() - keep_count) {
                let _ = fs::remove_file(file.path());
            }
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Body id controlled by each player, indexed by player id.
#[derive(Resource, Default)]
struct PlayerBodies(Vec<BodyId>);

/// Outcome of one headless session.
struct SessionReport {
    checksums: StateChecksumValidator,
    final_checksum: u32,
    collisions: usize,
    bodies: usize,
}

fn fx(v: i32) -> FixedNum {
    FixedNum::from_int(v)
}

/// Arena walls plus randomly placed dynamic bodies, all drawn from the session RNG.
fn populate_world(world: &mut CollisionSystem, rng: &mut DeterministicRng) -> Vec<BodyId> {
    let size = fx(ARENA_SIZE);
    let thick = fx(16);
    world.add_body(BodyDesc::fixed(Aabb::new(-thick, -thick, size + thick, FixedNum::ZERO)));
    world.add_body(BodyDesc::fixed(Aabb::new(-thick, size, size + thick, size + thick)));
    world.add_body(BodyDesc::fixed(Aabb::new(-thick, FixedNum::ZERO, FixedNum::ZERO, size)));
    world.add_body(BodyDesc::fixed(Aabb::new(size, FixedNum::ZERO, size + thick, size)));

    let speed = fx(3);
    let mut ids = Vec::with_capacity(DYNAMIC_BODIES);
    for _ in 0..DYNAMIC_BODIES {
        let w = rng.next_int_range(6, 20);
        let h = rng.next_int_range(6, 20);
        let x = rng.next_int_range(8, ARENA_SIZE - 28);
        let y = rng.next_int_range(8, ARENA_SIZE - 28);
        let velocity = FixedVec2::new(
            rng.next_fixed_range(-speed, speed),
            rng.next_fixed_range(-speed, speed),
        );
        let desc = BodyDesc::dynamic(Aabb::from_position_size(fx(x), fx(y), fx(w), fx(h)))
            .with_velocity(velocity)
            .with_mass(fx(rng.next_int_range(1, 5)))
            .with_restitution(rng.next_fixed());
        ids.push(world.add_body(desc));
    }
    ids
}

/// Drain this frame's commands and apply them to the player bodies.
fn apply_commands(
    mut queue: ResMut<CommandQueue>,
    mut world: ResMut<CollisionSystem>,
    mut rng: ResMut<DeterministicRng>,
    players: Res<PlayerBodies>,
) {
    for command in queue.dequeue() {
        let body = command
            .player_id
            .and_then(|player| players.0.get(player as usize).copied());

        match command.kind {
            CommandKind::Move { dx, dy } => {
                if let Some(id) = body {
                    world.set_velocity(id, FixedVec2::new(dx, dy));
                }
            }
            CommandKind::Jump { force } => {
                if let Some((id, v)) = body.and_then(|id| world.get_body(id).map(|b| (id, b.velocity))) {
                    world.set_velocity(id, FixedVec2::new(v.x, v.y - force));
                }
            }
            CommandKind::Attack { target_x, target_y } => {
                let reach = fx(8);
                let center = FixedVec2::new(target_x, target_y);
                let hits = world.query_region(&Aabb::from_center(center, FixedVec2::new(reach, reach)));
                for id in hits {
                    world.set_velocity(id, FixedVec2::ZERO);
                }
            }
            CommandKind::Spawn { x, y, seed, .. } => {
                let size = fx(8);
                let mut spawn_rng = DeterministicRng::new(seed.unwrap_or_else(|| rng.next_int()));
                let velocity = FixedVec2::new(spawn_rng.next_fixed(), spawn_rng.next_fixed());
                world.add_body(
                    BodyDesc::dynamic(Aabb::from_position_size(x, y, size, size)).with_velocity(velocity),
                );
            }
        }
    }
}

/// Per-tick driver: the same seed yields the same commands and inputs in every session.
fn schedule_frame(app: &mut App, driver: &mut DeterministicRng) {
    let world = app.world_mut();
    let frame = world.resource::<CommandQueue>().current_frame();

    let buttons = InputButtons {
        left: driver.chance(FixedNum::from_num(0.25)),
        right: driver.chance(FixedNum::from_num(0.25)),
        jump: driver.chance(FixedNum::from_num(0.05)),
        attack: driver.chance(FixedNum::from_num(0.05)),
    };
    world.resource_mut::<FrameInput>().0 = buttons;

    let mut queue = world.resource_mut::<CommandQueue>();
    for player in 0..PLAYERS as u8 {
        let step = fx(2);
        let dx = match (buttons.left, buttons.right) {
            (true, false) => -step,
            (false, true) => step,
            _ => FixedNum::ZERO,
        };
        if dx != FixedNum::ZERO {
            queue.enqueue(frame + INPUT_DELAY, Some(player), CommandKind::Move { dx, dy: FixedNum::ZERO });
        }
        if buttons.jump {
            queue.enqueue(frame + INPUT_DELAY, Some(player), CommandKind::Jump { force: fx(4) });
        }
    }
    if buttons.attack {
        let target_x = fx(driver.next_int_range(0, ARENA_SIZE));
        let target_y = fx(driver.next_int_range(0, ARENA_SIZE));
        queue.enqueue(frame + INPUT_DELAY, None, CommandKind::Attack { target_x, target_y });
    }
    if driver.chance(FixedNum::from_num(0.01)) {
        let x = fx(driver.next_int_range(32, ARENA_SIZE - 32));
        let y = fx(driver.next_int_range(32, ARENA_SIZE - 32));
        let seed = driver.next_bool().then(|| driver.next_int());
        queue.enqueue(frame + INPUT_DELAY, None, CommandKind::Spawn { entity_type: "crate".into(), x, y, seed });
    }
}

fn run_session(config: &InitialConfig, ticks: u64) -> SessionReport {
    let mut app = App::new();
    app.add_plugins(SyncCorePlugin::new(config.clone()));
    app.init_resource::<PlayerBodies>();
    app.add_systems(FixedUpdate, apply_commands.in_set(SimSet::Input));

    let world = app.world_mut();
    world.resource_scope(|world, mut collision: Mut<CollisionSystem>| {
        let mut rng = world.resource_mut::<DeterministicRng>();
        let ids = populate_world(&mut collision, &mut rng);
        world.resource_mut::<PlayerBodies>().0 = ids.into_iter().take(PLAYERS).collect();
    });

    let mut driver = DeterministicRng::new(config.rng_seed ^ 0x9e37_79b9);
    let mut collisions = 0;
    for _ in 0..ticks {
        schedule_frame(&mut app, &mut driver);
        app.world_mut().run_schedule(FixedUpdate);
        collisions += app.world_mut().resource_mut::<Messages<Collision>>().drain().count();
    }

    let world = app.world();
    let collision = world.resource::<CollisionSystem>();
    SessionReport {
        checksums: world.resource::<StateChecksumValidator>().clone(),
        final_checksum: collision.compute_state_checksum(),
        collisions,
        bodies: collision.len(),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let log_file = setup_file_logging()?;

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║  Kestrel soak run - Logging to file                      ║");
    println!("╠══════════════════════════════════════════════════════════╣");
    println!("║  Log file: {:<42} ║", log_file);
    println!("╚══════════════════════════════════════════════════════════╝");

    let ticks = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_TICKS);
    let config = config::load_initial_config(INITIAL_CONFIG_PATH);

    let first = run_session(&config, ticks);
    let second = run_session(&config, ticks);

    info!(
        "Session A: {} bodies, {} collisions, checksum {:#010x}",
        first.bodies, first.collisions, first.final_checksum
    );
    info!(
        "Session B: {} bodies, {} collisions, checksum {:#010x}",
        second.bodies, second.collisions, second.final_checksum
    );

    match first.checksums.find_divergence_with(&second.checksums) {
        None if first.final_checksum == second.final_checksum => {
            info!("No divergence over {} ticks", ticks);
            Ok(())
        }
        None => {
            warn!("Final checksums differ outside the retained history window");
            Err("sessions diverged".into())
        }
        Some(frame) => {
            warn!("Sessions diverged at frame {}", frame);
            Err(format!("sessions diverged at frame {}", frame).into())
        }
    }
}
