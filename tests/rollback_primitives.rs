use kestrel::sim::aabb::Aabb;
use kestrel::sim::checksum::StateChecksumValidator;
use kestrel::sim::collision::{BodyDesc, CollisionSystem};
use kestrel::sim::commands::{CommandKind, CommandQueue};
use kestrel::sim::fixed_math::{FixedNum, FixedVec2};
use kestrel::sim::resources::RollbackHistory;
use kestrel::sim::Frame;

fn fx(v: i32) -> FixedNum {
    FixedNum::from_int(v)
}

fn pinball() -> CollisionSystem {
    let mut world = CollisionSystem::new(fx(16));
    world.add_body(BodyDesc::fixed(Aabb::new(fx(-10), fx(-10), fx(0), fx(110))));
    world.add_body(BodyDesc::fixed(Aabb::new(fx(100), fx(-10), fx(110), fx(110))));
    for i in 0..6 {
        world.add_body(
            BodyDesc::dynamic(Aabb::from_position_size(fx(10 + i * 14), fx(i * 9), fx(8), fx(8)))
                .with_velocity(FixedVec2::new(fx(3 - i), fx(0)))
                .with_restitution(FixedNum::from_num(0.9)),
        );
    }
    world
}

/// Apply the frame's commands, then tick the world.
fn tick(world: &mut CollisionSystem, queue: &mut CommandQueue) {
    for command in queue.dequeue() {
        match command.kind {
            CommandKind::Move { dx, dy } => {
                if let Some(player) = command.player_id {
                    world.set_velocity(3 + player as u32, FixedVec2::new(dx, dy));
                }
            }
            CommandKind::Jump { .. } | CommandKind::Attack { .. } | CommandKind::Spawn { .. } => {}
        }
    }
    world.integrate();
    world.step();
    queue.advance_frame();
}

#[test]
fn test_rewind_and_resimulate_matches_original() {
    let mut world = pinball();
    let mut queue = CommandQueue::new();
    let mut history = RollbackHistory::new(64, 64);
    let mut original = StateChecksumValidator::default();

    queue.enqueue(12, Some(0), CommandKind::Move { dx: fx(2), dy: fx(1) });
    queue.enqueue(25, Some(1), CommandKind::Move { dx: fx(-2), dy: fx(0) });

    let mut dispatched = Vec::new();
    for frame in 0..40 {
        dispatched.extend(queue.peek(frame).to_vec());
        tick(&mut world, &mut queue);
        history.snapshots.set(frame, world.snapshot());
        original.record_checksum(frame, world.compute_state_checksum());
    }
    let final_checksum = world.compute_state_checksum();

    // Roll back to the end of frame 10 and put the later commands back.
    assert!(history.rewind_to(10, &mut world));
    assert_eq!(history.snapshots.newest_frame(), Some(10));
    queue.set_frame(11);
    for command in dispatched.into_iter().rev().filter(|c| c.frame > 10) {
        queue.requeue(command);
    }

    let mut resimulated = StateChecksumValidator::default();
    for frame in 11..40 {
        tick(&mut world, &mut queue);
        history.snapshots.set(frame, world.snapshot());
        resimulated.record_checksum(frame, world.compute_state_checksum());
    }

    assert_eq!(original.find_divergence_with(&resimulated), None);
    assert_eq!(world.compute_state_checksum(), final_checksum);
}

#[test]
fn test_rewind_past_history_is_refused() {
    let mut world = pinball();
    let mut history = RollbackHistory::new(4, 4);
    for frame in 0..10 {
        world.integrate();
        world.step();
        history.snapshots.set(frame, world.snapshot());
    }
    let before = world.compute_state_checksum();

    assert!(!history.rewind_to(2, &mut world));
    assert_eq!(world.compute_state_checksum(), before, "World untouched");
    assert_eq!(history.snapshots.oldest_frame(), Some(6));
}

#[test]
fn test_divergence_is_located_after_a_desync() {
    let mut local = pinball();
    let mut remote = pinball();
    let mut local_sums = StateChecksumValidator::default();
    let mut remote_sums = StateChecksumValidator::default();

    for frame in 0..60 as Frame {
        if frame == 33 {
            // One LSB of drift on the remote side.
            let v = remote.get_body(5).map(|b| b.velocity).unwrap_or(FixedVec2::ZERO);
            remote.set_velocity(5, FixedVec2::new(v.x, v.y + FixedNum::EPSILON));
        }
        for world in [&mut local, &mut remote] {
            world.integrate();
            world.step();
        }
        local_sums.record_checksum(frame, local.compute_state_checksum());
        remote_sums.record_checksum(frame, remote.compute_state_checksum());
    }

    assert_eq!(local_sums.find_divergence_with(&remote_sums), Some(33));

    let exported = remote_sums.export_json().unwrap();
    let mut imported = StateChecksumValidator::default();
    imported.import_json(&exported).unwrap();
    assert_eq!(local_sums.find_divergence_point(&imported.checksums()), Some(33));
}
