use kestrel::sim::aabb::Aabb;
use kestrel::sim::collision::{BodyDesc, CollisionSystem};
use kestrel::sim::fixed_math::{FixedNum, FixedVec2};
use kestrel::sim::random::DeterministicRng;

fn fx(v: i32) -> FixedNum {
    FixedNum::from_int(v)
}

fn crowded_world(seed: u32, bodies: usize) -> CollisionSystem {
    let mut rng = DeterministicRng::new(seed);
    let mut world = CollisionSystem::new(fx(16));
    for _ in 0..bodies {
        let x = fx(rng.next_int_range(0, 120));
        let y = fx(rng.next_int_range(0, 120));
        world.add_body(
            BodyDesc::dynamic(Aabb::from_position_size(x, y, fx(10), fx(10)))
                .with_velocity(FixedVec2::new(
                    rng.next_fixed_range(fx(-2), fx(2)),
                    rng.next_fixed_range(fx(-2), fx(2)),
                )),
        );
    }
    world
}

#[test]
fn test_collisions_reported_in_resolution_order() {
    let mut world = crowded_world(3, 60);
    for _ in 0..50 {
        world.integrate();
        let collisions = world.step();
        for pair in collisions.windows(2) {
            assert!(
                pair[0].body_a <= pair[1].body_a,
                "Bodies are visited in ascending id order"
            );
        }
        for hit in &collisions {
            assert_ne!(hit.body_a, hit.body_b);
            assert!(hit.penetration > FixedNum::ZERO);
        }
    }
}

#[test]
fn test_each_pair_resolved_at_most_once_per_step() {
    let mut world = crowded_world(11, 80);
    for _ in 0..30 {
        world.integrate();
        let collisions = world.step();
        let mut pairs: Vec<_> = collisions
            .iter()
            .map(|c| (c.body_a.min(c.body_b), c.body_a.max(c.body_b)))
            .collect();
        let total = pairs.len();
        pairs.sort_unstable();
        pairs.dedup();
        assert_eq!(pairs.len(), total);
    }
}

#[test]
fn test_index_stays_consistent_with_bodies() {
    let mut world = crowded_world(5, 40);
    for tick in 0..40 {
        world.integrate();
        world.step();
        if tick % 10 == 0 {
            let first = world.bodies().next().map(|b| b.id);
            if let Some(id) = first {
                world.remove_body(id);
            }
        }

        for body in world.bodies() {
            assert!(
                world.query_region(&body.aabb).contains(&body.id),
                "Body {} not found at its own position on tick {}",
                body.id,
                tick
            );
        }
        assert_eq!(world.spatial_hash().len(), world.len());
    }
}

#[test]
fn test_query_region_matches_brute_force() {
    let mut world = crowded_world(9, 50);
    for _ in 0..10 {
        world.integrate();
        world.step();
    }

    let mut rng = fastrand::Rng::with_seed(99);
    for _ in 0..100 {
        let region = Aabb::from_position_size(
            fx(rng.i32(-20..140)),
            fx(rng.i32(-20..140)),
            fx(rng.i32(1..60)),
            fx(rng.i32(1..60)),
        );
        let expected: Vec<_> = world
            .bodies()
            .filter(|b| b.aabb.intersects(&region))
            .map(|b| b.id)
            .collect();
        assert_eq!(world.query_region(&region), expected);
    }
}

#[test]
fn test_box_settles_on_floor() {
    let mut world = CollisionSystem::default();
    let floor = world.add_body(BodyDesc::fixed(Aabb::from_position_size(fx(-100), fx(-10), fx(200), fx(10))));
    let crate_id = world.add_body(BodyDesc::dynamic(Aabb::from_position_size(fx(0), fx(40), fx(8), fx(8))));
    let gravity = FixedNum::from_num(-0.5);

    for _ in 0..200 {
        let v = world.get_body(crate_id).unwrap().velocity;
        world.set_velocity(crate_id, FixedVec2::new(v.x, v.y + gravity));
        world.integrate();
        world.step();
    }

    let body = world.get_body(crate_id).unwrap();
    assert_eq!(body.aabb.min_y, FixedNum::ZERO, "Resting exactly on the floor surface");
    assert_eq!(world.get_body(floor).unwrap().aabb.max_y, FixedNum::ZERO);
}
