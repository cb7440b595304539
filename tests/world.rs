//! World-level behavior, events, queries and conservation.

use std::{cell::RefCell, rc::Rc};

use rigid2d::prelude::*;
use vek::{Aabr, Extent2, Vec2};

const DT: f64 = 1.0 / 60.0;

fn static_floor(world: &mut World) {
    let mut floor = Body::new();
    floor.add_fixture(Fixture::new(Polygon::rectangle(20.0, 1.0).unwrap()));
    floor.set_mass(Mass::infinite(Vec2::zero()));
    floor
        .set_transform(Iso::from_pos(Vec2::new(0.0, -0.5)))
        .unwrap();
    world.add_body(floor);
}

fn dynamic_circle(radius: f64, pos: Vec2<f64>) -> Body {
    let mut body = Body::new();
    body.add_fixture(Fixture::new(Circle::new(radius).unwrap()));
    body.set_mass_from_fixtures();
    body.set_transform(Iso::from_pos(pos)).unwrap();

    body
}

/// Contact begin, persist and end must fire in order.
#[test]
fn contact_event_order() {
    let mut world = World::new(Settings::default());
    static_floor(&mut world);

    let ball = dynamic_circle(0.5, Vec2::new(0.0, 2.0));
    world.add_body(ball);

    let events = Rc::new(RefCell::new(Vec::new()));

    let log = events.clone();
    world.handlers.contact_begin = Some(Box::new(move |_| log.borrow_mut().push("begin")));
    let log = events.clone();
    world.handlers.contact_persist = Some(Box::new(move |_| log.borrow_mut().push("persist")));
    let log = events.clone();
    world.handlers.contact_end = Some(Box::new(move |_| log.borrow_mut().push("end")));

    for _ in 0..120 {
        world.step(DT).unwrap();
    }

    let events = events.borrow();
    assert!(!events.is_empty(), "no contact events at all");
    assert_eq!(events[0], "begin");
    assert!(events[1..].iter().all(|kind| *kind == "persist"));
}

/// Sensors must report overlap without pushing anything away.
#[test]
fn sensor_detects_without_resolving() {
    let mut world = World::new(Settings::default());
    static_floor(&mut world);

    // A sensor region right above the floor
    let mut region = Body::new();
    region.add_fixture(
        Fixture::new(Polygon::rectangle(4.0, 4.0).unwrap()).with_sensor(true),
    );
    region.set_mass(Mass::infinite(Vec2::zero()));
    region
        .set_transform(Iso::from_pos(Vec2::new(0.0, 2.0)))
        .unwrap();
    world.add_body(region);

    let ball = world.add_body(dynamic_circle(0.5, Vec2::new(0.0, 8.0)));

    let begins = Rc::new(RefCell::new(0));
    let log = begins.clone();
    world.handlers.contact_begin = Some(Box::new(move |event| {
        if event.sensor {
            *log.borrow_mut() += 1;
        }
    }));

    for _ in 0..240 {
        world.step(DT).unwrap();
    }

    // The ball fell straight through the region onto the floor
    assert_eq!(*begins.borrow(), 1);
    let y = world.body(ball).unwrap().transform().pos.y;
    assert!((0.49..=0.6).contains(&y), "sensor deflected the ball to {y}");
}

/// Bodies leaving the bounds must deactivate and fire the handler.
#[test]
fn bounds_deactivation() {
    let mut world = World::new(Settings::default());
    world.set_bounds(Some(AxisAlignedBounds::new(Extent2::new(10.0, 10.0)).unwrap()));

    let escaping = world.add_body(dynamic_circle(0.5, Vec2::new(0.0, 0.0)));
    world
        .body_mut(escaping)
        .unwrap()
        .set_velocity(Vec2::new(50.0, 0.0))
        .unwrap();
    world.set_gravity(Vec2::zero()).unwrap();

    let left = Rc::new(RefCell::new(false));
    let log = left.clone();
    world.handlers.bounds = Some(Box::new(move |_| *log.borrow_mut() = true));

    for _ in 0..60 {
        world.step(DT).unwrap();
    }

    assert!(*left.borrow(), "bounds handler never fired");
    assert!(!world.body(escaping).unwrap().is_active());
}

/// Kinetic energy must not grow in a frictionless elastic impact.
#[test]
fn elastic_energy_non_increasing() {
    let mut world = World::new(Settings::default());
    world.set_gravity(Vec2::zero()).unwrap();

    let mut keys = Vec::new();
    for (x, vx) in [(-2.0, 2.0), (2.0, -2.0)] {
        let mut body = Body::new();
        body.add_fixture(
            Fixture::new(Circle::new(0.5).unwrap())
                .with_friction(0.0)
                .unwrap()
                .with_restitution(1.0)
                .unwrap(),
        );
        body.set_mass_from_fixtures();
        body.set_auto_sleep(false);
        body.set_transform(Iso::from_pos(Vec2::new(x, 0.0))).unwrap();
        body.set_velocity(Vec2::new(vx, 0.0)).unwrap();
        keys.push(world.add_body(body));
    }

    let energy = |world: &World| -> f64 {
        keys.iter()
            .map(|&key| {
                let body = world.body(key).unwrap();
                let mass = body.mass().unwrap();

                0.5 * mass.value() * body.velocity().magnitude_squared()
                    + 0.5 * mass.inertia() * body.angular_velocity() * body.angular_velocity()
            })
            .sum()
    };

    let initial = energy(&world);
    for _ in 0..120 {
        world.step(DT).unwrap();
        assert!(
            energy(&world) <= initial * (1.0 + 1e-6),
            "energy grew to {} from {initial}",
            energy(&world)
        );
    }

    // The collision happened and reversed both velocities
    assert!(world.body(keys[0]).unwrap().velocity().x < 0.0);
}

/// Forces on an infinite mass body must not move it.
#[test]
fn infinite_mass_unmoved() {
    let mut world = World::new(Settings::default());

    let mut anchor = Body::new();
    anchor.add_fixture(Fixture::new(Polygon::rectangle(1.0, 1.0).unwrap()));
    anchor.set_mass(Mass::infinite(Vec2::zero()));
    let anchor = world.add_body(anchor);

    world
        .body_mut(anchor)
        .unwrap()
        .apply_force(Vec2::new(1000.0, 1000.0))
        .unwrap();
    world.body_mut(anchor).unwrap().apply_torque(500.0).unwrap();

    for _ in 0..60 {
        world.step(DT).unwrap();
    }

    let body = world.body(anchor).unwrap();
    assert_eq!(body.velocity(), Vec2::zero());
    assert_eq!(body.angular_velocity(), 0.0);
    assert_eq!(body.transform().pos, Vec2::zero());
}

/// Raycasts must find the nearest fixture first and respect filters.
#[test]
fn raycast_queries() {
    let mut world = World::new(Settings::default());

    let mut near = Body::new();
    near.add_fixture(Fixture::new(Circle::new(0.5).unwrap()));
    near.set_mass(Mass::infinite(Vec2::zero()));
    near.set_transform(Iso::from_pos(Vec2::new(2.0, 0.0))).unwrap();
    let near = world.add_body(near);

    let mut far = Body::new();
    far.add_fixture(Fixture::new(Polygon::rectangle(1.0, 1.0).unwrap()));
    far.set_mass(Mass::infinite(Vec2::zero()));
    far.set_transform(Iso::from_pos(Vec2::new(6.0, 0.0))).unwrap();
    world.add_body(far);

    let ray = Ray::new(Vec2::zero(), Vec2::unit_x()).unwrap();
    let hits = world.raycast(&ray, 100.0, None);
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].fixture.body, near);
    assert!(hits[0].hit.distance < hits[1].hit.distance);

    let closest = world.raycast_closest(&ray, 100.0, None).unwrap();
    assert_eq!(closest.fixture.body, near);

    // Too short to reach anything
    assert!(world.raycast(&ray, 1.0, None).is_empty());
}

/// AABB queries must go through the broad phase index.
#[test]
fn aabb_detect() {
    let mut world = World::new(Settings::default());
    static_floor(&mut world);
    let ball = world.add_body(dynamic_circle(0.5, Vec2::new(0.0, 5.0)));

    // The index fills on the first step
    world.step(DT).unwrap();

    let around_ball = Aabr {
        min: Vec2::new(-1.0, 4.0),
        max: Vec2::new(1.0, 6.0),
    };
    let found = world.detect(around_ball);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].body, ball);
}

/// The accumulator must take whole fixed steps and cap the backlog.
#[test]
fn accumulator_update() {
    let mut world = World::new(Settings::default());

    // Just under two steps worth of time
    let steps = world.update(1.9 * DT).unwrap();
    assert_eq!(steps, 1);

    // The remainder rolls over into the next update
    let steps = world.update(0.2 * DT).unwrap();
    assert_eq!(steps, 1);

    // A huge stall can't snowball past the cap
    let steps = world.update(10.0).unwrap();
    assert_eq!(steps, world.settings().max_steps_per_update);
}

/// Stepping with an uncomputed mass must be refused.
#[test]
fn mass_required_to_step() {
    let mut world = World::new(Settings::default());

    let mut body = Body::new();
    body.add_fixture(Fixture::new(Circle::new(0.5).unwrap()));
    // Mass deliberately never computed
    world.add_body(body);

    assert!(world.step(DT).is_err());
}

/// A removed body must sever its joints and contacts.
#[test]
fn remove_body_severs() {
    let mut world = World::new(Settings::default());
    static_floor(&mut world);

    let a = world.add_body(dynamic_circle(0.5, Vec2::new(0.0, 0.5)));
    let b = world.add_body(dynamic_circle(0.5, Vec2::new(0.9, 0.5)));

    let joint = DistanceJoint::new(&world, a, b, Vec2::new(0.0, 0.5), Vec2::new(0.9, 0.5)).unwrap();
    world.add_joint(joint).unwrap();

    // Let contacts form
    for _ in 0..30 {
        world.step(DT).unwrap();
    }
    assert!(world.joint_count() == 1);

    world.remove_body(a).unwrap();
    assert_eq!(world.joint_count(), 0);
    assert_eq!(world.body_count(), 2);

    // The world keeps stepping fine without the removed body
    for _ in 0..30 {
        world.step(DT).unwrap();
    }
}
