//! End-to-end simulation scenarios.

use rigid2d::prelude::*;
use vek::Vec2;

/// A body with infinite mass from a single shape.
fn static_body(shape: impl Into<Shape>, pos: Vec2<f64>) -> Body {
    let mut body = Body::new();
    body.add_fixture(Fixture::new(shape));
    body.set_mass(Mass::infinite(Vec2::zero()));
    body.set_transform(Iso::from_pos(pos)).unwrap();

    body
}

/// A unit-density dynamic box.
fn dynamic_box(width: f64, height: f64, pos: Vec2<f64>) -> Body {
    let mut body = Body::new();
    body.add_fixture(Fixture::new(Polygon::rectangle(width, height).unwrap()));
    body.set_mass_from_fixtures();
    body.set_transform(Iso::from_pos(pos)).unwrap();

    body
}

const DT: f64 = 1.0 / 60.0;

/// A box dropped on a floor must come to rest on it and fall asleep.
#[test]
fn dropping_box() {
    let mut world = World::new(Settings::default());
    world
        .set_bounds(Some(AxisAlignedBounds::new(vek::Extent2::new(40.0, 40.0)).unwrap()));

    // Floor top surface at y = 0
    world.add_body(static_body(
        Polygon::rectangle(20.0, 1.0).unwrap(),
        Vec2::new(0.0, -0.5),
    ));
    let falling = world.add_body(dynamic_box(1.0, 1.0, Vec2::new(0.0, 10.0)));

    for _ in 0..120 {
        world.step(DT).unwrap();
    }

    let body = world.body(falling).unwrap();
    let y = body.transform().pos.y;
    assert!((0.49..=0.55).contains(&y), "box rests at y = {y}");
    assert!(
        body.velocity().magnitude() < world.settings().sleep_linear_velocity,
        "box still moving at {:?}",
        body.velocity()
    );

    // Rest long enough and the island goes to sleep
    let mut asleep_after = None;
    for extra in 0..300 {
        world.step(DT).unwrap();
        if world.body(falling).unwrap().is_asleep() {
            asleep_after = Some(extra);
            break;
        }
    }
    assert!(asleep_after.is_some(), "box never fell asleep");
}

/// Ten stacked boxes must neither drift nor topple.
#[test]
fn stacked_boxes() {
    let mut world = World::new(Settings::default());

    world.add_body(static_body(
        Polygon::rectangle(20.0, 1.0).unwrap(),
        Vec2::new(0.0, -0.5),
    ));

    let mut boxes = Vec::new();
    for level in 0..10 {
        boxes.push(world.add_body(dynamic_box(1.0, 1.0, Vec2::new(0.0, 0.5 + level as f64))));
    }

    for _ in 0..600 {
        world.step(DT).unwrap();
    }

    for &key in &boxes {
        let body = world.body(key).unwrap();
        assert!(
            body.transform().pos.x.abs() < 0.05,
            "lateral drift {}",
            body.transform().pos.x
        );
        assert!(body.is_asleep(), "stack never settled");
    }
}

/// A seesaw with a heavier box on the right must tip right.
#[test]
fn seesaw() {
    let mut world = World::new(Settings::default());

    // Ground under everything, then the pivot with its apex at the origin
    world.add_body(static_body(
        Polygon::rectangle(30.0, 1.0).unwrap(),
        Vec2::new(0.0, -1.7),
    ));
    world.add_body(static_body(
        Polygon::triangle(
            Vec2::new(-0.6, -1.2),
            Vec2::new(0.6, -1.2),
            Vec2::new(0.0, 0.0),
        )
        .unwrap(),
        Vec2::zero(),
    ));

    let mut plank = Body::new();
    plank.add_fixture(
        Fixture::new(Polygon::rectangle(10.0, 0.2).unwrap())
            .with_friction(0.6)
            .unwrap(),
    );
    plank.set_mass_from_fixtures();
    plank.set_transform(Iso::from_pos(Vec2::new(0.0, 0.1))).unwrap();
    world.add_body(plank);

    let mut left = Body::new();
    left.add_fixture(
        Fixture::new(Polygon::rectangle(1.0, 1.0).unwrap())
            .with_density(1.0)
            .unwrap()
            .with_friction(0.6)
            .unwrap(),
    );
    left.set_mass_from_fixtures();
    left.set_transform(Iso::from_pos(Vec2::new(-4.0, 2.5))).unwrap();
    let left = world.add_body(left);

    let mut right = Body::new();
    right.add_fixture(
        Fixture::new(Polygon::rectangle(1.0, 1.0).unwrap())
            .with_density(3.0)
            .unwrap()
            .with_friction(0.6)
            .unwrap(),
    );
    right.set_mass_from_fixtures();
    right.set_transform(Iso::from_pos(Vec2::new(4.0, 5.7))).unwrap();
    let right = world.add_body(right);

    for _ in 0..300 {
        world.step(DT).unwrap();
    }

    let left_y = world.body(left).unwrap().transform().pos.y;
    let right_y = world.body(right).unwrap().transform().pos.y;
    assert!(
        right_y < left_y,
        "heavy side should sink, left at {left_y}, right at {right_y}"
    );
}

/// Two hundred mixed bodies dropped into a bucket must stay in and settle.
#[test]
fn bucket() {
    fastrand::seed(7);

    let mut world = World::new(Settings::default());

    // Three segments forming an open-topped bucket
    world.add_body(static_body(
        Segment::new(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0)).unwrap(),
        Vec2::zero(),
    ));
    world.add_body(static_body(
        Segment::new(Vec2::new(-10.0, 0.0), Vec2::new(-10.0, 14.0)).unwrap(),
        Vec2::zero(),
    ));
    world.add_body(static_body(
        Segment::new(Vec2::new(10.0, 0.0), Vec2::new(10.0, 14.0)).unwrap(),
        Vec2::zero(),
    ));

    let mut keys = Vec::new();
    for index in 0..200 {
        let column = index % 20;
        let row = index / 20;

        let x = -9.3 + column as f64 * 0.98 + fastrand::f64() * 0.1;
        let y = 0.5 + row as f64 * 1.0;

        let mut body = Body::new();
        let fixture = if index % 5 == 0 {
            Fixture::new(Circle::new(0.15 + fastrand::f64() * 0.2).unwrap())
        } else {
            let side = 0.3 + fastrand::f64() * 0.4;
            Fixture::new(Polygon::rectangle(side, side).unwrap())
        };
        body.add_fixture(fixture.with_friction(0.7).unwrap());
        body.set_mass_from_fixtures();
        body.set_transform(Iso::from_pos(Vec2::new(x, y))).unwrap();

        keys.push(world.add_body(body));
    }

    for _ in 0..1200 {
        world.step(DT).unwrap();
    }

    let bucket = vek::Aabr {
        min: Vec2::new(-10.5, -0.5),
        max: Vec2::new(10.5, 14.0),
    };
    let mut outside = 0;
    let mut asleep = 0;
    for &key in &keys {
        let body = world.body(key).unwrap();
        let aabr = body.aabr().unwrap();
        if aabr.min.x < bucket.min.x
            || aabr.max.x > bucket.max.x
            || aabr.min.y < bucket.min.y
            || aabr.max.y > bucket.max.y
        {
            outside += 1;
        }
        if body.is_asleep() {
            asleep += 1;
        }
    }

    assert_eq!(outside, 0, "{outside} bodies escaped the bucket");
    assert!(asleep >= 180, "only {asleep} of 200 bodies asleep");
}

/// A motorized revolute joint must spin at its target speed.
#[test]
fn revolute_motor() {
    let mut world = World::new(Settings::default());
    world.set_gravity(Vec2::zero()).unwrap();

    let anchor = world.add_body(static_body(
        Polygon::rectangle(1.0, 1.0).unwrap(),
        Vec2::zero(),
    ));
    let spinner = world.add_body(dynamic_box(1.0, 1.0, Vec2::zero()));

    let joint = RevoluteJoint::new(&world, anchor, spinner, Vec2::zero())
        .unwrap()
        .with_motor(std::f64::consts::PI, 100.0)
        .unwrap();
    world.add_joint(joint).unwrap();

    // Accumulate the relative rotation so full turns aren't lost to wrapping
    let mut total = 0.0;
    let mut previous = world.body(spinner).unwrap().rotation();
    for _ in 0..120 {
        world.step(DT).unwrap();

        let current = world.body(spinner).unwrap().rotation();
        total += rigid2d::math::angle_diff(current, previous);
        previous = current;
    }

    let expected = std::f64::consts::TAU;
    assert!(
        (total - expected).abs() <= 0.05,
        "spun {total} rad instead of {expected}"
    );
}

/// A fast circle tunnels a thin wall without CCD and is stopped with it.
#[test]
fn bullet_tunneling() {
    // Without continuous detection the circle passes the wall
    let mut settings = Settings::default();
    settings.continuous_detection = ContinuousDetectionMode::None;

    let mut world = World::new(settings);
    world.set_gravity(Vec2::zero()).unwrap();
    world.add_body(static_body(
        Polygon::rectangle(0.05, 10.0).unwrap(),
        Vec2::zero(),
    ));

    let mut circle = Body::new();
    circle.add_fixture(Fixture::new(Circle::new(0.1).unwrap()));
    circle.set_mass_from_fixtures();
    circle.set_transform(Iso::from_pos(Vec2::new(-5.0, 0.0))).unwrap();
    circle.set_velocity(Vec2::new(500.0, 0.0)).unwrap();
    let circle = world.add_body(circle);

    for _ in 0..10 {
        world.step(DT).unwrap();
    }
    assert!(
        world.body(circle).unwrap().transform().pos.x > 0.0,
        "tunneling expected without continuous detection"
    );

    // With the bullet flag the sweep must stop it at the wall
    let mut world = World::new(Settings::default());
    world.set_gravity(Vec2::zero()).unwrap();
    world.add_body(static_body(
        Polygon::rectangle(0.05, 10.0).unwrap(),
        Vec2::zero(),
    ));

    let mut bullet = Body::new();
    bullet.add_fixture(Fixture::new(Circle::new(0.1).unwrap()));
    bullet.set_mass_from_fixtures();
    bullet.set_bullet(true);
    bullet.set_transform(Iso::from_pos(Vec2::new(-5.0, 0.0))).unwrap();
    bullet.set_velocity(Vec2::new(500.0, 0.0)).unwrap();
    let bullet = world.add_body(bullet);

    for _ in 0..30 {
        world.step(DT).unwrap();

        let x = world.body(bullet).unwrap().transform().pos.x;
        assert!(x < 0.0, "bullet crossed the wall to x = {x}");
    }
}
