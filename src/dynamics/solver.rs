//! Sequential impulse contact solver.
//!
//! Velocity constraints accumulate clamped impulses per point, positions are
//! corrected afterwards with split pseudo impulses so the correction never
//! adds momentum.

use slotmap::SlotMap;
use vek::Vec2;

use crate::{
    math::{cross_scalar, perp_dot, right},
    settings::Settings,
};

use super::{
    body::{Body, BodyKey},
    contact::Contact,
};

/// Relative velocity of the first body at a contact point pair.
#[inline]
fn relative_velocity(body1: &Body, body2: &Body, r1: Vec2<f64>, r2: Vec2<f64>) -> Vec2<f64> {
    body1.velocity + cross_scalar(body1.angular_velocity, r1)
        - body2.velocity
        - cross_scalar(body2.angular_velocity, r2)
}

/// Effective mass of a direction at a point pair.
#[inline]
fn effective_mass(body1: &Body, body2: &Body, r1: Vec2<f64>, r2: Vec2<f64>, axis: Vec2<f64>) -> f64 {
    let rn1 = r1.dot(axis);
    let rn2 = r2.dot(axis);

    body1.inv_mass()
        + body2.inv_mass()
        + body1.inv_inertia() * (r1.dot(r1) - rn1 * rn1)
        + body2.inv_inertia() * (r2.dot(r2) - rn2 * rn2)
}

/// Prepare the solver scratch of a contact and warm start it.
///
/// Previously accumulated impulses are applied immediately so stacked
/// bodies converge in a few iterations.
pub(crate) fn initialize(
    contact: &mut Contact,
    bodies: &mut SlotMap<BodyKey, Body>,
    settings: &Settings,
) {
    let [body1, body2] = bodies
        .get_disjoint_mut([contact.body1, contact.body2])
        .expect("contact bodies not found");

    let normal = contact.normal;
    let tangent = right(normal);
    let center1 = body1.world_center();
    let center2 = body2.world_center();

    for point in &mut contact.points {
        point.r1 = point.point - center1;
        point.r2 = point.point - center2;
        point.local1 = body1.local_point(point.point);
        point.local2 = body2.local_point(point.point);

        point.normal_mass = effective_mass(body1, body2, point.r1, point.r2, normal).recip();
        point.tangent_mass = effective_mass(body1, body2, point.r1, point.r2, tangent).recip();

        // Restitution only reacts to real approach speed
        let vn = relative_velocity(body1, body2, point.r1, point.r2).dot(normal);
        point.velocity_bias = if vn < -settings.restitution_threshold {
            -contact.restitution * vn
        } else {
            0.0
        };

        // Warm start with last step's impulses
        let impulse = normal * point.normal_impulse + tangent * point.tangent_impulse;
        apply_impulse(body1, body2, point.r1, point.r2, impulse);
    }
}

/// One velocity iteration over a contact.
///
/// Friction is solved before the normal so its clamp uses the impulse
/// accumulated up to the previous iteration.
pub(crate) fn solve_velocity(contact: &mut Contact, bodies: &mut SlotMap<BodyKey, Body>) {
    let [body1, body2] = bodies
        .get_disjoint_mut([contact.body1, contact.body2])
        .expect("contact bodies not found");

    let normal = contact.normal;
    let tangent = right(normal);

    for point in &mut contact.points {
        // Tangent impulse, clamped by the friction cone
        let vt = relative_velocity(body1, body2, point.r1, point.r2).dot(tangent);
        let lambda = point.tangent_mass * -vt;

        let max_friction = contact.friction * point.normal_impulse;
        let old = point.tangent_impulse;
        point.tangent_impulse = (old + lambda).clamp(-max_friction, max_friction);
        apply_impulse(
            body1,
            body2,
            point.r1,
            point.r2,
            tangent * (point.tangent_impulse - old),
        );

        // Normal impulse, accumulated and kept non-negative
        let vn = relative_velocity(body1, body2, point.r1, point.r2).dot(normal);
        let lambda = point.normal_mass * (-vn + point.velocity_bias);

        let old = point.normal_impulse;
        point.normal_impulse = (old + lambda).max(0.0);
        apply_impulse(
            body1,
            body2,
            point.r1,
            point.r2,
            normal * (point.normal_impulse - old),
        );
    }
}

/// One position iteration over a contact.
///
/// Returns the worst penetration encountered so the island can stop early
/// once every contact is within the slop.
pub(crate) fn solve_position(
    contact: &mut Contact,
    bodies: &mut SlotMap<BodyKey, Body>,
    settings: &Settings,
) -> f64 {
    let [body1, body2] = bodies
        .get_disjoint_mut([contact.body1, contact.body2])
        .expect("contact bodies not found");

    let normal = contact.normal;
    let mut worst: f64 = 0.0;

    for point in &contact.points {
        // Anchors track their bodies through the correction
        let world1 = body1.world_point(point.local1);
        let world2 = body2.world_point(point.local2);
        let r1 = world1 - body1.world_center();
        let r2 = world2 - body2.world_center();

        let penetration = point.depth + (world2 - world1).dot(normal);
        worst = worst.max(penetration);

        let correction = (settings.baumgarte * (penetration - settings.linear_slop))
            .clamp(0.0, settings.max_correction);
        if correction <= 0.0 {
            continue;
        }

        let mass = effective_mass(body1, body2, r1, r2, normal);
        if mass <= f64::EPSILON {
            continue;
        }
        let impulse = normal * (correction / mass);

        // Split impulse, only the transforms move
        body1.transform.pos += impulse * body1.inv_mass();
        body1.transform.rot += body1.inv_inertia() * perp_dot(r1, impulse);
        body2.transform.pos -= impulse * body2.inv_mass();
        body2.transform.rot -= body2.inv_inertia() * perp_dot(r2, impulse);
    }

    worst
}

/// Apply an impulse positively to the first body, negatively to the second.
#[inline]
fn apply_impulse(body1: &mut Body, body2: &mut Body, r1: Vec2<f64>, r2: Vec2<f64>, impulse: Vec2<f64>) {
    body1.velocity += impulse * body1.inv_mass();
    body1.angular_velocity += body1.inv_inertia() * perp_dot(r1, impulse);
    body2.velocity -= impulse * body2.inv_mass();
    body2.angular_velocity -= body2.inv_inertia() * perp_dot(r2, impulse);
}

#[cfg(test)]
mod tests {
    use arrayvec::ArrayVec;
    use slotmap::SlotMap;
    use vek::Vec2;

    use crate::{
        collision::{Manifold, ManifoldPoint, ManifoldPointId},
        dynamics::{
            body::{Body, BodyKey},
            contact::{contact_pair, ContactManager},
            fixture::{Fixture, FixtureId},
        },
        geometry::{Mass, Polygon},
        settings::Settings,
    };

    /// A single velocity iteration must stop two approaching boxes.
    #[test]
    fn test_normal_impulse_stops_approach() {
        let settings = Settings::default();
        let mut bodies: SlotMap<BodyKey, Body> = SlotMap::with_key();

        // Static floor below a falling box
        let mut floor = Body::new();
        floor.add_fixture(Fixture::new(Polygon::rectangle(10.0, 1.0).unwrap()));
        floor.set_mass(Mass::infinite(Vec2::zero()));
        let floor_key = bodies.insert(floor);

        let mut falling = Body::new();
        falling.add_fixture(Fixture::new(Polygon::rectangle(1.0, 1.0).unwrap()));
        falling.set_mass_from_fixtures();
        falling.set_velocity(Vec2::new(0.0, -5.0)).unwrap();
        falling
            .set_transform(crate::math::Iso::from_pos(Vec2::new(0.0, 0.995)))
            .unwrap();
        let falling_key = bodies.insert(falling);

        let pair = contact_pair(
            FixtureId {
                body: floor_key,
                index: 0,
            },
            FixtureId {
                body: falling_key,
                index: 0,
            },
        );

        // Two points under the box, normal pushes the floor down
        let mut points = ArrayVec::new();
        for (i, x) in [-0.5, 0.5].into_iter().enumerate() {
            points.push(ManifoldPoint {
                point: Vec2::new(x, 0.5),
                depth: 0.005,
                id: ManifoldPointId::Clip {
                    reference_edge: 2,
                    incident_edge: 0,
                    index: i as u32,
                    flipped: false,
                },
            });
        }
        let manifold = Manifold {
            points,
            normal: -Vec2::unit_y(),
        };

        let mut manager = ContactManager::new();
        manager.begin_step();
        manager.update(
            pair,
            floor_key,
            falling_key,
            &manifold,
            (0.2, 0.2),
            (0.0, 0.0),
            false,
            false,
        );

        let contact = manager.get_mut(pair).unwrap();
        super::initialize(contact, &mut bodies, &settings);
        for _ in 0..settings.velocity_iterations {
            super::solve_velocity(contact, &mut bodies);
        }

        // The box must no longer approach the floor
        assert!(bodies[falling_key].velocity().y > -1e-9);
        // Accumulated impulses stay in their cones
        for point in &contact.points {
            assert!(point.normal_impulse >= 0.0);
            assert!(point.tangent_impulse.abs() <= contact.friction * point.normal_impulse + 1e-9);
        }
    }
}
