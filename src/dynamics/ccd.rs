//! Continuous collision detection by conservative advancement.
//!
//! Runs after the discrete step. Bullets whose swept bounds cross another
//! body get a time-of-impact search over the step's motion, and are rolled
//! back to the impact time with their approach velocity consumed.

use slotmap::SlotMap;
use vek::{Aabr, Vec2};

use crate::{
    collision::gjk,
    math::angle_diff,
    settings::{ContinuousDetectionMode, Settings},
};

use super::body::{Body, BodyKey};

/// Gap under which the advancement stops and reports the impact time.
const TOUCH_EPSILON: f64 = 1e-3;

/// A found impact between two sweeping bodies.
#[derive(Debug, Clone, Copy)]
struct Impact {
    /// The other body.
    other: BodyKey,
    /// Normalized time of impact inside the step.
    toi: f64,
    /// Contact direction from the bullet toward the other body.
    normal: Vec2<f64>,
}

/// Bounding box of a body's whole motion over the step.
fn swept_aabr(body: &Body) -> Option<Aabr<f64>> {
    let mut fixtures = body.fixtures().iter();
    let first = fixtures.next()?;

    let mut aabr = first.aabr(body.transform0);
    aabr.expand_to_contain(first.aabr(body.transform));
    for fixture in fixtures {
        aabr.expand_to_contain(fixture.aabr(body.transform0));
        aabr.expand_to_contain(fixture.aabr(body.transform));
    }

    // The rotation disc covers any swing between the two snapshots
    let radius = body.rotation_disc_radius();
    aabr.min -= Vec2::broadcast(radius);
    aabr.max += Vec2::broadcast(radius);

    Some(aabr)
}

/// Upper bound on how fast the gap between two sweeps can close.
fn approach_bound(bullet: &Body, other: &Body) -> f64 {
    let translation =
        (bullet.transform.pos - bullet.transform0.pos) - (other.transform.pos - other.transform0.pos);

    let spin1 = angle_diff(
        bullet.transform.rot.to_radians(),
        bullet.transform0.rot.to_radians(),
    )
    .abs()
        * bullet.rotation_disc_radius();
    let spin2 = angle_diff(
        other.transform.rot.to_radians(),
        other.transform0.rot.to_radians(),
    )
    .abs()
        * other.rotation_disc_radius();

    translation.magnitude() + spin1 + spin2
}

/// Earliest impact time between two sweeping bodies, if any.
fn time_of_impact(bullet: &Body, other: &Body, settings: &Settings) -> Option<(f64, Vec2<f64>)> {
    let bound = approach_bound(bullet, other);
    if bound <= f64::EPSILON {
        return None;
    }

    let mut t = 0.0;
    let mut normal = Vec2::zero();

    for _ in 0..settings.max_toi_iterations {
        let iso1 = bullet.transform0.lerp(&bullet.transform, t);
        let iso2 = other.transform0.lerp(&other.transform, t);

        // Closest gap over all fixture pairs at this time
        let mut gap = f64::MAX;
        for fixture1 in bullet.fixtures() {
            for fixture2 in other.fixtures() {
                if fixture1.is_sensor() || fixture2.is_sensor() {
                    continue;
                }
                if !fixture1.filter().allows(&fixture2.filter()) {
                    continue;
                }

                match gjk::distance(fixture1.shape(), iso1, fixture2.shape(), iso2) {
                    Some(separation) => {
                        if separation.distance < gap {
                            gap = separation.distance;
                            normal = separation.normal;
                        }
                    }
                    // Already overlapping, the discrete solver handles t = 0
                    None => return if t > 0.0 { Some((t, normal)) } else { None },
                }
            }
        }

        if gap == f64::MAX {
            return None;
        }
        if gap < TOUCH_EPSILON {
            return if t > 0.0 { Some((t, normal)) } else { None };
        }

        t += gap / bound;
        if t >= 1.0 {
            return None;
        }
    }

    None
}

/// Sweep all bullets against the world and roll back tunneling motion.
pub(crate) fn sweep(bodies: &mut SlotMap<BodyKey, Body>, settings: &Settings) {
    puffin::profile_function!();

    if settings.continuous_detection == ContinuousDetectionMode::None {
        return;
    }

    let keys = bodies.keys().collect::<Vec<_>>();
    for key in keys.iter().copied() {
        for _ in 0..settings.max_toi_substeps {
            let impact = {
                let bullet = &bodies[key];
                if !bullet.is_active() || bullet.is_asleep() || !bullet.is_dynamic() {
                    break;
                }
                if settings.continuous_detection == ContinuousDetectionMode::Bullets
                    && !bullet.is_bullet()
                {
                    break;
                }
                let Some(sweep1) = swept_aabr(bullet) else {
                    break;
                };

                // Earliest impact against any other body
                let mut earliest: Option<Impact> = None;
                for other_key in keys.iter().copied() {
                    if other_key == key {
                        continue;
                    }
                    let other = &bodies[other_key];
                    if !other.is_active() || other.is_bullet() {
                        continue;
                    }
                    let Some(sweep2) = swept_aabr(other) else {
                        continue;
                    };
                    if !sweep1.collides_with_aabr(sweep2) {
                        continue;
                    }

                    if let Some((toi, normal)) = time_of_impact(bullet, other, settings) {
                        if earliest.map_or(true, |impact| toi < impact.toi) {
                            earliest = Some(Impact {
                                other: other_key,
                                toi,
                                normal,
                            });
                        }
                    }
                }

                earliest
            };

            let Some(impact) = impact else {
                break;
            };

            // Roll both bodies back to the impact time
            let [bullet, other] = bodies
                .get_disjoint_mut([key, impact.other])
                .expect("swept bodies not found");

            bullet.transform = bullet.transform0.lerp(&bullet.transform, impact.toi);
            if other.is_dynamic() {
                other.transform = other.transform0.lerp(&other.transform, impact.toi);
            }

            // Consume the approach speed so the next step starts in contact
            // instead of tunneling through
            let approach = (bullet.velocity - other.velocity).dot(impact.normal);
            if approach > 0.0 {
                let inv_mass = bullet.inv_mass() + other.inv_mass();
                if inv_mass > 0.0 {
                    let impulse = impact.normal * (approach / inv_mass);
                    bullet.velocity -= impulse * bullet.inv_mass();
                    other.velocity += impulse * other.inv_mass();
                }
            }

            log::debug!("continuous collision rollback at t = {:.3}", impact.toi);
        }
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;
    use vek::Vec2;

    use crate::{
        dynamics::{
            body::{Body, BodyKey},
            fixture::Fixture,
        },
        geometry::{Circle, Mass, Polygon},
        math::Iso,
        settings::Settings,
    };

    /// A fast circle sweeping over a thin wall must be caught.
    #[test]
    fn test_bullet_caught() {
        let settings = Settings::default();
        let mut bodies: SlotMap<BodyKey, Body> = SlotMap::with_key();

        let mut wall = Body::new();
        wall.add_fixture(Fixture::new(Polygon::rectangle(0.05, 10.0).unwrap()));
        wall.set_mass(Mass::infinite(Vec2::zero()));
        let _wall = bodies.insert(wall);

        let mut bullet = Body::new();
        bullet.add_fixture(Fixture::new(Circle::new(0.1).unwrap()));
        bullet.set_mass_from_fixtures();
        bullet.set_bullet(true);
        bullet.set_transform(Iso::from_pos(Vec2::new(-5.0, 0.0))).unwrap();
        bullet.set_velocity(Vec2::new(500.0, 0.0)).unwrap();
        let bullet = bodies.insert(bullet);

        // Simulate the discrete integration having tunneled the wall
        bodies[bullet].transform0 = Iso::from_pos(Vec2::new(-5.0, 0.0));
        bodies[bullet].transform = Iso::from_pos(Vec2::new(5.0, 0.0));

        super::sweep(&mut bodies, &settings);

        // Rolled back to the wall instead of passing it
        assert!(bodies[bullet].transform().pos.x < 0.0);
        assert!(bodies[bullet].velocity().x < 1.0);
    }

    /// Without the bullet flag nothing is swept in bullet mode.
    #[test]
    fn test_non_bullet_ignored() {
        let settings = Settings::default();
        let mut bodies: SlotMap<BodyKey, Body> = SlotMap::with_key();

        let mut wall = Body::new();
        wall.add_fixture(Fixture::new(Polygon::rectangle(0.05, 10.0).unwrap()));
        wall.set_mass(Mass::infinite(Vec2::zero()));
        bodies.insert(wall);

        let mut fast = Body::new();
        fast.add_fixture(Fixture::new(Circle::new(0.1).unwrap()));
        fast.set_mass_from_fixtures();
        let fast = bodies.insert(fast);

        bodies[fast].transform0 = Iso::from_pos(Vec2::new(-5.0, 0.0));
        bodies[fast].transform = Iso::from_pos(Vec2::new(5.0, 0.0));
        bodies[fast].set_velocity(Vec2::new(500.0, 0.0)).unwrap();

        super::sweep(&mut bodies, &settings);

        // Tunneling is permitted
        assert_eq!(bodies[fast].transform().pos.x, 5.0);
    }
}
