//! Rigid bodies, their state flags and force accumulators.

use slotmap::new_key_type;
use smallvec::SmallVec;
use vek::{Aabr, Vec2};

use crate::{
    error::{check_finite, Error, Result},
    geometry::{Mass, MassKind},
    math::{cross_scalar, perp_dot, Iso, Rotation},
    settings::Settings,
};

use super::fixture::Fixture;

new_key_type! {
    /// Stable handle of a body inside a world.
    pub struct BodyKey;
}

/// Force applied over a limited stretch of simulated time.
#[derive(Debug, Clone, Copy)]
struct TimedForce {
    /// The force vector.
    force: Vec2<f64>,
    /// Simulated seconds left, retired at zero.
    remaining: f64,
}

/// Torque applied over a limited stretch of simulated time.
#[derive(Debug, Clone, Copy)]
struct TimedTorque {
    /// The torque.
    torque: f64,
    /// Simulated seconds left, retired at zero.
    remaining: f64,
}

/// Represents any physics object that can collide and have constraints applied.
#[derive(Debug)]
pub struct Body {
    /// Transform at the start of the current step, the sweep origin for CCD.
    pub(crate) transform0: Iso,
    /// Current transform.
    pub(crate) transform: Iso,
    /// Attached fixtures.
    fixtures: SmallVec<[Fixture; 1]>,
    /// Composite mass, `None` until computed or assigned.
    mass: Option<Mass>,
    /// Linear velocity of the center of mass.
    pub(crate) velocity: Vec2<f64>,
    /// Angular velocity in radians per second.
    pub(crate) angular_velocity: f64,
    /// Force accumulator, cleared after each step.
    force: Vec2<f64>,
    /// Torque accumulator, cleared after each step.
    torque: f64,
    /// Forces that stay applied for a while.
    timed_forces: Vec<TimedForce>,
    /// Torques that stay applied for a while.
    timed_torques: Vec<TimedTorque>,
    /// Linear damping, zero means none.
    linear_damping: f64,
    /// Angular damping, zero means none.
    angular_damping: f64,
    /// Multiplier on world gravity.
    gravity_scale: f64,
    /// Greatest distance from the center of mass to any fixture point.
    rotation_disc_radius: f64,
    /// Whether the body may be put to sleep automatically.
    auto_sleep: bool,
    /// Whether the body is currently asleep.
    asleep: bool,
    /// Inactive bodies are skipped entirely, set by the bounds check.
    active: bool,
    /// Scratch flag of the island traversal.
    pub(crate) on_island: bool,
    /// Bullets get a continuous collision sweep.
    bullet: bool,
    /// Seconds spent below the sleep velocity thresholds.
    pub(crate) sleep_time: f64,
    /// Free tag for the embedding application.
    pub user_data: u128,
}

impl Body {
    /// Construct an empty body at the origin.
    ///
    /// Fixtures are added afterwards and the mass computed from them before
    /// the body can take part in a step.
    pub fn new() -> Self {
        Self {
            transform0: Iso::identity(),
            transform: Iso::identity(),
            fixtures: SmallVec::new(),
            mass: None,
            velocity: Vec2::zero(),
            angular_velocity: 0.0,
            force: Vec2::zero(),
            torque: 0.0,
            timed_forces: Vec::new(),
            timed_torques: Vec::new(),
            linear_damping: 0.0,
            angular_damping: 0.0,
            gravity_scale: 1.0,
            rotation_disc_radius: 0.0,
            auto_sleep: true,
            asleep: false,
            active: true,
            on_island: false,
            bullet: false,
            sleep_time: 0.0,
            user_data: 0,
        }
    }

    /// Attach a fixture, returning its index.
    pub fn add_fixture(&mut self, fixture: Fixture) -> u32 {
        self.fixtures.push(fixture);

        (self.fixtures.len() - 1) as u32
    }

    /// All attached fixtures.
    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// A fixture by index.
    pub fn fixture(&self, index: u32) -> Option<&Fixture> {
        self.fixtures.get(index as usize)
    }

    /// Compose the mass from the attached fixtures.
    pub fn set_mass_from_fixtures(&mut self) {
        let masses = self
            .fixtures
            .iter()
            .map(Fixture::mass)
            .collect::<Vec<_>>();

        self.set_mass(Mass::compose(&masses));
    }

    /// Assign an explicit mass.
    pub fn set_mass(&mut self, mass: Mass) {
        self.mass = Some(mass);
        self.update_rotation_disc();
    }

    /// Re-type the computed mass, infinite makes the body static.
    pub fn set_mass_kind(&mut self, kind: MassKind) -> Result<()> {
        let mass = self.mass.ok_or(Error::MassNotComputed)?;
        self.mass = Some(mass.with_kind(kind));

        Ok(())
    }

    /// The composite mass, if computed.
    pub fn mass(&self) -> Option<&Mass> {
        self.mass.as_ref()
    }

    /// The composite mass or the stepping error.
    pub(crate) fn mass_checked(&self) -> Result<&Mass> {
        self.mass.as_ref().ok_or(Error::MassNotComputed)
    }

    /// Whether the body responds to forces at all.
    pub fn is_dynamic(&self) -> bool {
        self.mass.map_or(false, |mass| !mass.is_infinite())
    }

    /// Inverse mass, zero while the mass is not computed.
    pub(crate) fn inv_mass(&self) -> f64 {
        self.mass.map_or(0.0, |mass| mass.inv_mass())
    }

    /// Inverse rotational inertia, zero while the mass is not computed.
    pub(crate) fn inv_inertia(&self) -> f64 {
        self.mass.map_or(0.0, |mass| mass.inv_inertia())
    }

    /// Current transform.
    pub fn transform(&self) -> Iso {
        self.transform
    }

    /// Teleport the body, waking it.
    pub fn set_transform(&mut self, transform: Iso) -> Result<()> {
        if transform.is_degenerate() {
            return Err(Error::NonFiniteParameter { name: "transform" });
        }

        self.transform = transform;
        self.transform0 = transform;
        self.wake();

        Ok(())
    }

    /// Linear velocity of the center of mass.
    pub fn velocity(&self) -> Vec2<f64> {
        self.velocity
    }

    /// Replace the linear velocity, waking the body.
    pub fn set_velocity(&mut self, velocity: Vec2<f64>) -> Result<()> {
        check_finite("velocity.x", velocity.x)?;
        check_finite("velocity.y", velocity.y)?;

        self.velocity = velocity;
        self.wake();

        Ok(())
    }

    /// Angular velocity in radians per second.
    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    /// Replace the angular velocity, waking the body.
    pub fn set_angular_velocity(&mut self, angular_velocity: f64) -> Result<()> {
        check_finite("angular_velocity", angular_velocity)?;

        self.angular_velocity = angular_velocity;
        self.wake();

        Ok(())
    }

    /// Linear damping, `0` means none.
    pub fn set_linear_damping(&mut self, damping: f64) -> Result<()> {
        check_finite("damping", damping)?;
        if damping < 0.0 {
            return Err(Error::OutOfRange {
                name: "damping",
                min: 0.0,
                max: f64::MAX,
                value: damping,
            });
        }
        self.linear_damping = damping;

        Ok(())
    }

    /// Angular damping, `0` means none.
    pub fn set_angular_damping(&mut self, damping: f64) -> Result<()> {
        check_finite("damping", damping)?;
        if damping < 0.0 {
            return Err(Error::OutOfRange {
                name: "damping",
                min: 0.0,
                max: f64::MAX,
                value: damping,
            });
        }
        self.angular_damping = damping;

        Ok(())
    }

    /// Multiplier on world gravity.
    pub fn set_gravity_scale(&mut self, scale: f64) -> Result<()> {
        check_finite("gravity_scale", scale)?;
        self.gravity_scale = scale;

        Ok(())
    }

    /// Multiplier on world gravity.
    pub fn gravity_scale(&self) -> f64 {
        self.gravity_scale
    }

    /// Apply a force through the center of mass, waking the body.
    pub fn apply_force(&mut self, force: Vec2<f64>) -> Result<()> {
        check_finite("force.x", force.x)?;
        check_finite("force.y", force.y)?;

        self.force += force;
        self.wake();

        Ok(())
    }

    /// Apply a force at a world point, producing torque about the center.
    pub fn apply_force_at(&mut self, force: Vec2<f64>, point: Vec2<f64>) -> Result<()> {
        check_finite("force.x", force.x)?;
        check_finite("force.y", force.y)?;
        check_finite("point.x", point.x)?;
        check_finite("point.y", point.y)?;

        self.force += force;
        self.torque += perp_dot(point - self.world_center(), force);
        self.wake();

        Ok(())
    }

    /// Apply a torque, waking the body.
    pub fn apply_torque(&mut self, torque: f64) -> Result<()> {
        check_finite("torque", torque)?;

        self.torque += torque;
        self.wake();

        Ok(())
    }

    /// Apply a force that keeps acting for a stretch of simulated time.
    pub fn apply_timed_force(&mut self, force: Vec2<f64>, duration: f64) -> Result<()> {
        check_finite("force.x", force.x)?;
        check_finite("force.y", force.y)?;
        check_finite("duration", duration)?;

        self.timed_forces.push(TimedForce {
            force,
            remaining: duration,
        });
        self.wake();

        Ok(())
    }

    /// Apply a torque that keeps acting for a stretch of simulated time.
    pub fn apply_timed_torque(&mut self, torque: f64, duration: f64) -> Result<()> {
        check_finite("torque", torque)?;
        check_finite("duration", duration)?;

        self.timed_torques.push(TimedTorque {
            torque,
            remaining: duration,
        });
        self.wake();

        Ok(())
    }

    /// Apply an instantaneous change of momentum at the center of mass.
    pub fn apply_impulse(&mut self, impulse: Vec2<f64>) -> Result<()> {
        check_finite("impulse.x", impulse.x)?;
        check_finite("impulse.y", impulse.y)?;

        self.velocity += impulse * self.inv_mass();
        self.wake();

        Ok(())
    }

    /// Apply an instantaneous change of momentum at a world point.
    pub fn apply_impulse_at(&mut self, impulse: Vec2<f64>, point: Vec2<f64>) -> Result<()> {
        check_finite("impulse.x", impulse.x)?;
        check_finite("impulse.y", impulse.y)?;

        self.velocity += impulse * self.inv_mass();
        self.angular_velocity += self.inv_inertia() * perp_dot(point - self.world_center(), impulse);
        self.wake();

        Ok(())
    }

    /// Fold the timed records into the accumulators and retire spent ones.
    pub(crate) fn accumulate(&mut self, dt: f64) {
        for timed in &mut self.timed_forces {
            self.force += timed.force;
            timed.remaining -= dt;
        }
        self.timed_forces.retain(|timed| timed.remaining > 0.0);

        for timed in &mut self.timed_torques {
            self.torque += timed.torque;
            timed.remaining -= dt;
        }
        self.timed_torques.retain(|timed| timed.remaining > 0.0);
    }

    /// Integrate forces and gravity into the velocities.
    pub(crate) fn integrate_velocity(&mut self, dt: f64, gravity: Vec2<f64>) {
        let inv_mass = self.inv_mass();
        if inv_mass > 0.0 {
            self.velocity += (self.force * inv_mass + gravity * self.gravity_scale) * dt;
        }
        let inv_inertia = self.inv_inertia();
        if inv_inertia > 0.0 {
            self.angular_velocity += self.torque * inv_inertia * dt;
        }

        // Exponential decay, unconditionally stable for any damping value
        self.velocity *= 1.0 / (1.0 + dt * self.linear_damping);
        self.angular_velocity *= 1.0 / (1.0 + dt * self.angular_damping);
    }

    /// Integrate the velocities into the transform.
    pub(crate) fn integrate_position(&mut self, dt: f64, settings: &Settings) {
        let mut translation = self.velocity * dt;
        let magnitude = translation.magnitude();
        if magnitude > settings.max_translation {
            translation *= settings.max_translation / magnitude;
        }

        let rotation = (self.angular_velocity * dt)
            .clamp(-settings.max_rotation, settings.max_rotation);

        self.transform.pos += translation;
        self.transform.rot += rotation;
    }

    /// Zero the force and torque accumulators.
    pub(crate) fn clear_accumulators(&mut self) {
        self.force = Vec2::zero();
        self.torque = 0.0;
    }

    /// Detect NaN or infinite state and poison the body inactive.
    ///
    /// Returns true when the body had to be poisoned.
    pub(crate) fn poison_if_degenerate(&mut self) -> bool {
        let degenerate = self.transform.is_degenerate()
            || !self.velocity.x.is_finite()
            || !self.velocity.y.is_finite()
            || !self.angular_velocity.is_finite();

        if degenerate {
            self.velocity = Vec2::zero();
            self.angular_velocity = 0.0;
            self.force = Vec2::zero();
            self.torque = 0.0;
            self.timed_forces.clear();
            self.timed_torques.clear();
            self.transform = self.transform0;
            self.active = false;
        }

        degenerate
    }

    /// Center of mass in world space.
    pub fn world_center(&self) -> Vec2<f64> {
        let local = self.mass.map_or(Vec2::zero(), |mass| mass.center());

        self.transform.translate(local)
    }

    /// Map a local point to world space.
    pub fn world_point(&self, point: Vec2<f64>) -> Vec2<f64> {
        self.transform.translate(point)
    }

    /// Map a world point to local space.
    pub fn local_point(&self, point: Vec2<f64>) -> Vec2<f64> {
        self.transform.inverse_translate(point)
    }

    /// Rotate a local direction to world space.
    pub fn world_vector(&self, vector: Vec2<f64>) -> Vec2<f64> {
        self.transform.rotate(vector)
    }

    /// Rotate a world direction to local space.
    pub fn local_vector(&self, vector: Vec2<f64>) -> Vec2<f64> {
        self.transform.inverse_rotate(vector)
    }

    /// Velocity of a world point rigidly attached to the body.
    pub fn velocity_at(&self, point: Vec2<f64>) -> Vec2<f64> {
        self.velocity + cross_scalar(self.angular_velocity, point - self.world_center())
    }

    /// Union of all fixture bounding boxes in world space.
    pub fn aabr(&self) -> Option<Aabr<f64>> {
        let mut fixtures = self.fixtures.iter();
        let mut aabr = fixtures.next()?.aabr(self.transform);
        for fixture in fixtures {
            aabr.expand_to_contain(fixture.aabr(self.transform));
        }

        Some(aabr)
    }

    /// Greatest distance from the center of mass to any fixture point.
    pub fn rotation_disc_radius(&self) -> f64 {
        self.rotation_disc_radius
    }

    fn update_rotation_disc(&mut self) {
        let center = self.mass.map_or(Vec2::zero(), |mass| mass.center());

        self.rotation_disc_radius = self
            .fixtures
            .iter()
            .map(|fixture| fixture.shape().radius_from(center))
            .fold(0.0, f64::max);
    }

    /// Whether the body takes part in the simulation.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Activate or deactivate the body, used to bring back out-of-bounds bodies.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        if active {
            self.wake();
        }
    }

    /// Whether the body is currently asleep.
    pub fn is_asleep(&self) -> bool {
        self.asleep
    }

    /// Allow or forbid automatic sleeping.
    pub fn set_auto_sleep(&mut self, auto_sleep: bool) {
        self.auto_sleep = auto_sleep;
        if !auto_sleep {
            self.wake();
        }
    }

    /// Whether the body may be put to sleep automatically.
    pub fn auto_sleep(&self) -> bool {
        self.auto_sleep
    }

    /// Put the body to sleep, zeroing motion and accumulators.
    pub(crate) fn sleep(&mut self) {
        self.asleep = true;
        self.velocity = Vec2::zero();
        self.angular_velocity = 0.0;
        self.clear_accumulators();
    }

    /// Wake the body up, resetting the sleep timer.
    pub fn wake(&mut self) {
        self.asleep = false;
        self.sleep_time = 0.0;
    }

    /// Force the sleep state, bypassing the island-wide rest criterion.
    pub fn set_asleep(&mut self, asleep: bool) {
        if asleep {
            self.sleep();
        } else {
            self.wake();
        }
    }

    /// Whether the body gets a continuous collision sweep.
    pub fn is_bullet(&self) -> bool {
        self.bullet
    }

    /// Flag the body for continuous collision detection.
    pub fn set_bullet(&mut self, bullet: bool) {
        self.bullet = bullet;
    }

    /// Current rotation in radians, shorthand for debug draw.
    pub fn rotation(&self) -> f64 {
        self.transform.rot.to_radians()
    }

    /// Current rotation.
    pub fn rotation_parts(&self) -> Rotation {
        self.transform.rot
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use vek::Vec2;

    use crate::{
        dynamics::fixture::Fixture,
        geometry::{Circle, Polygon},
        math::Iso,
        settings::Settings,
    };

    use super::Body;

    fn unit_box_body() -> Body {
        let mut body = Body::new();
        body.add_fixture(Fixture::new(Polygon::rectangle(1.0, 1.0).unwrap()));
        body.set_mass_from_fixtures();

        body
    }

    /// World-local round trip must be the identity.
    #[test]
    fn test_point_roundtrip() {
        let mut body = unit_box_body();
        body.set_transform(Iso::new(Vec2::new(2.0, 3.0), 0.7)).unwrap();

        let point = Vec2::new(-1.5, 4.0);
        let roundtrip = body.world_point(body.local_point(point));
        assert_relative_eq!(roundtrip.x, point.x, epsilon = 1e-12);
        assert_relative_eq!(roundtrip.y, point.y, epsilon = 1e-12);
    }

    /// Forces must not move a body without mass response.
    #[test]
    fn test_static_unaffected() {
        let mut body = Body::new();
        body.add_fixture(Fixture::new(Circle::new(1.0).unwrap()));
        body.set_mass(crate::geometry::Mass::infinite(Vec2::zero()));

        body.apply_force(Vec2::new(100.0, 100.0)).unwrap();
        body.apply_torque(50.0).unwrap();
        body.integrate_velocity(1.0 / 60.0, Vec2::new(0.0, -9.81));

        assert_eq!(body.velocity(), Vec2::zero());
        assert_eq!(body.angular_velocity(), 0.0);
    }

    /// Timed forces must retire once their time is spent.
    #[test]
    fn test_timed_force_retires() {
        let mut body = unit_box_body();
        body.apply_timed_force(Vec2::new(1.0, 0.0), 0.05).unwrap();

        let dt = 1.0 / 60.0;
        let mut applied = 0;
        for _ in 0..10 {
            body.clear_accumulators();
            body.accumulate(dt);
            if body.force != Vec2::zero() {
                applied += 1;
            }
        }

        // 0.05 s at 60 Hz is three steps
        assert_eq!(applied, 3);
    }

    /// NaN state must poison the body inactive instead of spreading.
    #[test]
    fn test_poison() {
        let mut body = unit_box_body();
        body.velocity = Vec2::new(f64::NAN, 0.0);

        assert!(body.poison_if_degenerate());
        assert!(!body.is_active());
        assert_eq!(body.velocity(), Vec2::zero());
    }

    /// Translation must be clamped to the per-step maximum.
    #[test]
    fn test_translation_clamp() {
        let settings = Settings::default();
        let mut body = unit_box_body();
        body.set_velocity(Vec2::new(1000.0, 0.0)).unwrap();

        body.integrate_position(1.0 / 60.0, &settings);
        assert_relative_eq!(body.transform().pos.x, settings.max_translation);
    }
}
