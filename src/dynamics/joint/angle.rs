//! Angle joint, constrains relative rotation with an optional gear ratio.

use slotmap::SlotMap;

use crate::{
    dynamics::body::{Body, BodyKey},
    error::{check_finite, Error, Result},
    settings::Settings,
    world::World,
};

use super::{bodies_two_mut, Joint, LimitState};

/// Couples the rotation of two bodies, `a1 = ratio * a2` around the
/// reference, optionally only inside a limit range.
#[derive(Debug)]
pub struct AngleJoint {
    body1: BodyKey,
    body2: BodyKey,
    /// Rotation coupling ratio of the first body over the second.
    ratio: f64,
    reference_angle: f64,
    collision_allowed: bool,

    limit_enabled: bool,
    lower_limit: f64,
    upper_limit: f64,

    impulse: f64,

    // Per-step solver cache
    mass: f64,
    limit_state: LimitState,
}

impl AngleJoint {
    /// Lock the relative rotation of two bodies at its current value.
    pub fn new(world: &World, body1: BodyKey, body2: BodyKey) -> Result<Self> {
        if body1 == body2 {
            return Err(Error::JointBodiesIdentical);
        }

        let b1 = world.body(body1).ok_or(Error::BodyNotInWorld)?;
        let b2 = world.body(body2).ok_or(Error::BodyNotInWorld)?;

        Ok(Self {
            body1,
            body2,
            ratio: 1.0,
            reference_angle: b2.rotation() - b1.rotation(),
            collision_allowed: false,
            limit_enabled: false,
            lower_limit: 0.0,
            upper_limit: 0.0,
            impulse: 0.0,
            mass: 0.0,
            limit_state: LimitState::Inactive,
        })
    }

    /// Couple the rotations with a gear ratio instead of locking them.
    pub fn with_ratio(mut self, ratio: f64) -> Result<Self> {
        check_finite("ratio", ratio)?;

        self.ratio = ratio;

        Ok(self)
    }

    /// Only constrain outside of an allowed relative angle range.
    pub fn with_limits(mut self, lower: f64, upper: f64) -> Result<Self> {
        check_finite("lower", lower)?;
        check_finite("upper", upper)?;
        if lower > upper {
            return Err(Error::OutOfRange {
                name: "lower",
                min: f64::MIN,
                max: upper,
                value: lower,
            });
        }

        self.limit_enabled = true;
        self.lower_limit = lower;
        self.upper_limit = upper;

        Ok(self)
    }

    /// Let the joined bodies keep colliding.
    pub fn with_collision_allowed(mut self, allowed: bool) -> Self {
        self.collision_allowed = allowed;

        self
    }

    /// Relative angle of the joint.
    fn angle(&self, bodies: &SlotMap<BodyKey, Body>) -> f64 {
        bodies[self.body2].rotation() - bodies[self.body1].rotation() - self.reference_angle
    }
}

impl Joint for AngleJoint {
    fn body1(&self) -> BodyKey {
        self.body1
    }

    fn body2(&self) -> Option<BodyKey> {
        Some(self.body2)
    }

    fn collision_allowed(&self) -> bool {
        self.collision_allowed
    }

    fn initialize(&mut self, bodies: &mut SlotMap<BodyKey, Body>, _settings: &Settings, _dt: f64) {
        let angle = self.angle(bodies);
        let [b1, b2] = bodies_two_mut(bodies, self.body1, self.body2);

        let inertia = self.ratio * self.ratio * b1.inv_inertia() + b2.inv_inertia();
        self.mass = if inertia > 0.0 { inertia.recip() } else { 0.0 };

        self.limit_state = if self.limit_enabled {
            LimitState::classify(angle, self.lower_limit, self.upper_limit)
        } else {
            // No limits means the joint always locks
            LimitState::Equal
        };
        if self.limit_state == LimitState::Inactive {
            self.impulse = 0.0;
        }

        // Warm start
        b1.angular_velocity -= b1.inv_inertia() * self.ratio * self.impulse;
        b2.angular_velocity += b2.inv_inertia() * self.impulse;
    }

    fn solve_velocity(&mut self, bodies: &mut SlotMap<BodyKey, Body>, _dt: f64) {
        if self.limit_state == LimitState::Inactive {
            return;
        }
        let [b1, b2] = bodies_two_mut(bodies, self.body1, self.body2);

        let cdot = b2.angular_velocity - self.ratio * b1.angular_velocity;
        let lambda = -self.mass * cdot;

        let old = self.impulse;
        self.impulse = match self.limit_state {
            LimitState::AtLower => (old + lambda).max(0.0),
            LimitState::AtUpper => (old + lambda).min(0.0),
            _ => old + lambda,
        };
        let lambda = self.impulse - old;

        b1.angular_velocity -= b1.inv_inertia() * self.ratio * lambda;
        b2.angular_velocity += b2.inv_inertia() * lambda;
    }

    fn solve_position(&mut self, bodies: &mut SlotMap<BodyKey, Body>, settings: &Settings) -> bool {
        // Ratio coupling only constrains velocities
        if self.ratio != 1.0 {
            return true;
        }

        let angle = self.angle(bodies);
        let [b1, b2] = bodies_two_mut(bodies, self.body1, self.body2);

        let c = if self.limit_enabled {
            match LimitState::classify(angle, self.lower_limit, self.upper_limit) {
                LimitState::AtLower => (angle - self.lower_limit).min(0.0),
                LimitState::AtUpper => (angle - self.upper_limit).max(0.0),
                LimitState::Equal => angle - self.lower_limit,
                LimitState::Inactive => 0.0,
            }
        } else {
            angle
        };

        if self.mass > 0.0 && c != 0.0 {
            let lambda = -self.mass * c;
            b1.transform.rot += -b1.inv_inertia() * lambda;
            b2.transform.rot += b2.inv_inertia() * lambda;
        }

        c.abs() <= 2.0 * settings.linear_slop
    }
}
