//! Revolute joint, a shared hinge point with optional motor and angle limits.

use slotmap::SlotMap;
use vek::Vec2;

use crate::{
    dynamics::body::{Body, BodyKey},
    error::{check_finite, Error, Result},
    math::{cross_scalar, perp_dot},
    settings::Settings,
    world::World,
};

use super::{bodies_two_mut, point_mass_matrix, solve_2x2, Joint, LimitState};

/// Pins two bodies together at a world point, leaving only relative rotation.
#[derive(Debug)]
pub struct RevoluteJoint {
    body1: BodyKey,
    body2: BodyKey,
    /// Anchor in the first body's local frame.
    local_anchor1: Vec2<f64>,
    /// Anchor in the second body's local frame.
    local_anchor2: Vec2<f64>,
    /// Relative rotation at creation time, the joint angle zero point.
    reference_angle: f64,
    collision_allowed: bool,

    /// Whether the motor drives the joint angle.
    motor_enabled: bool,
    /// Target joint speed in radians per second.
    motor_speed: f64,
    /// Torque budget of the motor.
    max_motor_torque: f64,

    /// Whether the angle limits engage.
    limit_enabled: bool,
    lower_limit: f64,
    upper_limit: f64,

    // Accumulated impulses
    impulse: Vec2<f64>,
    motor_impulse: f64,
    limit_impulse: f64,

    // Per-step solver cache
    r1: Vec2<f64>,
    r2: Vec2<f64>,
    k11: f64,
    k12: f64,
    k22: f64,
    axial_mass: f64,
    limit_state: LimitState,
}

impl RevoluteJoint {
    /// Create a hinge at a world point between two bodies.
    pub fn new(world: &World, body1: BodyKey, body2: BodyKey, anchor: Vec2<f64>) -> Result<Self> {
        check_finite("anchor.x", anchor.x)?;
        check_finite("anchor.y", anchor.y)?;
        if body1 == body2 {
            return Err(Error::JointBodiesIdentical);
        }

        let b1 = world.body(body1).ok_or(Error::BodyNotInWorld)?;
        let b2 = world.body(body2).ok_or(Error::BodyNotInWorld)?;

        let local_anchor1 = b1.local_point(anchor);
        let local_anchor2 = b2.local_point(anchor);
        let reference_angle = b2.rotation() - b1.rotation();

        Ok(Self {
            body1,
            body2,
            local_anchor1,
            local_anchor2,
            reference_angle,
            collision_allowed: false,
            motor_enabled: false,
            motor_speed: 0.0,
            max_motor_torque: 0.0,
            limit_enabled: false,
            lower_limit: 0.0,
            upper_limit: 0.0,
            impulse: Vec2::zero(),
            motor_impulse: 0.0,
            limit_impulse: 0.0,
            r1: Vec2::zero(),
            r2: Vec2::zero(),
            k11: 0.0,
            k12: 0.0,
            k22: 0.0,
            axial_mass: 0.0,
            limit_state: LimitState::Inactive,
        })
    }

    /// Drive the joint angle with the given speed and torque budget.
    pub fn with_motor(mut self, speed: f64, max_torque: f64) -> Result<Self> {
        check_finite("speed", speed)?;
        check_finite("max_torque", max_torque)?;

        self.motor_enabled = true;
        self.motor_speed = speed;
        self.max_motor_torque = max_torque;

        Ok(self)
    }

    /// Restrict the joint angle to a range around the reference angle.
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

    /// Current joint angle relative to the reference.
    pub fn angle(&self, bodies: &SlotMap<BodyKey, Body>) -> f64 {
        bodies[self.body2].rotation() - bodies[self.body1].rotation() - self.reference_angle
    }
}

impl Joint for RevoluteJoint {
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

        self.r1 = b1.world_point(self.local_anchor1) - b1.world_center();
        self.r2 = b2.world_point(self.local_anchor2) - b2.world_center();
        (self.k11, self.k12, self.k22) = point_mass_matrix(b1, b2, self.r1, self.r2);

        let inertia = b1.inv_inertia() + b2.inv_inertia();
        self.axial_mass = if inertia > 0.0 { inertia.recip() } else { 0.0 };

        if self.limit_enabled {
            self.limit_state = LimitState::classify(angle, self.lower_limit, self.upper_limit);
            if self.limit_state == LimitState::Inactive {
                self.limit_impulse = 0.0;
            }
        } else {
            self.limit_state = LimitState::Inactive;
            self.limit_impulse = 0.0;
        }
        if !self.motor_enabled {
            self.motor_impulse = 0.0;
        }

        // Warm start
        let axial = self.motor_impulse + self.limit_impulse;
        b1.velocity -= self.impulse * b1.inv_mass();
        b1.angular_velocity -= b1.inv_inertia() * (perp_dot(self.r1, self.impulse) + axial);
        b2.velocity += self.impulse * b2.inv_mass();
        b2.angular_velocity += b2.inv_inertia() * (perp_dot(self.r2, self.impulse) + axial);
    }

    fn solve_velocity(&mut self, bodies: &mut SlotMap<BodyKey, Body>, dt: f64) {
        let [b1, b2] = bodies_two_mut(bodies, self.body1, self.body2);

        // Motor torque, clamped to its budget over the step
        if self.motor_enabled && self.limit_state != LimitState::Equal {
            let cdot = b2.angular_velocity - b1.angular_velocity - self.motor_speed;
            let lambda = -self.axial_mass * cdot;

            let max = self.max_motor_torque * dt;
            let old = self.motor_impulse;
            self.motor_impulse = (old + lambda).clamp(-max, max);
            let lambda = self.motor_impulse - old;

            b1.angular_velocity -= b1.inv_inertia() * lambda;
            b2.angular_velocity += b2.inv_inertia() * lambda;
        }

        // Limit torque, one-sided except when the range collapses
        if self.limit_enabled && self.limit_state != LimitState::Inactive {
            let cdot = b2.angular_velocity - b1.angular_velocity;
            let lambda = -self.axial_mass * cdot;

            let old = self.limit_impulse;
            self.limit_impulse = match self.limit_state {
                LimitState::AtLower => (old + lambda).max(0.0),
                LimitState::AtUpper => (old + lambda).min(0.0),
                _ => old + lambda,
            };
            let lambda = self.limit_impulse - old;

            b1.angular_velocity -= b1.inv_inertia() * lambda;
            b2.angular_velocity += b2.inv_inertia() * lambda;
        }

        // Point constraint keeps the anchors together
        let cdot = b2.velocity + cross_scalar(b2.angular_velocity, self.r2)
            - b1.velocity
            - cross_scalar(b1.angular_velocity, self.r1);
        let lambda = solve_2x2(self.k11, self.k12, self.k22, -cdot);
        self.impulse += lambda;

        b1.velocity -= lambda * b1.inv_mass();
        b1.angular_velocity -= b1.inv_inertia() * perp_dot(self.r1, lambda);
        b2.velocity += lambda * b2.inv_mass();
        b2.angular_velocity += b2.inv_inertia() * perp_dot(self.r2, lambda);
    }

    fn solve_position(&mut self, bodies: &mut SlotMap<BodyKey, Body>, settings: &Settings) -> bool {
        let angle = self.angle(bodies);
        let [b1, b2] = bodies_two_mut(bodies, self.body1, self.body2);

        let mut angular_error = 0.0;

        // Push the angle back inside the limits
        if self.limit_enabled && self.axial_mass > 0.0 {
            let c = match self.limit_state {
                LimitState::AtLower => (angle - self.lower_limit).min(0.0),
                LimitState::AtUpper => (angle - self.upper_limit).max(0.0),
                LimitState::Equal => angle - self.lower_limit,
                LimitState::Inactive => 0.0,
            };
            angular_error = c.abs();

            let lambda = -self.axial_mass * c;
            b1.transform.rot += -b1.inv_inertia() * lambda;
            b2.transform.rot += b2.inv_inertia() * lambda;
        }

        // Pull the anchors back together
        let r1 = b1.world_point(self.local_anchor1) - b1.world_center();
        let r2 = b2.world_point(self.local_anchor2) - b2.world_center();
        let c = (b2.world_center() + r2) - (b1.world_center() + r1);
        let error = c.magnitude();

        let (k11, k12, k22) = point_mass_matrix(b1, b2, r1, r2);
        let lambda = solve_2x2(k11, k12, k22, -c);

        b1.transform.pos -= lambda * b1.inv_mass();
        b1.transform.rot += -b1.inv_inertia() * perp_dot(r1, lambda);
        b2.transform.pos += lambda * b2.inv_mass();
        b2.transform.rot += b2.inv_inertia() * perp_dot(r2, lambda);

        error <= 3.0 * settings.linear_slop && angular_error <= 2.0 * settings.linear_slop
    }
}
