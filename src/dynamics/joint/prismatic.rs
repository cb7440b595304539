//! Prismatic joint, a slider along one axis with optional motor and limits.

use slotmap::SlotMap;
use vek::Vec2;

use crate::{
    dynamics::body::{Body, BodyKey},
    error::{check_finite, Error, Result},
    math::{left, perp_dot},
    settings::Settings,
    world::World,
};

use super::{bodies_two_mut, Joint, LimitState};

/// Locks relative rotation and restricts translation to a single axis.
#[derive(Debug)]
pub struct PrismaticJoint {
    body1: BodyKey,
    body2: BodyKey,
    local_anchor1: Vec2<f64>,
    local_anchor2: Vec2<f64>,
    /// Slide axis in the first body's local frame, unit length.
    local_axis: Vec2<f64>,
    /// Relative rotation at creation time.
    reference_angle: f64,
    collision_allowed: bool,

    motor_enabled: bool,
    /// Target slide speed in meters per second.
    motor_speed: f64,
    /// Force budget of the motor.
    max_motor_force: f64,

    limit_enabled: bool,
    lower_limit: f64,
    upper_limit: f64,

    // Accumulated impulses
    perp_impulse: f64,
    angular_impulse: f64,
    motor_impulse: f64,
    limit_impulse: f64,

    // Per-step solver cache
    axis: Vec2<f64>,
    perp: Vec2<f64>,
    s1: f64,
    s2: f64,
    a1: f64,
    a2: f64,
    perp_mass: f64,
    angular_mass: f64,
    axial_mass: f64,
    limit_state: LimitState,
}

impl PrismaticJoint {
    /// Create a slider through a world anchor along a world axis.
    pub fn new(
        world: &World,
        body1: BodyKey,
        body2: BodyKey,
        anchor: Vec2<f64>,
        axis: Vec2<f64>,
    ) -> Result<Self> {
        check_finite("anchor.x", anchor.x)?;
        check_finite("anchor.y", anchor.y)?;
        check_finite("axis.x", axis.x)?;
        check_finite("axis.y", axis.y)?;
        if body1 == body2 {
            return Err(Error::JointBodiesIdentical);
        }
        let length = axis.magnitude();
        if length <= f64::EPSILON {
            return Err(Error::ZeroLengthAxis);
        }

        let b1 = world.body(body1).ok_or(Error::BodyNotInWorld)?;
        let b2 = world.body(body2).ok_or(Error::BodyNotInWorld)?;

        Ok(Self {
            body1,
            body2,
            local_anchor1: b1.local_point(anchor),
            local_anchor2: b2.local_point(anchor),
            local_axis: b1.local_vector(axis / length),
            reference_angle: b2.rotation() - b1.rotation(),
            collision_allowed: false,
            motor_enabled: false,
            motor_speed: 0.0,
            max_motor_force: 0.0,
            limit_enabled: false,
            lower_limit: 0.0,
            upper_limit: 0.0,
            perp_impulse: 0.0,
            angular_impulse: 0.0,
            motor_impulse: 0.0,
            limit_impulse: 0.0,
            axis: Vec2::zero(),
            perp: Vec2::zero(),
            s1: 0.0,
            s2: 0.0,
            a1: 0.0,
            a2: 0.0,
            perp_mass: 0.0,
            angular_mass: 0.0,
            axial_mass: 0.0,
            limit_state: LimitState::Inactive,
        })
    }

    /// Drive the slide with the given speed and force budget.
    pub fn with_motor(mut self, speed: f64, max_force: f64) -> Result<Self> {
        check_finite("speed", speed)?;
        check_finite("max_force", max_force)?;

        self.motor_enabled = true;
        self.motor_speed = speed;
        self.max_motor_force = max_force;

        Ok(self)
    }

    /// Restrict the translation along the axis.
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

    /// Current translation of the second body along the axis.
    pub fn translation(&self, bodies: &SlotMap<BodyKey, Body>) -> f64 {
        let b1 = &bodies[self.body1];
        let b2 = &bodies[self.body2];

        let d = b2.world_point(self.local_anchor2) - b1.world_point(self.local_anchor1);

        d.dot(b1.world_vector(self.local_axis))
    }
}

impl Joint for PrismaticJoint {
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
        let translation = self.translation(bodies);
        let [b1, b2] = bodies_two_mut(bodies, self.body1, self.body2);

        let r1 = b1.world_point(self.local_anchor1) - b1.world_center();
        let r2 = b2.world_point(self.local_anchor2) - b2.world_center();
        let d = (b2.world_center() + r2) - (b1.world_center() + r1);

        self.axis = b1.world_vector(self.local_axis);
        self.perp = left(self.axis);

        self.s1 = perp_dot(d + r1, self.perp);
        self.s2 = perp_dot(r2, self.perp);
        self.a1 = perp_dot(d + r1, self.axis);
        self.a2 = perp_dot(r2, self.axis);

        let im = b1.inv_mass() + b2.inv_mass();
        let ii1 = b1.inv_inertia();
        let ii2 = b2.inv_inertia();

        let k_perp = im + ii1 * self.s1 * self.s1 + ii2 * self.s2 * self.s2;
        self.perp_mass = if k_perp > 0.0 { k_perp.recip() } else { 0.0 };

        let k_angular = ii1 + ii2;
        self.angular_mass = if k_angular > 0.0 { k_angular.recip() } else { 0.0 };

        let k_axial = im + ii1 * self.a1 * self.a1 + ii2 * self.a2 * self.a2;
        self.axial_mass = if k_axial > 0.0 { k_axial.recip() } else { 0.0 };

        if self.limit_enabled {
            self.limit_state =
                LimitState::classify(translation, self.lower_limit, self.upper_limit);
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
        let impulse = self.perp * self.perp_impulse + self.axis * axial;
        let l1 = self.perp_impulse * self.s1 + axial * self.a1 + self.angular_impulse;
        let l2 = self.perp_impulse * self.s2 + axial * self.a2 + self.angular_impulse;

        b1.velocity -= impulse * b1.inv_mass();
        b1.angular_velocity -= ii1 * l1;
        b2.velocity += impulse * b2.inv_mass();
        b2.angular_velocity += ii2 * l2;
    }

    fn solve_velocity(&mut self, bodies: &mut SlotMap<BodyKey, Body>, dt: f64) {
        let [b1, b2] = bodies_two_mut(bodies, self.body1, self.body2);

        // Motor along the axis
        if self.motor_enabled && self.limit_state != LimitState::Equal {
            let cdot = self.axis.dot(b2.velocity - b1.velocity) + self.a2 * b2.angular_velocity
                - self.a1 * b1.angular_velocity;
            let lambda = -self.axial_mass * (cdot - self.motor_speed);

            let max = self.max_motor_force * dt;
            let old = self.motor_impulse;
            self.motor_impulse = (old + lambda).clamp(-max, max);
            let lambda = self.motor_impulse - old;

            let impulse = self.axis * lambda;
            b1.velocity -= impulse * b1.inv_mass();
            b1.angular_velocity -= b1.inv_inertia() * lambda * self.a1;
            b2.velocity += impulse * b2.inv_mass();
            b2.angular_velocity += b2.inv_inertia() * lambda * self.a2;
        }

        // Translation limits
        if self.limit_enabled && self.limit_state != LimitState::Inactive {
            let cdot = self.axis.dot(b2.velocity - b1.velocity) + self.a2 * b2.angular_velocity
                - self.a1 * b1.angular_velocity;
            let lambda = -self.axial_mass * cdot;

            let old = self.limit_impulse;
            self.limit_impulse = match self.limit_state {
                LimitState::AtLower => (old + lambda).max(0.0),
                LimitState::AtUpper => (old + lambda).min(0.0),
                _ => old + lambda,
            };
            let lambda = self.limit_impulse - old;

            let impulse = self.axis * lambda;
            b1.velocity -= impulse * b1.inv_mass();
            b1.angular_velocity -= b1.inv_inertia() * lambda * self.a1;
            b2.velocity += impulse * b2.inv_mass();
            b2.angular_velocity += b2.inv_inertia() * lambda * self.a2;
        }

        // Keep the bodies from rotating relative to each other
        {
            let cdot = b2.angular_velocity - b1.angular_velocity;
            let lambda = -self.angular_mass * cdot;
            self.angular_impulse += lambda;

            b1.angular_velocity -= b1.inv_inertia() * lambda;
            b2.angular_velocity += b2.inv_inertia() * lambda;
        }

        // Keep the anchors on the slide line
        {
            let cdot = self.perp.dot(b2.velocity - b1.velocity) + self.s2 * b2.angular_velocity
                - self.s1 * b1.angular_velocity;
            let lambda = -self.perp_mass * cdot;
            self.perp_impulse += lambda;

            let impulse = self.perp * lambda;
            b1.velocity -= impulse * b1.inv_mass();
            b1.angular_velocity -= b1.inv_inertia() * lambda * self.s1;
            b2.velocity += impulse * b2.inv_mass();
            b2.angular_velocity += b2.inv_inertia() * lambda * self.s2;
        }
    }

    fn solve_position(&mut self, bodies: &mut SlotMap<BodyKey, Body>, settings: &Settings) -> bool {
        let [b1, b2] = bodies_two_mut(bodies, self.body1, self.body2);

        let r1 = b1.world_point(self.local_anchor1) - b1.world_center();
        let r2 = b2.world_point(self.local_anchor2) - b2.world_center();
        let d = (b2.world_center() + r2) - (b1.world_center() + r1);

        let axis = b1.world_vector(self.local_axis);
        let perp = left(axis);

        // Angle error
        let angle_error = b2.rotation() - b1.rotation() - self.reference_angle;
        if self.angular_mass > 0.0 {
            let lambda = -self.angular_mass * angle_error;
            b1.transform.rot += -b1.inv_inertia() * lambda;
            b2.transform.rot += b2.inv_inertia() * lambda;
        }

        // Off-axis error
        let perp_error = perp.dot(d);
        let s1 = perp_dot(d + r1, perp);
        let s2 = perp_dot(r2, perp);
        let k_perp = b1.inv_mass()
            + b2.inv_mass()
            + b1.inv_inertia() * s1 * s1
            + b2.inv_inertia() * s2 * s2;
        if k_perp > 0.0 {
            let lambda = -perp_error / k_perp;
            let impulse = perp * lambda;

            b1.transform.pos -= impulse * b1.inv_mass();
            b1.transform.rot += -b1.inv_inertia() * lambda * s1;
            b2.transform.pos += impulse * b2.inv_mass();
            b2.transform.rot += b2.inv_inertia() * lambda * s2;
        }

        // Limit overshoot
        let mut limit_error = 0.0;
        if self.limit_enabled {
            let translation = axis.dot(d);
            let c = match LimitState::classify(translation, self.lower_limit, self.upper_limit) {
                LimitState::AtLower => (translation - self.lower_limit).min(0.0),
                LimitState::AtUpper => (translation - self.upper_limit).max(0.0),
                LimitState::Equal => translation - self.lower_limit,
                LimitState::Inactive => 0.0,
            };
            limit_error = c.abs();

            if c != 0.0 && self.axial_mass > 0.0 {
                let a1 = perp_dot(d + r1, axis);
                let a2 = perp_dot(r2, axis);
                let lambda = -self.axial_mass * c;
                let impulse = axis * lambda;

                b1.transform.pos -= impulse * b1.inv_mass();
                b1.transform.rot += -b1.inv_inertia() * lambda * a1;
                b2.transform.pos += impulse * b2.inv_mass();
                b2.transform.rot += b2.inv_inertia() * lambda * a2;
            }
        }

        perp_error.abs() <= 3.0 * settings.linear_slop
            && angle_error.abs() <= 2.0 * settings.linear_slop
            && limit_error <= 3.0 * settings.linear_slop
    }
}
