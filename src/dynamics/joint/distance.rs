//! Distance joint, a rigid rod or a damped spring between two anchors.

use slotmap::SlotMap;
use vek::Vec2;

use crate::{
    dynamics::body::{Body, BodyKey},
    error::{check_finite, Error, Result},
    math::{cross_scalar, perp_dot},
    settings::Settings,
    world::World,
};

use super::{bodies_two_mut, Joint};

/// Keeps two anchor points at a fixed distance.
///
/// With a frequency set the rod softens into a damped harmonic spring, in
/// which case the position solver leaves it alone.
#[derive(Debug)]
pub struct DistanceJoint {
    body1: BodyKey,
    body2: BodyKey,
    local_anchor1: Vec2<f64>,
    local_anchor2: Vec2<f64>,
    /// Distance the joint tries to hold.
    rest_length: f64,
    collision_allowed: bool,

    /// Spring frequency in Hz, zero means rigid.
    frequency: f64,
    /// Spring damping ratio.
    damping_ratio: f64,

    impulse: f64,

    // Per-step solver cache
    r1: Vec2<f64>,
    r2: Vec2<f64>,
    normal: Vec2<f64>,
    mass: f64,
    gamma: f64,
    bias: f64,
}

impl DistanceJoint {
    /// Create a rod between two world anchor points.
    ///
    /// The rest length is the current distance between the anchors.
    pub fn new(
        world: &World,
        body1: BodyKey,
        body2: BodyKey,
        anchor1: Vec2<f64>,
        anchor2: Vec2<f64>,
    ) -> Result<Self> {
        check_finite("anchor1.x", anchor1.x)?;
        check_finite("anchor1.y", anchor1.y)?;
        check_finite("anchor2.x", anchor2.x)?;
        check_finite("anchor2.y", anchor2.y)?;
        if body1 == body2 {
            return Err(Error::JointBodiesIdentical);
        }

        let b1 = world.body(body1).ok_or(Error::BodyNotInWorld)?;
        let b2 = world.body(body2).ok_or(Error::BodyNotInWorld)?;

        let rest_length = (anchor2 - anchor1).magnitude();

        Ok(Self {
            body1,
            body2,
            local_anchor1: b1.local_point(anchor1),
            local_anchor2: b2.local_point(anchor2),
            rest_length,
            collision_allowed: false,
            frequency: 0.0,
            damping_ratio: 0.0,
            impulse: 0.0,
            r1: Vec2::zero(),
            r2: Vec2::zero(),
            normal: Vec2::unit_y(),
            mass: 0.0,
            gamma: 0.0,
            bias: 0.0,
        })
    }

    /// Soften the rod into a spring.
    pub fn with_spring(mut self, frequency: f64, damping_ratio: f64) -> Result<Self> {
        check_finite("frequency", frequency)?;
        check_finite("damping_ratio", damping_ratio)?;
        if frequency <= 0.0 {
            return Err(Error::OutOfRange {
                name: "frequency",
                min: f64::MIN_POSITIVE,
                max: f64::MAX,
                value: frequency,
            });
        }

        self.frequency = frequency;
        self.damping_ratio = damping_ratio.max(0.0);

        Ok(self)
    }

    /// Let the joined bodies keep colliding.
    pub fn with_collision_allowed(mut self, allowed: bool) -> Self {
        self.collision_allowed = allowed;

        self
    }

    /// Distance the joint tries to hold.
    pub fn rest_length(&self) -> f64 {
        self.rest_length
    }
}

impl Joint for DistanceJoint {
    fn body1(&self) -> BodyKey {
        self.body1
    }

    fn body2(&self) -> Option<BodyKey> {
        Some(self.body2)
    }

    fn collision_allowed(&self) -> bool {
        self.collision_allowed
    }

    fn initialize(&mut self, bodies: &mut SlotMap<BodyKey, Body>, _settings: &Settings, dt: f64) {
        let [b1, b2] = bodies_two_mut(bodies, self.body1, self.body2);

        self.r1 = b1.world_point(self.local_anchor1) - b1.world_center();
        self.r2 = b2.world_point(self.local_anchor2) - b2.world_center();

        let between = (b2.world_center() + self.r2) - (b1.world_center() + self.r1);
        let length = between.magnitude();
        self.normal = if length > f64::EPSILON {
            between / length
        } else {
            Vec2::unit_y()
        };

        let rn1 = perp_dot(self.r1, self.normal);
        let rn2 = perp_dot(self.r2, self.normal);
        let inv_mass = b1.inv_mass()
            + b2.inv_mass()
            + b1.inv_inertia() * rn1 * rn1
            + b2.inv_inertia() * rn2 * rn2;

        if self.frequency > 0.0 {
            // Soft constraint coefficients of a damped harmonic oscillator
            let c = length - self.rest_length;
            let omega = std::f64::consts::TAU * self.frequency;
            let mass = if inv_mass > 0.0 { inv_mass.recip() } else { 0.0 };
            let d = 2.0 * mass * self.damping_ratio * omega;
            let k = mass * omega * omega;

            self.gamma = dt * (d + dt * k);
            self.gamma = if self.gamma > 0.0 {
                self.gamma.recip()
            } else {
                0.0
            };
            self.bias = c * dt * k * self.gamma;

            let softened = inv_mass + self.gamma;
            self.mass = if softened > 0.0 { softened.recip() } else { 0.0 };
        } else {
            self.gamma = 0.0;
            self.bias = 0.0;
            self.mass = if inv_mass > 0.0 { inv_mass.recip() } else { 0.0 };
        }

        // Warm start
        let impulse = self.normal * self.impulse;
        b1.velocity -= impulse * b1.inv_mass();
        b1.angular_velocity -= b1.inv_inertia() * perp_dot(self.r1, impulse);
        b2.velocity += impulse * b2.inv_mass();
        b2.angular_velocity += b2.inv_inertia() * perp_dot(self.r2, impulse);
    }

    fn solve_velocity(&mut self, bodies: &mut SlotMap<BodyKey, Body>, _dt: f64) {
        let [b1, b2] = bodies_two_mut(bodies, self.body1, self.body2);

        let cdot = (b2.velocity + cross_scalar(b2.angular_velocity, self.r2)
            - b1.velocity
            - cross_scalar(b1.angular_velocity, self.r1))
        .dot(self.normal);

        let lambda = -self.mass * (cdot + self.bias + self.gamma * self.impulse);
        self.impulse += lambda;

        let impulse = self.normal * lambda;
        b1.velocity -= impulse * b1.inv_mass();
        b1.angular_velocity -= b1.inv_inertia() * perp_dot(self.r1, impulse);
        b2.velocity += impulse * b2.inv_mass();
        b2.angular_velocity += b2.inv_inertia() * perp_dot(self.r2, impulse);
    }

    fn solve_position(&mut self, bodies: &mut SlotMap<BodyKey, Body>, settings: &Settings) -> bool {
        // Springs resolve their error through velocity alone
        if self.frequency > 0.0 {
            return true;
        }

        let [b1, b2] = bodies_two_mut(bodies, self.body1, self.body2);

        let r1 = b1.world_point(self.local_anchor1) - b1.world_center();
        let r2 = b2.world_point(self.local_anchor2) - b2.world_center();
        let between = (b2.world_center() + r2) - (b1.world_center() + r1);

        let length = between.magnitude();
        if length <= f64::EPSILON {
            return true;
        }
        let normal = between / length;
        let c = (length - self.rest_length)
            .clamp(-settings.max_correction, settings.max_correction);

        let rn1 = perp_dot(r1, normal);
        let rn2 = perp_dot(r2, normal);
        let inv_mass = b1.inv_mass()
            + b2.inv_mass()
            + b1.inv_inertia() * rn1 * rn1
            + b2.inv_inertia() * rn2 * rn2;
        if inv_mass <= f64::EPSILON {
            return true;
        }

        let impulse = normal * (-c / inv_mass);
        b1.transform.pos -= impulse * b1.inv_mass();
        b1.transform.rot += -b1.inv_inertia() * perp_dot(r1, impulse);
        b2.transform.pos += impulse * b2.inv_mass();
        b2.transform.rot += b2.inv_inertia() * perp_dot(r2, impulse);

        c.abs() <= 3.0 * settings.linear_slop
    }
}
