//! Weld joint, freezes the relative transform of two bodies.

use slotmap::SlotMap;
use vek::Vec2;

use crate::{
    dynamics::body::{Body, BodyKey},
    error::{check_finite, Error, Result},
    math::{cross_scalar, perp_dot},
    settings::Settings,
    world::World,
};

use super::{bodies_two_mut, point_mass_matrix, solve_2x2, Joint};

/// Rigidly glues two bodies together at a world anchor.
#[derive(Debug)]
pub struct WeldJoint {
    body1: BodyKey,
    body2: BodyKey,
    local_anchor1: Vec2<f64>,
    local_anchor2: Vec2<f64>,
    reference_angle: f64,
    collision_allowed: bool,

    impulse: Vec2<f64>,
    angular_impulse: f64,

    // Per-step solver cache
    r1: Vec2<f64>,
    r2: Vec2<f64>,
    k11: f64,
    k12: f64,
    k22: f64,
    angular_mass: f64,
}

impl WeldJoint {
    /// Weld two bodies together at a world point.
    pub fn new(world: &World, body1: BodyKey, body2: BodyKey, anchor: Vec2<f64>) -> Result<Self> {
        check_finite("anchor.x", anchor.x)?;
        check_finite("anchor.y", anchor.y)?;
        if body1 == body2 {
            return Err(Error::JointBodiesIdentical);
        }

        let b1 = world.body(body1).ok_or(Error::BodyNotInWorld)?;
        let b2 = world.body(body2).ok_or(Error::BodyNotInWorld)?;

        Ok(Self {
            body1,
            body2,
            local_anchor1: b1.local_point(anchor),
            local_anchor2: b2.local_point(anchor),
            reference_angle: b2.rotation() - b1.rotation(),
            collision_allowed: false,
            impulse: Vec2::zero(),
            angular_impulse: 0.0,
            r1: Vec2::zero(),
            r2: Vec2::zero(),
            k11: 0.0,
            k12: 0.0,
            k22: 0.0,
            angular_mass: 0.0,
        })
    }

    /// Let the joined bodies keep colliding.
    pub fn with_collision_allowed(mut self, allowed: bool) -> Self {
        self.collision_allowed = allowed;

        self
    }
}

impl Joint for WeldJoint {
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
        let [b1, b2] = bodies_two_mut(bodies, self.body1, self.body2);

        self.r1 = b1.world_point(self.local_anchor1) - b1.world_center();
        self.r2 = b2.world_point(self.local_anchor2) - b2.world_center();
        (self.k11, self.k12, self.k22) = point_mass_matrix(b1, b2, self.r1, self.r2);

        let inertia = b1.inv_inertia() + b2.inv_inertia();
        self.angular_mass = if inertia > 0.0 { inertia.recip() } else { 0.0 };

        // Warm start
        b1.velocity -= self.impulse * b1.inv_mass();
        b1.angular_velocity -=
            b1.inv_inertia() * (perp_dot(self.r1, self.impulse) + self.angular_impulse);
        b2.velocity += self.impulse * b2.inv_mass();
        b2.angular_velocity +=
            b2.inv_inertia() * (perp_dot(self.r2, self.impulse) + self.angular_impulse);
    }

    fn solve_velocity(&mut self, bodies: &mut SlotMap<BodyKey, Body>, _dt: f64) {
        let [b1, b2] = bodies_two_mut(bodies, self.body1, self.body2);

        // Angular lock
        {
            let cdot = b2.angular_velocity - b1.angular_velocity;
            let lambda = -self.angular_mass * cdot;
            self.angular_impulse += lambda;

            b1.angular_velocity -= b1.inv_inertia() * lambda;
            b2.angular_velocity += b2.inv_inertia() * lambda;
        }

        // Point lock
        {
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
    }

    fn solve_position(&mut self, bodies: &mut SlotMap<BodyKey, Body>, settings: &Settings) -> bool {
        let [b1, b2] = bodies_two_mut(bodies, self.body1, self.body2);

        // Angle error first, the point fix below works at the new rotations
        let angle_error = b2.rotation() - b1.rotation() - self.reference_angle;
        if self.angular_mass > 0.0 {
            let lambda = -self.angular_mass * angle_error;
            b1.transform.rot += -b1.inv_inertia() * lambda;
            b2.transform.rot += b2.inv_inertia() * lambda;
        }

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

        error <= 3.0 * settings.linear_slop && angle_error.abs() <= 2.0 * settings.linear_slop
    }
}
