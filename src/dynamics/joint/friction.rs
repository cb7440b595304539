//! Friction joint, bleeds off relative motion up to a force budget.

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

/// Top-down friction between two bodies, resisting relative translation and
/// rotation without ever stopping an outside push stronger than its budget.
#[derive(Debug)]
pub struct FrictionJoint {
    body1: BodyKey,
    body2: BodyKey,
    local_anchor1: Vec2<f64>,
    local_anchor2: Vec2<f64>,
    /// Force budget resisting relative translation.
    max_force: f64,
    /// Torque budget resisting relative rotation.
    max_torque: f64,
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

impl FrictionJoint {
    /// Create friction between two bodies around a world anchor.
    pub fn new(
        world: &World,
        body1: BodyKey,
        body2: BodyKey,
        anchor: Vec2<f64>,
        max_force: f64,
        max_torque: f64,
    ) -> Result<Self> {
        check_finite("anchor.x", anchor.x)?;
        check_finite("anchor.y", anchor.y)?;
        check_finite("max_force", max_force)?;
        check_finite("max_torque", max_torque)?;
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
            max_force: max_force.max(0.0),
            max_torque: max_torque.max(0.0),
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

impl Joint for FrictionJoint {
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

    fn solve_velocity(&mut self, bodies: &mut SlotMap<BodyKey, Body>, dt: f64) {
        let [b1, b2] = bodies_two_mut(bodies, self.body1, self.body2);

        // Angular friction
        {
            let cdot = b2.angular_velocity - b1.angular_velocity;
            let lambda = -self.angular_mass * cdot;

            let max = self.max_torque * dt;
            let old = self.angular_impulse;
            self.angular_impulse = (old + lambda).clamp(-max, max);
            let lambda = self.angular_impulse - old;

            b1.angular_velocity -= b1.inv_inertia() * lambda;
            b2.angular_velocity += b2.inv_inertia() * lambda;
        }

        // Linear friction
        {
            let cdot = b2.velocity + cross_scalar(b2.angular_velocity, self.r2)
                - b1.velocity
                - cross_scalar(b1.angular_velocity, self.r1);
            let lambda = solve_2x2(self.k11, self.k12, self.k22, -cdot);

            let max = self.max_force * dt;
            let old = self.impulse;
            self.impulse += lambda;
            if self.impulse.magnitude() > max {
                self.impulse = self.impulse.normalized() * max;
            }
            let lambda = self.impulse - old;

            b1.velocity -= lambda * b1.inv_mass();
            b1.angular_velocity -= b1.inv_inertia() * perp_dot(self.r1, lambda);
            b2.velocity += lambda * b2.inv_mass();
            b2.angular_velocity += b2.inv_inertia() * perp_dot(self.r2, lambda);
        }
    }

    fn solve_position(&mut self, _bodies: &mut SlotMap<BodyKey, Body>, _settings: &Settings) -> bool {
        // Friction has no target position
        true
    }
}
