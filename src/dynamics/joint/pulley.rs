//! Pulley joint, a rope over two ground anchors with a transmission ratio.

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

/// Holds `length1 + ratio * length2` constant, the lengths measured from
/// each body anchor to its fixed ground anchor.
#[derive(Debug)]
pub struct PulleyJoint {
    body1: BodyKey,
    body2: BodyKey,
    /// Fixed world point above the first body.
    ground_anchor1: Vec2<f64>,
    /// Fixed world point above the second body.
    ground_anchor2: Vec2<f64>,
    local_anchor1: Vec2<f64>,
    local_anchor2: Vec2<f64>,
    /// Transmission ratio, one side lifts as much as the other drops times this.
    ratio: f64,
    /// Total rope length held constant.
    constant: f64,
    collision_allowed: bool,

    impulse: f64,

    // Per-step solver cache
    u1: Vec2<f64>,
    u2: Vec2<f64>,
    r1: Vec2<f64>,
    r2: Vec2<f64>,
    mass: f64,
}

impl PulleyJoint {
    /// Hang two bodies from two fixed pulley wheels.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        world: &World,
        body1: BodyKey,
        body2: BodyKey,
        ground_anchor1: Vec2<f64>,
        ground_anchor2: Vec2<f64>,
        anchor1: Vec2<f64>,
        anchor2: Vec2<f64>,
        ratio: f64,
    ) -> Result<Self> {
        check_finite("ground_anchor1.x", ground_anchor1.x)?;
        check_finite("ground_anchor1.y", ground_anchor1.y)?;
        check_finite("ground_anchor2.x", ground_anchor2.x)?;
        check_finite("ground_anchor2.y", ground_anchor2.y)?;
        check_finite("anchor1.x", anchor1.x)?;
        check_finite("anchor1.y", anchor1.y)?;
        check_finite("anchor2.x", anchor2.x)?;
        check_finite("anchor2.y", anchor2.y)?;
        check_finite("ratio", ratio)?;
        if body1 == body2 {
            return Err(Error::JointBodiesIdentical);
        }
        if ratio <= 0.0 {
            return Err(Error::OutOfRange {
                name: "ratio",
                min: f64::MIN_POSITIVE,
                max: f64::MAX,
                value: ratio,
            });
        }

        let b1 = world.body(body1).ok_or(Error::BodyNotInWorld)?;
        let b2 = world.body(body2).ok_or(Error::BodyNotInWorld)?;

        let length1 = (anchor1 - ground_anchor1).magnitude();
        let length2 = (anchor2 - ground_anchor2).magnitude();

        Ok(Self {
            body1,
            body2,
            ground_anchor1,
            ground_anchor2,
            local_anchor1: b1.local_point(anchor1),
            local_anchor2: b2.local_point(anchor2),
            ratio,
            constant: length1 + ratio * length2,
            collision_allowed: true,
            impulse: 0.0,
            u1: Vec2::zero(),
            u2: Vec2::zero(),
            r1: Vec2::zero(),
            r2: Vec2::zero(),
            mass: 0.0,
        })
    }

    /// Rope direction from a ground anchor to a world anchor.
    fn rope_direction(ground: Vec2<f64>, anchor: Vec2<f64>) -> Vec2<f64> {
        let rope = anchor - ground;
        let length = rope.magnitude();

        if length > f64::EPSILON {
            rope / length
        } else {
            Vec2::zero()
        }
    }
}

impl Joint for PulleyJoint {
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

        self.u1 = Self::rope_direction(self.ground_anchor1, b1.world_center() + self.r1);
        self.u2 = Self::rope_direction(self.ground_anchor2, b2.world_center() + self.r2);

        let cr1 = perp_dot(self.r1, self.u1);
        let cr2 = perp_dot(self.r2, self.u2);
        let inv_mass = b1.inv_mass()
            + b1.inv_inertia() * cr1 * cr1
            + self.ratio * self.ratio * (b2.inv_mass() + b2.inv_inertia() * cr2 * cr2);
        self.mass = if inv_mass > 0.0 { inv_mass.recip() } else { 0.0 };

        // Warm start, the rope pulls both anchors toward their wheels
        let impulse1 = self.u1 * -self.impulse;
        let impulse2 = self.u2 * (-self.ratio * self.impulse);

        b1.velocity += impulse1 * b1.inv_mass();
        b1.angular_velocity += b1.inv_inertia() * perp_dot(self.r1, impulse1);
        b2.velocity += impulse2 * b2.inv_mass();
        b2.angular_velocity += b2.inv_inertia() * perp_dot(self.r2, impulse2);
    }

    fn solve_velocity(&mut self, bodies: &mut SlotMap<BodyKey, Body>, _dt: f64) {
        let [b1, b2] = bodies_two_mut(bodies, self.body1, self.body2);

        let velocity1 = b1.velocity + cross_scalar(b1.angular_velocity, self.r1);
        let velocity2 = b2.velocity + cross_scalar(b2.angular_velocity, self.r2);

        let cdot = -self.u1.dot(velocity1) - self.ratio * self.u2.dot(velocity2);
        let lambda = -self.mass * cdot;
        self.impulse += lambda;

        let impulse1 = self.u1 * -lambda;
        let impulse2 = self.u2 * (-self.ratio * lambda);

        b1.velocity += impulse1 * b1.inv_mass();
        b1.angular_velocity += b1.inv_inertia() * perp_dot(self.r1, impulse1);
        b2.velocity += impulse2 * b2.inv_mass();
        b2.angular_velocity += b2.inv_inertia() * perp_dot(self.r2, impulse2);
    }

    fn solve_position(&mut self, bodies: &mut SlotMap<BodyKey, Body>, settings: &Settings) -> bool {
        let [b1, b2] = bodies_two_mut(bodies, self.body1, self.body2);

        let r1 = b1.world_point(self.local_anchor1) - b1.world_center();
        let r2 = b2.world_point(self.local_anchor2) - b2.world_center();
        let anchor1 = b1.world_center() + r1;
        let anchor2 = b2.world_center() + r2;

        let u1 = Self::rope_direction(self.ground_anchor1, anchor1);
        let u2 = Self::rope_direction(self.ground_anchor2, anchor2);

        let length1 = (anchor1 - self.ground_anchor1).magnitude();
        let length2 = (anchor2 - self.ground_anchor2).magnitude();
        let c = self.constant - length1 - self.ratio * length2;

        let cr1 = perp_dot(r1, u1);
        let cr2 = perp_dot(r2, u2);
        let inv_mass = b1.inv_mass()
            + b1.inv_inertia() * cr1 * cr1
            + self.ratio * self.ratio * (b2.inv_mass() + b2.inv_inertia() * cr2 * cr2);
        if inv_mass <= f64::EPSILON {
            return true;
        }

        let lambda = -c / inv_mass;
        let impulse1 = u1 * -lambda;
        let impulse2 = u2 * (-self.ratio * lambda);

        b1.transform.pos += impulse1 * b1.inv_mass();
        b1.transform.rot += b1.inv_inertia() * perp_dot(r1, impulse1);
        b2.transform.pos += impulse2 * b2.inv_mass();
        b2.transform.rot += b2.inv_inertia() * perp_dot(r2, impulse2);

        c.abs() <= 3.0 * settings.linear_slop
    }

    fn shift(&mut self, offset: Vec2<f64>) {
        self.ground_anchor1 += offset;
        self.ground_anchor2 += offset;
    }
}
