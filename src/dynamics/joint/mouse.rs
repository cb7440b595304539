//! Mouse joint, drags one body toward a movable world target.

use slotmap::SlotMap;
use vek::Vec2;

use crate::{
    dynamics::body::{Body, BodyKey},
    error::{check_finite, Error, Result},
    math::{cross_scalar, perp_dot},
    settings::Settings,
    world::World,
};

use super::{solve_2x2, Joint};

/// Soft spring between a body anchor and a world point, meant for
/// interactive dragging.
#[derive(Debug)]
pub struct MouseJoint {
    body: BodyKey,
    local_anchor: Vec2<f64>,
    /// World point the anchor is pulled toward.
    target: Vec2<f64>,
    /// Force budget of the drag.
    max_force: f64,
    /// Spring frequency in Hz.
    frequency: f64,
    /// Spring damping ratio.
    damping_ratio: f64,

    impulse: Vec2<f64>,

    // Per-step solver cache
    r: Vec2<f64>,
    k11: f64,
    k12: f64,
    k22: f64,
    gamma: f64,
    bias: Vec2<f64>,
}

impl MouseJoint {
    /// Grab a body at a world point.
    pub fn new(world: &World, body: BodyKey, grab: Vec2<f64>, max_force: f64) -> Result<Self> {
        check_finite("grab.x", grab.x)?;
        check_finite("grab.y", grab.y)?;
        check_finite("max_force", max_force)?;

        let b = world.body(body).ok_or(Error::BodyNotInWorld)?;

        Ok(Self {
            body,
            local_anchor: b.local_point(grab),
            target: grab,
            max_force: max_force.max(0.0),
            frequency: 5.0,
            damping_ratio: 0.7,
            impulse: Vec2::zero(),
            r: Vec2::zero(),
            k11: 0.0,
            k12: 0.0,
            k22: 0.0,
            gamma: 0.0,
            bias: Vec2::zero(),
        })
    }

    /// Tune the spring response.
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

    /// Move the drag target.
    pub fn set_target(&mut self, target: Vec2<f64>) -> Result<()> {
        check_finite("target.x", target.x)?;
        check_finite("target.y", target.y)?;

        self.target = target;

        Ok(())
    }

    /// The current drag target.
    pub fn target(&self) -> Vec2<f64> {
        self.target
    }
}

impl Joint for MouseJoint {
    fn body1(&self) -> BodyKey {
        self.body
    }

    fn body2(&self) -> Option<BodyKey> {
        None
    }

    fn collision_allowed(&self) -> bool {
        true
    }

    fn initialize(&mut self, bodies: &mut SlotMap<BodyKey, Body>, _settings: &Settings, dt: f64) {
        let body = bodies.get_mut(self.body).expect("joint body not found");

        let mass = body.mass().map_or(0.0, |mass| mass.value());

        // Soft constraint coefficients from frequency and damping
        let omega = std::f64::consts::TAU * self.frequency;
        let d = 2.0 * mass * self.damping_ratio * omega;
        let k = mass * omega * omega;

        self.gamma = dt * (d + dt * k);
        self.gamma = if self.gamma > 0.0 {
            self.gamma.recip()
        } else {
            0.0
        };

        self.r = body.world_point(self.local_anchor) - body.world_center();
        let c = body.world_center() + self.r - self.target;
        self.bias = c * dt * k * self.gamma;

        let im = body.inv_mass();
        let ii = body.inv_inertia();
        self.k11 = im + ii * self.r.y * self.r.y + self.gamma;
        self.k12 = -ii * self.r.x * self.r.y;
        self.k22 = im + ii * self.r.x * self.r.x + self.gamma;

        // Warm start
        body.velocity += self.impulse * im;
        body.angular_velocity += ii * perp_dot(self.r, self.impulse);
    }

    fn solve_velocity(&mut self, bodies: &mut SlotMap<BodyKey, Body>, dt: f64) {
        let body = bodies.get_mut(self.body).expect("joint body not found");

        let cdot = body.velocity + cross_scalar(body.angular_velocity, self.r);
        let lambda = solve_2x2(
            self.k11,
            self.k12,
            self.k22,
            -(cdot + self.bias + self.impulse * self.gamma),
        );

        // The drag force budget keeps heavy bodies from snapping around
        let old = self.impulse;
        self.impulse += lambda;
        let max = self.max_force * dt;
        if self.impulse.magnitude() > max {
            self.impulse = self.impulse.normalized() * max;
        }
        let lambda = self.impulse - old;

        body.velocity += lambda * body.inv_mass();
        body.angular_velocity += body.inv_inertia() * perp_dot(self.r, lambda);
    }

    fn solve_position(&mut self, _bodies: &mut SlotMap<BodyKey, Body>, _settings: &Settings) -> bool {
        // The spring resolves position through velocity alone
        true
    }

    fn shift(&mut self, offset: Vec2<f64>) {
        self.target += offset;
    }
}
