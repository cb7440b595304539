//! Joints constrain the relative motion of body pairs.
//!
//! Every joint caches its effective masses in `initialize`, applies warm
//! start impulses, then participates in the island's velocity and position
//! iterations next to the contact constraints.

pub mod angle;
pub mod distance;
pub mod friction;
pub mod mouse;
pub mod prismatic;
pub mod pulley;
pub mod revolute;
pub mod weld;

use slotmap::{new_key_type, SlotMap};
use vek::Vec2;

use crate::settings::Settings;

use super::body::{Body, BodyKey};

pub use self::{
    angle::AngleJoint, distance::DistanceJoint, friction::FrictionJoint, mouse::MouseJoint,
    prismatic::PrismaticJoint, pulley::PulleyJoint, revolute::RevoluteJoint, weld::WeldJoint,
};

new_key_type! {
    /// Stable handle of a joint inside a world.
    pub struct JointKey;
}

/// Constraint between two bodies, or one body and a world point.
pub trait Joint: std::fmt::Debug {
    /// First constrained body.
    fn body1(&self) -> BodyKey;

    /// Second constrained body, `None` for world-anchored joints.
    fn body2(&self) -> Option<BodyKey>;

    /// Whether the joined bodies may still collide with each other.
    fn collision_allowed(&self) -> bool {
        false
    }

    /// Cache effective masses and warm start with last step's impulses.
    fn initialize(&mut self, bodies: &mut SlotMap<BodyKey, Body>, settings: &Settings, dt: f64);

    /// One velocity iteration.
    fn solve_velocity(&mut self, bodies: &mut SlotMap<BodyKey, Body>, dt: f64);

    /// One position iteration, returns whether the error is inside tolerance.
    fn solve_position(&mut self, bodies: &mut SlotMap<BodyKey, Body>, settings: &Settings) -> bool;

    /// Translate any world-space anchors when the world origin shifts.
    fn shift(&mut self, offset: Vec2<f64>) {
        let _ = offset;
    }
}

/// A joint with its bookkeeping inside the world.
#[derive(Debug)]
pub struct JointEntry {
    /// The constraint itself.
    pub joint: Box<dyn Joint>,
    /// Scratch flag of the island traversal.
    pub(crate) on_island: bool,
    /// Free tag for the embedding application.
    pub user_data: u128,
}

impl JointEntry {
    /// Wrap a joint for world storage.
    pub fn new(joint: Box<dyn Joint>) -> Self {
        Self {
            joint,
            on_island: false,
            user_data: 0,
        }
    }
}

/// Which side of a limit range the constraint currently sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum LimitState {
    /// Between the limits, no impulse needed.
    #[default]
    Inactive,
    /// Pressing the lower limit.
    AtLower,
    /// Pressing the upper limit.
    AtUpper,
    /// Lower and upper coincide, behaves like a rigid lock.
    Equal,
}

impl LimitState {
    /// Classify a value against a limit range.
    pub(crate) fn classify(value: f64, lower: f64, upper: f64) -> Self {
        if (upper - lower).abs() < 2.0 * 1e-9 {
            Self::Equal
        } else if value <= lower {
            Self::AtLower
        } else if value >= upper {
            Self::AtUpper
        } else {
            Self::Inactive
        }
    }
}

/// Solve a symmetric 2x2 system `K x = b`.
///
/// Returns zero when the matrix is singular, which happens when both bodies
/// lock the constrained direction.
pub(crate) fn solve_2x2(k11: f64, k12: f64, k22: f64, b: Vec2<f64>) -> Vec2<f64> {
    let det = k11 * k22 - k12 * k12;
    if det.abs() <= f64::EPSILON {
        return Vec2::zero();
    }
    let inv_det = det.recip();

    Vec2::new(
        inv_det * (k22 * b.x - k12 * b.y),
        inv_det * (k11 * b.y - k12 * b.x),
    )
}

/// Fetch both bodies of a two-body joint mutably.
pub(crate) fn bodies_two_mut<'a>(
    bodies: &'a mut SlotMap<BodyKey, Body>,
    body1: BodyKey,
    body2: BodyKey,
) -> [&'a mut Body; 2] {
    bodies
        .get_disjoint_mut([body1, body2])
        .expect("joint bodies not found")
}

/// The 2x2 effective mass matrix of a point-to-point constraint.
///
/// Returned as `(k11, k12, k22)`, the matrix is symmetric.
pub(crate) fn point_mass_matrix(
    body1: &Body,
    body2: &Body,
    r1: Vec2<f64>,
    r2: Vec2<f64>,
) -> (f64, f64, f64) {
    let im = body1.inv_mass() + body2.inv_mass();
    let ii1 = body1.inv_inertia();
    let ii2 = body2.inv_inertia();

    let k11 = im + ii1 * r1.y * r1.y + ii2 * r2.y * r2.y;
    let k12 = -ii1 * r1.x * r1.y - ii2 * r2.x * r2.y;
    let k22 = im + ii1 * r1.x * r1.x + ii2 * r2.x * r2.x;

    (k11, k12, k22)
}
