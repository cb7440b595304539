//! Bodies, constraints and the machinery that resolves them.

pub mod body;
pub mod ccd;
pub mod contact;
pub mod fixture;
pub(crate) mod island;
pub mod joint;
pub(crate) mod solver;

pub use self::{
    body::{Body, BodyKey},
    contact::{Contact, ContactManager, ContactPair, ContactPoint},
    fixture::{Fixture, FixtureId},
    joint::{
        AngleJoint, DistanceJoint, FrictionJoint, Joint, JointEntry, JointKey, MouseJoint,
        PrismaticJoint, PulleyJoint, RevoluteJoint, WeldJoint,
    },
};
