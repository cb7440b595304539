//! 2D impulse-based rigid body physics.
//!
//! A world of convex bodies advances in fixed time steps. Each step runs
//! broad-phase pruning over fixture bounding boxes, GJK/EPA narrow-phase
//! intersection, manifold clipping, and a warm-started sequential impulse
//! solver over islands of connected bodies, with optional continuous
//! collision detection for fast movers.
//!
//! ```
//! use rigid2d::prelude::*;
//! use vek::Vec2;
//!
//! let mut world = World::new(Settings::default());
//!
//! let mut floor = Body::new();
//! floor.add_fixture(Fixture::new(Polygon::rectangle(20.0, 1.0)?));
//! floor.set_mass(Mass::infinite(Vec2::zero()));
//! world.add_body(floor);
//!
//! let mut crate_body = Body::new();
//! crate_body.add_fixture(Fixture::new(Polygon::rectangle(1.0, 1.0)?));
//! crate_body.set_mass_from_fixtures();
//! crate_body.set_transform(Iso::from_pos(Vec2::new(0.0, 5.0)))?;
//! let crate_key = world.add_body(crate_body);
//!
//! for _ in 0..60 {
//!     world.step(1.0 / 60.0)?;
//! }
//! assert!(world.body(crate_key).unwrap().transform().pos.y < 5.0);
//! # Ok::<(), rigid2d::Error>(())
//! ```

pub mod collision;
pub mod dynamics;
pub mod error;
pub mod geometry;
pub mod math;
pub mod settings;
pub mod world;

pub use error::{Error, Result};

/// The types most embeddings need.
pub mod prelude {
    pub use crate::{
        collision::{Filter, Ray, RayHit},
        dynamics::{
            AngleJoint, Body, BodyKey, DistanceJoint, Fixture, FixtureId, FrictionJoint, Joint,
            JointKey, MouseJoint, PrismaticJoint, PulleyJoint, RevoluteJoint, WeldJoint,
        },
        error::Error,
        geometry::{Circle, Mass, MassKind, Polygon, Segment, Shape},
        math::{Iso, Rotation},
        settings::{ContinuousDetectionMode, Settings},
        world::{AxisAlignedBounds, ContactEvent, Handlers, StepEvent, World},
    };
}
