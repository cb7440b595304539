//! Event handlers, a single record of optional callbacks.
//!
//! Handlers receive event data by value reference only, so a callback can
//! never mutate the world mid-step. A panicking handler is caught and
//! logged, the step always finishes.

use arrayvec::ArrayVec;
use vek::Vec2;

use crate::dynamics::{body::BodyKey, fixture::FixtureId};

/// Where in the collision pipeline a candidate veto is offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionPhase {
    /// After the broad phase reported the pair.
    BroadPhase,
    /// After the narrow phase confirmed an overlap.
    NarrowPhase,
    /// After the manifold was generated.
    Manifold,
}

/// A fixture pair moving through the collision pipeline.
#[derive(Debug, Clone, Copy)]
pub struct CollisionCandidate {
    /// Pipeline position of the veto.
    pub phase: CollisionPhase,
    /// First fixture of the pair.
    pub fixture1: FixtureId,
    /// Second fixture of the pair.
    pub fixture2: FixtureId,
}

/// Contact data handed to begin, persist, end and pre-solve handlers.
#[derive(Debug, Clone)]
pub struct ContactEvent {
    /// First fixture of the pair.
    pub fixture1: FixtureId,
    /// Second fixture of the pair.
    pub fixture2: FixtureId,
    /// Contact normal, pointing from the second body toward the first.
    pub normal: Vec2<f64>,
    /// World point and depth per contact point.
    pub points: ArrayVec<(Vec2<f64>, f64), 2>,
    /// Whether a sensor fixture is involved.
    pub sensor: bool,
}

/// Contact data with the impulses the solver accumulated.
#[derive(Debug, Clone)]
pub struct SolvedContactEvent {
    /// First fixture of the pair.
    pub fixture1: FixtureId,
    /// Second fixture of the pair.
    pub fixture2: FixtureId,
    /// Contact normal, pointing from the second body toward the first.
    pub normal: Vec2<f64>,
    /// World point, normal impulse and tangent impulse per contact point.
    pub points: ArrayVec<(Vec2<f64>, f64, f64), 2>,
}

/// Step boundary data.
#[derive(Debug, Clone, Copy)]
pub struct StepEvent {
    /// Steps taken before this one.
    pub step: u64,
    /// Step duration in seconds.
    pub dt: f64,
}

/// Numerical trouble the step survived.
#[derive(Debug, Clone, Copy)]
pub enum NumericEvent {
    /// A body turned NaN and was made inactive.
    BodyPoisoned(BodyKey),
    /// A pair failed to produce a usable manifold this step.
    PairDegenerate(FixtureId, FixtureId),
}

/// A constraint destroyed as a side effect of removing a body.
#[derive(Debug, Clone, Copy)]
pub enum DestructionEvent {
    /// A contact was severed.
    Contact(FixtureId, FixtureId),
    /// A joint was severed.
    Joint(BodyKey),
}

/// The registered callbacks, all optional.
///
/// Register only the ones needed, the rest stay `None` and cost nothing.
#[derive(Default)]
pub struct Handlers {
    /// Before anything else in a step.
    pub pre_step: Option<Box<dyn FnMut(&StepEvent)>>,
    /// After everything else in a step.
    pub post_step: Option<Box<dyn FnMut(&StepEvent)>>,
    /// Veto points in the collision pipeline, return false to drop a pair.
    pub collision: Option<Box<dyn FnMut(&CollisionCandidate) -> bool>>,
    /// A pair started touching.
    pub contact_begin: Option<Box<dyn FnMut(&ContactEvent)>>,
    /// A pair kept touching.
    pub contact_persist: Option<Box<dyn FnMut(&ContactEvent)>>,
    /// A pair stopped touching.
    pub contact_end: Option<Box<dyn FnMut(&ContactEvent)>>,
    /// Before a contact enters the solver, return false to skip solving it.
    pub pre_solve: Option<Box<dyn FnMut(&ContactEvent) -> bool>>,
    /// After the solver, with accumulated impulses.
    pub post_solve: Option<Box<dyn FnMut(&SolvedContactEvent)>>,
    /// A body left the world bounds and was deactivated.
    pub bounds: Option<Box<dyn FnMut(&BodyKey)>>,
    /// Numerical problems that were contained.
    pub numeric: Option<Box<dyn FnMut(&NumericEvent)>>,
    /// Constraints severed by body removal.
    pub destruction: Option<Box<dyn FnMut(&DestructionEvent)>>,
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handlers").finish_non_exhaustive()
    }
}

/// Invoke a handler, containing any panic it raises.
pub(crate) fn emit<T>(handler: &mut Option<Box<dyn FnMut(&T)>>, event: &T) {
    if let Some(handler) = handler {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(event)));
        if result.is_err() {
            log::error!("event handler panicked, continuing the step");
        }
    }
}

/// Invoke a veto handler, a panic counts as approval.
pub(crate) fn emit_veto<T>(handler: &mut Option<Box<dyn FnMut(&T) -> bool>>, event: &T) -> bool {
    match handler {
        Some(handler) => {
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(event)))
                .unwrap_or_else(|_| {
                    log::error!("veto handler panicked, keeping the pair");
                    true
                })
        }
        None => true,
    }
}
