//! Errors raised synchronously at construction and mutation calls.
//!
//! Numerical trouble inside a step never surfaces here, it is reported
//! through the event handlers and the body state instead.

use miette::Diagnostic;
use thiserror::Error;

/// Input-domain and state-invariant violations.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// A scalar argument was NaN or infinite.
    #[error("parameter `{name}` is not a finite number")]
    NonFiniteParameter {
        /// Name of the offending argument.
        name: &'static str,
    },

    /// Fixture density must be positive.
    #[error("density must be > 0, got {density}")]
    NonPositiveDensity {
        /// The rejected value.
        density: f64,
    },

    /// A coefficient outside its valid interval.
    #[error("`{name}` must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        /// Name of the offending argument.
        name: &'static str,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
        /// The rejected value.
        value: f64,
    },

    /// Polygon construction needs at least three non-collinear vertices.
    #[error("degenerate polygon: {reason}")]
    DegeneratePolygon {
        /// What made the point set unusable.
        reason: &'static str,
    },

    /// Segment endpoints must be distinct.
    #[error("segment endpoints coincide")]
    DegenerateSegment,

    /// A joint axis with zero length cannot define a direction.
    #[error("joint axis has zero length")]
    ZeroLengthAxis,

    /// The body was never added or has been removed.
    #[error("body is not part of this world")]
    BodyNotInWorld,

    /// A joint can only bind bodies of the world it is added to.
    #[error("joint references a body outside this world")]
    JointBodyNotInWorld,

    /// A joint binding a body to itself constrains nothing.
    #[error("joint must connect two distinct bodies")]
    JointBodiesIdentical,

    /// Stepping requires every dynamic body to have a computed mass.
    #[error("body has no mass set; compute or assign one before stepping")]
    MassNotComputed,
}

/// Shorthand used by the fallible constructors.
pub type Result<T> = std::result::Result<T, Error>;

/// Reject NaN and infinities on a named scalar argument.
#[inline]
pub(crate) fn check_finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::NonFiniteParameter { name })
    }
}

/// Reject values outside a closed interval, NaN included.
#[inline]
pub(crate) fn check_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(Error::OutOfRange {
            name,
            min,
            max,
            value,
        })
    }
}
