//! Convex shapes and their mass properties.
//!
//! The capability set is closed: every shape can project itself on an axis,
//! answer support queries for the collision pipeline and compute its own
//! mass distribution.

pub mod circle;
pub mod feature;
pub mod mass;
pub mod polygon;
pub mod segment;

use vek::{Aabr, Vec2};

use crate::math::Iso;

pub use self::{
    circle::Circle,
    feature::{EdgeFeature, Feature, VertexFeature},
    mass::{Mass, MassKind},
    polygon::Polygon,
    segment::Segment,
};

/// A simple projection on an axis that can be used to check for overlaps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Minimum projected value.
    pub min: f64,
    /// Maximum projected value.
    pub max: f64,
}

impl Projection {
    /// Check if this is fully separated from another projection.
    pub fn separated(&self, other: Self) -> bool {
        other.max < self.min || self.max < other.min
    }

    /// Calculate the overlap.
    pub fn overlap(&self, other: Self) -> f64 {
        (self.max.min(other.max) - self.min.max(other.min)).max(0.0)
    }
}

/// Closed set of convex shape variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Solid disc.
    Circle(Circle),
    /// Convex polygon, counter-clockwise winding.
    Polygon(Polygon),
    /// Thin line segment.
    Segment(Segment),
}

impl Shape {
    /// Project onto a world axis.
    pub fn project(&self, axis: Vec2<f64>, iso: Iso) -> Projection {
        match self {
            Shape::Circle(circle) => circle.project(axis, iso),
            Shape::Polygon(polygon) => polygon.project(axis, iso),
            Shape::Segment(segment) => segment.project(axis, iso),
        }
    }

    /// World point farthest along a world direction.
    pub fn farthest_point(&self, direction: Vec2<f64>, iso: Iso) -> Vec2<f64> {
        match self {
            Shape::Circle(circle) => circle.farthest_point(direction, iso),
            Shape::Polygon(polygon) => polygon.farthest_point(direction, iso),
            Shape::Segment(segment) => segment.farthest_point(direction, iso),
        }
    }

    /// Farthest feature along a world direction.
    pub fn farthest_feature(&self, direction: Vec2<f64>, iso: Iso) -> Feature {
        match self {
            Shape::Circle(circle) => circle.farthest_feature(direction, iso),
            Shape::Polygon(polygon) => polygon.farthest_feature(direction, iso),
            Shape::Segment(segment) => segment.farthest_feature(direction, iso),
        }
    }

    /// Local support point for the Minkowski difference.
    pub fn support(&self, direction: Vec2<f64>) -> Vec2<f64> {
        match self {
            Shape::Circle(circle) => circle.support(direction),
            Shape::Polygon(polygon) => polygon.support(direction),
            Shape::Segment(segment) => segment.support(direction),
        }
    }

    /// Axis aligned bounding box in world space.
    pub fn aabr(&self, iso: Iso) -> Aabr<f64> {
        match self {
            Shape::Circle(circle) => circle.aabr(iso),
            Shape::Polygon(polygon) => polygon.aabr(iso),
            Shape::Segment(segment) => segment.aabr(iso),
        }
    }

    /// Mass of the shape at the given density.
    pub fn mass(&self, density: f64) -> Mass {
        match self {
            Shape::Circle(circle) => circle.mass(density),
            Shape::Polygon(polygon) => polygon.mass(density),
            Shape::Segment(segment) => segment.mass(density),
        }
    }

    /// Greatest distance from a local point to the shape's boundary.
    ///
    /// Drives the rotation disc radius of the owning body.
    pub fn radius_from(&self, point: Vec2<f64>) -> f64 {
        match self {
            Shape::Circle(circle) => circle.radius_from(point),
            Shape::Polygon(polygon) => polygon.radius_from(point),
            Shape::Segment(segment) => segment.radius_from(point),
        }
    }

    /// Geometric center in local space.
    pub fn center(&self) -> Vec2<f64> {
        match self {
            Shape::Circle(circle) => circle.center,
            Shape::Polygon(polygon) => polygon.center(),
            Shape::Segment(segment) => segment.center(),
        }
    }
}

impl From<Circle> for Shape {
    fn from(circle: Circle) -> Self {
        Shape::Circle(circle)
    }
}

impl From<Polygon> for Shape {
    fn from(polygon: Polygon) -> Self {
        Shape::Polygon(polygon)
    }
}

impl From<Segment> for Shape {
    fn from(segment: Segment) -> Self {
        Shape::Segment(segment)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use vek::Vec2;

    use crate::math::Iso;

    use super::{Polygon, Projection, Shape};

    /// Separated and overlapping projections on a shared axis.
    #[test]
    fn test_projection_overlap() {
        let shape = Shape::Polygon(Polygon::rectangle(2.0, 2.0).unwrap());

        let at_origin = shape.project(Vec2::unit_x(), Iso::identity());
        let shifted = shape.project(Vec2::unit_x(), Iso::from_pos(Vec2::new(1.5, 0.0)));
        let far = shape.project(Vec2::unit_x(), Iso::from_pos(Vec2::new(5.0, 0.0)));

        assert!(!at_origin.separated(shifted));
        assert_relative_eq!(at_origin.overlap(shifted), 0.5);
        assert!(at_origin.separated(far));
        assert_relative_eq!(at_origin.overlap(far), 0.0);
    }
}
