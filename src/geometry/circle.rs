//! Circle shape.

use vek::{Aabr, Vec2};

use crate::{
    error::{check_finite, Error, Result},
    math::Iso,
};

use super::{
    feature::{Feature, VertexFeature},
    mass::Mass,
    Projection,
};

/// Circle with a local center offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    /// Center in local shape space.
    pub center: Vec2<f64>,
    /// Radius, always positive.
    pub radius: f64,
}

impl Circle {
    /// Construct from a radius centered at the local origin.
    pub fn new(radius: f64) -> Result<Self> {
        Self::with_center(Vec2::zero(), radius)
    }

    /// Construct from a local center offset and a radius.
    pub fn with_center(center: Vec2<f64>, radius: f64) -> Result<Self> {
        check_finite("radius", radius)?;
        check_finite("center.x", center.x)?;
        check_finite("center.y", center.y)?;
        if radius <= 0.0 {
            return Err(Error::OutOfRange {
                name: "radius",
                min: f64::MIN_POSITIVE,
                max: f64::MAX,
                value: radius,
            });
        }

        Ok(Self { center, radius })
    }

    /// Project onto a world axis.
    pub fn project(&self, axis: Vec2<f64>, iso: Iso) -> Projection {
        let c = axis.dot(iso.translate(self.center));

        Projection {
            min: c - self.radius,
            max: c + self.radius,
        }
    }

    /// World point farthest along a world direction.
    pub fn farthest_point(&self, direction: Vec2<f64>, iso: Iso) -> Vec2<f64> {
        iso.translate(self.center) + direction.normalized() * self.radius
    }

    /// The support feature is always a lone vertex on the rim.
    pub fn farthest_feature(&self, direction: Vec2<f64>, iso: Iso) -> Feature {
        Feature::Vertex(VertexFeature::new(self.farthest_point(direction, iso), 0))
    }

    /// Local support point for the Minkowski difference.
    pub fn support(&self, direction: Vec2<f64>) -> Vec2<f64> {
        self.center + direction.normalized() * self.radius
    }

    /// Axis aligned bounding box in world space.
    pub fn aabr(&self, iso: Iso) -> Aabr<f64> {
        let center = iso.translate(self.center);
        let extent = Vec2::broadcast(self.radius);

        Aabr {
            min: center - extent,
            max: center + extent,
        }
    }

    /// Mass of a solid disc of the given density.
    pub fn mass(&self, density: f64) -> Mass {
        let mass = density * std::f64::consts::PI * self.radius * self.radius;
        let inertia = 0.5 * mass * self.radius * self.radius;

        Mass::new(self.center, mass, inertia)
    }

    /// Greatest distance from a local point to the shape's boundary.
    pub fn radius_from(&self, point: Vec2<f64>) -> f64 {
        (self.center - point).magnitude() + self.radius
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use vek::Vec2;

    use crate::math::Iso;

    use super::Circle;

    /// Non-positive and non-finite radii must be rejected.
    #[test]
    fn test_invalid_radius() {
        assert!(Circle::new(0.0).is_err());
        assert!(Circle::new(-1.0).is_err());
        assert!(Circle::new(f64::NAN).is_err());
    }

    /// The projection must be centered on the transformed center.
    #[test]
    fn test_project() {
        let circle = Circle::new(2.0).unwrap();
        let iso = Iso::from_pos(Vec2::new(3.0, 0.0));

        let projection = circle.project(Vec2::unit_x(), iso);
        assert_relative_eq!(projection.min, 1.0);
        assert_relative_eq!(projection.max, 5.0);
    }

    /// A solid disc of unit density and radius one.
    #[test]
    fn test_mass() {
        let circle = Circle::new(1.0).unwrap();
        let mass = circle.mass(1.0);

        assert_relative_eq!(mass.value(), std::f64::consts::PI);
        assert_relative_eq!(mass.inertia(), std::f64::consts::PI / 2.0);
    }
}
