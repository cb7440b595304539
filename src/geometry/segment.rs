//! One-sided line segment shape, used for thin static geometry.

use vek::{Aabr, Vec2};

use crate::{
    error::{check_finite, Error, Result},
    math::{left, Iso},
};

use super::{
    feature::{EdgeFeature, Feature, VertexFeature},
    mass::Mass,
    Projection,
};

/// Line segment between two local points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// First endpoint in local space.
    pub p1: Vec2<f64>,
    /// Second endpoint in local space.
    pub p2: Vec2<f64>,
    /// Midpoint, used as the center of mass.
    center: Vec2<f64>,
    /// Distance between the endpoints.
    length: f64,
    /// Unit normal, counter-clockwise from the edge direction.
    normal: Vec2<f64>,
}

impl Segment {
    /// Construct from two distinct local points.
    pub fn new(p1: Vec2<f64>, p2: Vec2<f64>) -> Result<Self> {
        check_finite("p1.x", p1.x)?;
        check_finite("p1.y", p1.y)?;
        check_finite("p2.x", p2.x)?;
        check_finite("p2.y", p2.y)?;

        let edge = p2 - p1;
        let length = edge.magnitude();
        if length <= f64::EPSILON {
            return Err(Error::DegenerateSegment);
        }

        let center = (p1 + p2) * 0.5;
        let normal = left(edge / length);

        Ok(Self {
            p1,
            p2,
            center,
            length,
            normal,
        })
    }

    /// Distance between the endpoints.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Unit normal of the edge in local space.
    pub fn normal(&self) -> Vec2<f64> {
        self.normal
    }

    /// Midpoint in local space.
    pub fn center(&self) -> Vec2<f64> {
        self.center
    }

    /// Project onto a world axis.
    pub fn project(&self, axis: Vec2<f64>, iso: Iso) -> Projection {
        let d1 = axis.dot(iso.translate(self.p1));
        let d2 = axis.dot(iso.translate(self.p2));

        Projection {
            min: d1.min(d2),
            max: d1.max(d2),
        }
    }

    /// World point farthest along a world direction.
    pub fn farthest_point(&self, direction: Vec2<f64>, iso: Iso) -> Vec2<f64> {
        let w1 = iso.translate(self.p1);
        let w2 = iso.translate(self.p2);

        if direction.dot(w1) >= direction.dot(w2) {
            w1
        } else {
            w2
        }
    }

    /// Farthest feature along a world direction.
    ///
    /// The whole edge when the direction is close to perpendicular to the
    /// segment, otherwise the single farther endpoint.
    pub fn farthest_feature(&self, direction: Vec2<f64>, iso: Iso) -> Feature {
        let w1 = iso.translate(self.p1);
        let w2 = iso.translate(self.p2);
        let d1 = direction.dot(w1);
        let d2 = direction.dot(w2);

        if (d1 - d2).abs() < 1e-9 * self.length {
            let v1 = VertexFeature::new(w1, 0);
            let v2 = VertexFeature::new(w2, 1);
            let max = if d1 >= d2 { v1 } else { v2 };

            Feature::Edge(EdgeFeature::new(v1, v2, max, 0))
        } else if d1 > d2 {
            Feature::Vertex(VertexFeature::new(w1, 0))
        } else {
            Feature::Vertex(VertexFeature::new(w2, 1))
        }
    }

    /// Local support point for the Minkowski difference.
    pub fn support(&self, direction: Vec2<f64>) -> Vec2<f64> {
        if direction.dot(self.p1) >= direction.dot(self.p2) {
            self.p1
        } else {
            self.p2
        }
    }

    /// Axis aligned bounding box in world space.
    pub fn aabr(&self, iso: Iso) -> Aabr<f64> {
        let w1 = iso.translate(self.p1);
        let w2 = iso.translate(self.p2);

        Aabr {
            min: Vec2::new(w1.x.min(w2.x), w1.y.min(w2.y)),
            max: Vec2::new(w1.x.max(w2.x), w1.y.max(w2.y)),
        }
    }

    /// Mass of a thin rod of the given density.
    pub fn mass(&self, density: f64) -> Mass {
        let mass = density * self.length;
        let inertia = mass * self.length * self.length / 12.0;

        Mass::new(self.center, mass, inertia)
    }

    /// Greatest distance from a local point to either endpoint.
    pub fn radius_from(&self, point: Vec2<f64>) -> f64 {
        (self.p1 - point)
            .magnitude()
            .max((self.p2 - point).magnitude())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use vek::Vec2;

    use crate::{geometry::feature::Feature, math::Iso};

    use super::Segment;

    /// Coinciding endpoints must be rejected.
    #[test]
    fn test_degenerate() {
        let p = Vec2::new(1.0, 1.0);
        assert!(Segment::new(p, p).is_err());
    }

    /// Perpendicular query directions must return the whole edge.
    #[test]
    fn test_farthest_feature() {
        let segment = Segment::new(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0)).unwrap();

        match segment.farthest_feature(Vec2::unit_y(), Iso::identity()) {
            Feature::Edge(edge) => assert_relative_eq!(edge.vector().magnitude(), 2.0),
            Feature::Vertex(_) => panic!("expected the whole edge"),
        }

        match segment.farthest_feature(Vec2::unit_x(), Iso::identity()) {
            Feature::Vertex(vertex) => assert_relative_eq!(vertex.point.x, 1.0),
            Feature::Edge(_) => panic!("expected a single endpoint"),
        }
    }
}
