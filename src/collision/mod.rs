//! Collision detection pipeline, from coarse pruning to contact manifolds.

pub mod broad_phase;
pub mod epa;
pub mod filter;
pub mod gjk;
pub mod manifold;
pub mod raycast;

use vek::Vec2;

use crate::{geometry::Shape, math::Iso};

pub use self::{
    broad_phase::BroadPhase,
    filter::Filter,
    manifold::{Manifold, ManifoldPoint, ManifoldPointId},
    raycast::{Ray, RayHit},
};

/// Result of a positive narrow-phase test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penetration {
    /// Unit normal pointing from the first shape to the second.
    pub normal: Vec2<f64>,
    /// Overlap along the normal, never negative.
    pub depth: f64,
}

/// Distance information for a separated pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Separation {
    /// Unit direction from the first shape to the second.
    pub normal: Vec2<f64>,
    /// Gap between the closest features.
    pub distance: f64,
}

/// Exact intersection test, producing the penetration when shapes overlap.
///
/// Circle pairs are solved in closed form, everything else goes through
/// GJK with EPA extracting the depth.
pub fn detect(shape1: &Shape, iso1: Iso, shape2: &Shape, iso2: Iso) -> Option<Penetration> {
    if let (Shape::Circle(a), Shape::Circle(b)) = (shape1, shape2) {
        return detect_circles(a, iso1, b, iso2);
    }

    let simplex = gjk::intersect(shape1, iso1, shape2, iso2)?;

    Some(epa::penetration(&simplex, shape1, iso1, shape2, iso2))
}

/// Closed form circle-circle overlap.
fn detect_circles(
    a: &crate::geometry::Circle,
    iso1: Iso,
    b: &crate::geometry::Circle,
    iso2: Iso,
) -> Option<Penetration> {
    let center1 = iso1.translate(a.center);
    let center2 = iso2.translate(b.center);

    let between = center2 - center1;
    let distance = between.magnitude();
    let depth = a.radius + b.radius - distance;
    if depth < 0.0 {
        return None;
    }

    // Concentric circles have no preferred direction
    let normal = if distance > f64::EPSILON {
        between / distance
    } else {
        Vec2::unit_y()
    };

    Some(Penetration { normal, depth })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use vek::Vec2;

    use crate::{
        geometry::{Circle, Polygon, Shape},
        math::Iso,
    };

    use super::detect;

    /// Overlapping circles must report the exact depth.
    #[test]
    fn test_circle_circle() {
        let a = Shape::Circle(Circle::new(1.0).unwrap());
        let b = Shape::Circle(Circle::new(1.0).unwrap());

        let penetration = detect(
            &a,
            Iso::from_pos(Vec2::zero()),
            &b,
            Iso::from_pos(Vec2::new(1.5, 0.0)),
        )
        .unwrap();

        assert_relative_eq!(penetration.depth, 0.5, epsilon = 1e-9);
        assert_relative_eq!(penetration.normal.x, 1.0, epsilon = 1e-9);

        assert!(detect(
            &a,
            Iso::from_pos(Vec2::zero()),
            &b,
            Iso::from_pos(Vec2::new(2.5, 0.0)),
        )
        .is_none());
    }

    /// Two overlapping unit boxes, offset along x.
    #[test]
    fn test_box_box() {
        let a = Shape::Polygon(Polygon::rectangle(1.0, 1.0).unwrap());
        let b = Shape::Polygon(Polygon::rectangle(1.0, 1.0).unwrap());

        let penetration = detect(
            &a,
            Iso::from_pos(Vec2::zero()),
            &b,
            Iso::from_pos(Vec2::new(0.9, 0.0)),
        )
        .unwrap();

        assert_relative_eq!(penetration.depth, 0.1, epsilon = 1e-6);
        assert_relative_eq!(penetration.normal.x, 1.0, epsilon = 1e-6);

        assert!(detect(
            &a,
            Iso::from_pos(Vec2::zero()),
            &b,
            Iso::from_pos(Vec2::new(2.0, 0.0)),
        )
        .is_none());
    }
}
