//! Expanding polytope algorithm, extracts penetration depth after GJK.

use vek::Vec2;

use crate::{geometry::Shape, math::Iso};

use super::{gjk::Simplex, Penetration};

/// Expansion cap, smooth shapes stop on the improvement threshold earlier.
const MAX_ITERATIONS: u32 = 64;

/// Improvement under which the polytope is considered converged.
const CONVERGENCE_EPSILON: f64 = 1e-9;

/// Expand the enclosing simplex until the nearest edge stops improving.
///
/// The returned normal points from the first shape into the second and the
/// depth is never negative.
pub fn penetration(
    simplex: &Simplex,
    shape1: &Shape,
    iso1: Iso,
    shape2: &Shape,
    iso2: Iso,
) -> Penetration {
    let mut polytope: Vec<Vec2<f64>> = simplex.iter().copied().collect();

    let mut best = closest_edge(&polytope);
    for _ in 0..MAX_ITERATIONS {
        let support =
            shape1.farthest_point(best.normal, iso1) - shape2.farthest_point(-best.normal, iso2);

        let improvement = support.dot(best.normal) - best.distance;
        if improvement < CONVERGENCE_EPSILON {
            break;
        }

        polytope.insert(best.index + 1, support);
        best = closest_edge(&polytope);
    }

    Penetration {
        normal: best.normal,
        depth: best.distance.max(0.0),
    }
}

/// Edge of the polytope nearest to the origin.
struct Edge {
    /// Index of the edge's first vertex.
    index: usize,
    /// Outward unit normal.
    normal: Vec2<f64>,
    /// Distance from the origin.
    distance: f64,
}

fn closest_edge(polytope: &[Vec2<f64>]) -> Edge {
    let count = polytope.len();

    let mut best = Edge {
        index: 0,
        normal: Vec2::unit_y(),
        distance: f64::MAX,
    };

    for i in 0..count {
        let a = polytope[i];
        let b = polytope[(i + 1) % count];
        let edge = b - a;

        // Component of `a` perpendicular to the edge, away from the origin
        let length_squared = edge.magnitude_squared();
        let mut normal = if length_squared > f64::EPSILON {
            a - edge * (a.dot(edge) / length_squared)
        } else {
            a
        };

        let distance = normal.magnitude();
        if distance <= f64::EPSILON {
            // Origin on this edge, the depth is zero along its perpendicular
            normal = crate::math::right(edge);
            let magnitude = normal.magnitude();
            if magnitude <= f64::EPSILON {
                continue;
            }

            return Edge {
                index: i,
                normal: normal / magnitude,
                distance: 0.0,
            };
        }

        if distance < best.distance {
            best = Edge {
                index: i,
                normal: normal / distance,
                distance,
            };
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use vek::Vec2;

    use crate::{
        collision::gjk,
        geometry::{Circle, Polygon, Shape},
        math::Iso,
    };

    /// Deep box overlap must resolve along the smallest axis.
    #[test]
    fn test_box_depth() {
        let a = Shape::Polygon(Polygon::rectangle(2.0, 2.0).unwrap());
        let b = Shape::Polygon(Polygon::rectangle(2.0, 2.0).unwrap());
        let iso_a = Iso::from_pos(Vec2::zero());
        let iso_b = Iso::from_pos(Vec2::new(0.0, 1.5));

        let simplex = gjk::intersect(&a, iso_a, &b, iso_b).unwrap();
        let penetration = super::penetration(&simplex, &a, iso_a, &b, iso_b);

        assert_relative_eq!(penetration.depth, 0.5, epsilon = 1e-6);
        assert_relative_eq!(penetration.normal.y, 1.0, epsilon = 1e-6);
    }

    /// Circle against a box face.
    #[test]
    fn test_circle_box() {
        let a = Shape::Circle(Circle::new(0.5).unwrap());
        let b = Shape::Polygon(Polygon::rectangle(2.0, 2.0).unwrap());
        let iso_a = Iso::from_pos(Vec2::new(0.0, 1.4));
        let iso_b = Iso::from_pos(Vec2::zero());

        let simplex = gjk::intersect(&a, iso_a, &b, iso_b).unwrap();
        let penetration = super::penetration(&simplex, &a, iso_a, &b, iso_b);

        assert_relative_eq!(penetration.depth, 0.1, epsilon = 1e-4);
        assert_relative_eq!(penetration.normal.y, -1.0, epsilon = 1e-4);
    }
}
