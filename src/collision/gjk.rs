//! GJK intersection and distance tests on the Minkowski difference.

use arrayvec::ArrayVec;
use vek::Vec2;

use crate::{geometry::Shape, math::Iso};

use super::Separation;

/// Iteration cap, disjoint or touching pairs converge well before this.
const MAX_ITERATIONS: u32 = 30;

/// Query distance under which two shapes count as touching.
const DISTANCE_EPSILON: f64 = 1e-10;

/// Up to three Minkowski difference support points enclosing the origin.
pub type Simplex = ArrayVec<Vec2<f64>, 3>;

/// Support point of the Minkowski difference of two shapes.
#[inline]
fn support(shape1: &Shape, iso1: Iso, shape2: &Shape, iso2: Iso, direction: Vec2<f64>) -> Vec2<f64> {
    shape1.farthest_point(direction, iso1) - shape2.farthest_point(-direction, iso2)
}

/// `(a × b) × c` expanded to 2D.
#[inline]
fn triple_product(a: Vec2<f64>, b: Vec2<f64>, c: Vec2<f64>) -> Vec2<f64> {
    b * c.dot(a) - a * c.dot(b)
}

/// Test two shapes for intersection.
///
/// Returns the enclosing simplex on overlap so the penetration can be
/// extracted from it, `None` when the shapes are disjoint. Degenerate
/// simplices count as touching.
pub fn intersect(shape1: &Shape, iso1: Iso, shape2: &Shape, iso2: Iso) -> Option<Simplex> {
    // Seed along the line between the centers
    let mut direction = iso2.translate(shape2.center()) - iso1.translate(shape1.center());
    if direction.magnitude_squared() <= f64::EPSILON {
        direction = Vec2::unit_x();
    }

    let mut simplex = Simplex::new();
    simplex.push(support(shape1, iso1, shape2, iso2, direction));
    direction = -simplex[0];

    for _ in 0..MAX_ITERATIONS {
        if direction.magnitude_squared() <= DISTANCE_EPSILON {
            // Origin sits on the simplex, treat as touching
            return Some(degenerate_simplex(simplex));
        }

        let point = support(shape1, iso1, shape2, iso2, direction);
        if point.dot(direction) < 0.0 {
            // The new support can't pass the origin, no overlap
            return None;
        }
        simplex.push(point);

        if evolve(&mut simplex, &mut direction) {
            return Some(simplex);
        }
    }

    None
}

/// Pad a degenerate simplex to three points so the expansion can start.
fn degenerate_simplex(mut simplex: Simplex) -> Simplex {
    while !simplex.is_full() {
        let last = *simplex.last().unwrap();
        simplex.push(last + Vec2::new(f64::EPSILON, f64::EPSILON));
    }

    simplex
}

/// One step of simplex evolution toward the origin.
///
/// Returns true when the simplex encloses the origin.
fn evolve(simplex: &mut Simplex, direction: &mut Vec2<f64>) -> bool {
    match simplex.len() {
        2 => {
            // Line segment, search perpendicular toward the origin
            let a = simplex[1];
            let b = simplex[0];
            let ab = b - a;
            let ao = -a;

            *direction = triple_product(ab, ao, ab);
            if direction.magnitude_squared() <= f64::EPSILON {
                // Origin on the segment
                *direction = Vec2::zero();
            }

            false
        }
        3 => {
            let a = simplex[2];
            let b = simplex[1];
            let c = simplex[0];
            let ab = b - a;
            let ac = c - a;
            let ao = -a;

            let ab_perp = triple_product(ac, ab, ab);
            let ac_perp = triple_product(ab, ac, ac);

            if ab_perp.dot(ao) > 0.0 {
                // Drop c, the origin lies beyond edge ab
                simplex.remove(0);
                *direction = ab_perp;

                false
            } else if ac_perp.dot(ao) > 0.0 {
                // Drop b
                simplex.remove(1);
                *direction = ac_perp;

                false
            } else {
                true
            }
        }
        _ => false,
    }
}

/// Closest point to the origin on a segment.
fn closest_on_segment(a: Vec2<f64>, b: Vec2<f64>) -> Vec2<f64> {
    let ab = b - a;
    let length_squared = ab.magnitude_squared();
    if length_squared <= f64::EPSILON {
        return a;
    }

    let t = (-a.dot(ab) / length_squared).clamp(0.0, 1.0);

    a + ab * t
}

/// Distance between two disjoint shapes.
///
/// Returns `None` when the shapes overlap or touch. Used by the
/// conservative advancement sweep, which only needs the scalar gap and
/// its direction.
pub fn distance(shape1: &Shape, iso1: Iso, shape2: &Shape, iso2: Iso) -> Option<Separation> {
    let mut direction = iso2.translate(shape2.center()) - iso1.translate(shape1.center());
    if direction.magnitude_squared() <= f64::EPSILON {
        direction = Vec2::unit_x();
    }

    let mut a = support(shape1, iso1, shape2, iso2, direction);
    let mut b = support(shape1, iso1, shape2, iso2, -direction);

    for _ in 0..MAX_ITERATIONS {
        let closest = closest_on_segment(a, b);
        let gap = closest.magnitude();
        if gap <= DISTANCE_EPSILON {
            return None;
        }

        direction = -closest / gap;

        let c = support(shape1, iso1, shape2, iso2, direction);
        let progress = c.dot(direction) - a.dot(direction).max(b.dot(direction));
        if progress <= 1e-9 {
            // Note the Minkowski direction points from 2 to 1
            return Some(Separation {
                normal: -direction,
                distance: gap,
            });
        }

        // Keep the endpoint closer to the origin
        if a.magnitude_squared() < b.magnitude_squared() {
            b = c;
        } else {
            a = c;
        }
    }

    Some(Separation {
        normal: -direction,
        distance: closest_on_segment(a, b).magnitude(),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use vek::Vec2;

    use crate::{
        geometry::{Circle, Polygon, Shape},
        math::Iso,
    };

    /// Distance must be symmetric in its arguments.
    #[test]
    fn test_distance_symmetric() {
        let a = Shape::Polygon(Polygon::rectangle(1.0, 1.0).unwrap());
        let b = Shape::Circle(Circle::new(0.5).unwrap());
        let iso_a = Iso::from_pos(Vec2::zero());
        let iso_b = Iso::from_pos(Vec2::new(3.0, 1.0));

        let ab = super::distance(&a, iso_a, &b, iso_b).unwrap();
        let ba = super::distance(&b, iso_b, &a, iso_a).unwrap();

        assert_relative_eq!(ab.distance, ba.distance, epsilon = 1e-6);
    }

    /// Known gap between two unit boxes.
    #[test]
    fn test_distance_boxes() {
        let a = Shape::Polygon(Polygon::rectangle(1.0, 1.0).unwrap());
        let b = Shape::Polygon(Polygon::rectangle(1.0, 1.0).unwrap());

        let separation = super::distance(
            &a,
            Iso::from_pos(Vec2::zero()),
            &b,
            Iso::from_pos(Vec2::new(3.0, 0.0)),
        )
        .unwrap();

        assert_relative_eq!(separation.distance, 2.0, epsilon = 1e-6);
        assert_relative_eq!(separation.normal.x, 1.0, epsilon = 1e-6);
    }

    /// Overlapping shapes must report no distance.
    #[test]
    fn test_distance_overlapping() {
        let a = Shape::Polygon(Polygon::rectangle(2.0, 2.0).unwrap());
        let b = Shape::Polygon(Polygon::rectangle(2.0, 2.0).unwrap());

        assert!(super::distance(
            &a,
            Iso::from_pos(Vec2::zero()),
            &b,
            Iso::from_pos(Vec2::new(0.5, 0.0)),
        )
        .is_none());

        assert!(super::intersect(
            &a,
            Iso::from_pos(Vec2::zero()),
            &b,
            Iso::from_pos(Vec2::new(0.5, 0.0)),
        )
        .is_some());
    }
}
