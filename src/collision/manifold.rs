//! Contact manifold generation by reference edge clipping.

use arrayvec::ArrayVec;
use vek::Vec2;

use crate::{
    geometry::{Feature, Shape},
    math::{left, Iso},
};

use super::Penetration;

/// Stable identity of a manifold point across steps.
///
/// Matching ids let the solver inherit accumulated impulses from the
/// previous step. The clip variant packs the originating features the same
/// way each step as long as neither body jumps feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifoldPointId {
    /// Single point produced without clipping, vertex and circle cases.
    Distance,
    /// Point surviving the clipping pipeline.
    Clip {
        /// Edge index on the reference shape.
        reference_edge: u32,
        /// Edge index on the incident shape.
        incident_edge: u32,
        /// Incident vertex the point originates from.
        index: u32,
        /// Whether reference and incident roles were swapped.
        flipped: bool,
    },
}

/// One contact point of a manifold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManifoldPoint {
    /// Contact point in world space.
    pub point: Vec2<f64>,
    /// Penetration depth at this point.
    pub depth: f64,
    /// Identity for warm-start matching.
    pub id: ManifoldPointId,
}

/// One or two contact points sharing a normal.
///
/// The normal points from the second shape toward the first, the direction
/// the first body must be pushed to separate.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifold {
    /// The contact points.
    pub points: ArrayVec<ManifoldPoint, 2>,
    /// Shared unit normal in world space.
    pub normal: Vec2<f64>,
}

/// Point being clipped, tracking the incident vertex it came from.
#[derive(Debug, Clone, Copy)]
struct ClipPoint {
    point: Vec2<f64>,
    index: u32,
}

/// Turn a penetration into a contact manifold.
///
/// Returns `None` when clipping degenerates, the caller treats the pair as
/// non-colliding for the step.
pub fn solve(
    penetration: &Penetration,
    shape1: &Shape,
    iso1: Iso,
    shape2: &Shape,
    iso2: Iso,
) -> Option<Manifold> {
    let normal = penetration.normal;

    let feature1 = shape1.farthest_feature(normal, iso1);
    let feature2 = shape2.farthest_feature(-normal, iso2);

    // Vertex features short-circuit to a single point
    let (edge1, edge2) = match (&feature1, &feature2) {
        (Feature::Vertex(vertex), _) | (_, Feature::Vertex(vertex)) => {
            let mut points = ArrayVec::new();
            points.push(ManifoldPoint {
                point: vertex.point,
                depth: penetration.depth,
                id: ManifoldPointId::Distance,
            });

            return Some(Manifold {
                points,
                normal: -normal,
            });
        }
        (Feature::Edge(edge1), Feature::Edge(edge2)) => (*edge1, *edge2),
    };

    // The edge more perpendicular to the normal becomes the reference
    let dot1 = edge1.vector().normalized().dot(normal).abs();
    let dot2 = edge2.vector().normalized().dot(normal).abs();
    let flipped = dot1 > dot2;
    let (reference, incident, toward_incident) = if flipped {
        (edge2, edge1, -normal)
    } else {
        (edge1, edge2, normal)
    };

    let edge = reference.vector();
    let length = edge.magnitude();
    if length <= f64::EPSILON {
        return None;
    }
    let edge = edge / length;

    // Clip the incident edge between the reference endpoints
    let incident_points = [
        ClipPoint {
            point: incident.v1.point,
            index: incident.v1.index,
        },
        ClipPoint {
            point: incident.v2.point,
            index: incident.v2.index,
        },
    ];
    let clipped = clip(&incident_points, -edge, -edge.dot(reference.v1.point))?;
    let clipped = clip(&clipped, edge, edge.dot(reference.v2.point))?;

    // Front normal pointing into the reference shape
    let mut front = left(edge);
    if front.dot(toward_incident) > 0.0 {
        front = -front;
    }
    let offset = front.dot(reference.max.point);

    let mut points = ArrayVec::new();
    for clip_point in &clipped {
        let depth = front.dot(clip_point.point) - offset;
        if depth >= 0.0 {
            points.push(ManifoldPoint {
                point: clip_point.point,
                depth,
                id: ManifoldPointId::Clip {
                    reference_edge: reference.index,
                    incident_edge: incident.index,
                    index: clip_point.index,
                    flipped,
                },
            });
        }
    }

    if points.is_empty() {
        return None;
    }

    Some(Manifold {
        points,
        normal: -normal,
    })
}

/// Keep the part of a segment behind a plane, interpolating the crossing.
///
/// Fails when fewer than two points survive.
fn clip(
    points: &[ClipPoint; 2],
    normal: Vec2<f64>,
    offset: f64,
) -> Option<[ClipPoint; 2]> {
    let d0 = normal.dot(points[0].point) - offset;
    let d1 = normal.dot(points[1].point) - offset;

    let mut out: ArrayVec<ClipPoint, 2> = ArrayVec::new();
    if d0 <= 0.0 {
        out.push(points[0]);
    }
    if d1 <= 0.0 {
        out.push(points[1]);
    }

    // The segment crosses the plane, replace the clipped endpoint
    if d0 * d1 < 0.0 && !out.is_full() {
        let t = d0 / (d0 - d1);
        let point = points[0].point + (points[1].point - points[0].point) * t;
        // The interpolated point inherits the removed endpoint's index
        let index = if d0 > 0.0 {
            points[0].index
        } else {
            points[1].index
        };

        out.push(ClipPoint { point, index });
    }

    if out.is_full() {
        Some([out[0], out[1]])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use vek::Vec2;

    use crate::{
        collision::detect,
        geometry::{Circle, Polygon, Shape},
        math::Iso,
    };

    use super::{solve, ManifoldPointId};

    /// Box resting on a wider box must produce two points with distinct ids.
    #[test]
    fn test_two_point_manifold() {
        let floor = Shape::Polygon(Polygon::rectangle(20.0, 1.0).unwrap());
        let cube = Shape::Polygon(Polygon::rectangle(1.0, 1.0).unwrap());
        let floor_iso = Iso::from_pos(Vec2::zero());
        let cube_iso = Iso::from_pos(Vec2::new(0.0, 0.99));

        let penetration = detect(&floor, floor_iso, &cube, cube_iso).unwrap();
        let manifold = solve(&penetration, &floor, floor_iso, &cube, cube_iso).unwrap();

        assert_eq!(manifold.points.len(), 2);
        assert_ne!(manifold.points[0].id, manifold.points[1].id);
        // Normal pushes the floor away from the cube, downward
        assert_relative_eq!(manifold.normal.y, -1.0, epsilon = 1e-6);
        for point in &manifold.points {
            assert_relative_eq!(point.depth, 0.01, epsilon = 1e-6);
        }
    }

    /// Ids must be identical across two solves of the same configuration.
    #[test]
    fn test_id_stability() {
        let floor = Shape::Polygon(Polygon::rectangle(20.0, 1.0).unwrap());
        let cube = Shape::Polygon(Polygon::rectangle(1.0, 1.0).unwrap());
        let floor_iso = Iso::from_pos(Vec2::zero());

        let first_iso = Iso::from_pos(Vec2::new(0.0, 0.99));
        let second_iso = Iso::from_pos(Vec2::new(0.002, 0.991));

        let penetration = detect(&floor, floor_iso, &cube, first_iso).unwrap();
        let first = solve(&penetration, &floor, floor_iso, &cube, first_iso).unwrap();

        let penetration = detect(&floor, floor_iso, &cube, second_iso).unwrap();
        let second = solve(&penetration, &floor, floor_iso, &cube, second_iso).unwrap();

        for (a, b) in first.points.iter().zip(second.points.iter()) {
            assert_eq!(a.id, b.id);
        }
    }

    /// A circle against a face is a single direct point.
    #[test]
    fn test_circle_single_point() {
        let floor = Shape::Polygon(Polygon::rectangle(20.0, 1.0).unwrap());
        let ball = Shape::Circle(Circle::new(0.5).unwrap());
        let floor_iso = Iso::from_pos(Vec2::zero());
        let ball_iso = Iso::from_pos(Vec2::new(0.0, 0.95));

        let penetration = detect(&floor, floor_iso, &ball, ball_iso).unwrap();
        let manifold = solve(&penetration, &floor, floor_iso, &ball, ball_iso).unwrap();

        assert_eq!(manifold.points.len(), 1);
        assert_eq!(manifold.points[0].id, ManifoldPointId::Distance);
    }
}
