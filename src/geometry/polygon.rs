//! Convex polygon shape.

use vek::{Aabr, Vec2};

use crate::{
    error::{check_finite, Error, Result},
    math::{perp_dot, right, Iso},
};

use super::{
    feature::{EdgeFeature, Feature, VertexFeature},
    mass::Mass,
    Projection,
};

/// Convex polygon with counter-clockwise winding.
///
/// Winding is normalized at construction, so the outward edge normals can be
/// derived once and reused.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Vertices in counter-clockwise order, local space.
    vertices: Vec<Vec2<f64>>,
    /// Unit outward normal of the edge starting at each vertex.
    normals: Vec<Vec2<f64>>,
    /// Area centroid in local space.
    center: Vec2<f64>,
}

impl Polygon {
    /// Construct from a convex point set.
    ///
    /// The winding may be either direction, it is normalized to
    /// counter-clockwise. Degenerate input (fewer than three points,
    /// repeated or collinear vertices, concavity) is rejected.
    pub fn new(points: impl Into<Vec<Vec2<f64>>>) -> Result<Self> {
        let mut vertices: Vec<Vec2<f64>> = points.into();
        if vertices.len() < 3 {
            return Err(Error::DegeneratePolygon {
                reason: "fewer than three vertices",
            });
        }
        for vertex in &vertices {
            check_finite("vertex.x", vertex.x)?;
            check_finite("vertex.y", vertex.y)?;
        }

        let area = signed_area(&vertices);
        if area.abs() <= f64::EPSILON {
            return Err(Error::DegeneratePolygon { reason: "zero area" });
        }
        if area < 0.0 {
            vertices.reverse();
        }

        let count = vertices.len();
        let mut normals = Vec::with_capacity(count);
        for i in 0..count {
            let edge = vertices[(i + 1) % count] - vertices[i];
            let length = edge.magnitude();
            if length <= f64::EPSILON {
                return Err(Error::DegeneratePolygon {
                    reason: "repeated vertex",
                });
            }

            // Convexity: every corner must turn the same way
            let next = vertices[(i + 2) % count] - vertices[(i + 1) % count];
            if perp_dot(edge, next) <= 0.0 {
                return Err(Error::DegeneratePolygon {
                    reason: "collinear or concave corner",
                });
            }

            normals.push(right(edge / length));
        }

        let center = centroid(&vertices);

        Ok(Self {
            vertices,
            normals,
            center,
        })
    }

    /// Construct an axis-aligned rectangle centered at the local origin.
    pub fn rectangle(width: f64, height: f64) -> Result<Self> {
        check_finite("width", width)?;
        check_finite("height", height)?;
        if width <= 0.0 || height <= 0.0 {
            return Err(Error::DegeneratePolygon {
                reason: "rectangle sides must be positive",
            });
        }

        let hw = width * 0.5;
        let hh = height * 0.5;

        Self::new(vec![
            Vec2::new(-hw, -hh),
            Vec2::new(hw, -hh),
            Vec2::new(hw, hh),
            Vec2::new(-hw, hh),
        ])
    }

    /// Construct a triangle from three local points.
    pub fn triangle(a: Vec2<f64>, b: Vec2<f64>, c: Vec2<f64>) -> Result<Self> {
        Self::new(vec![a, b, c])
    }

    /// Construct a regular polygon inscribed in a circle.
    pub fn regular(count: usize, radius: f64) -> Result<Self> {
        check_finite("radius", radius)?;
        if count < 3 || radius <= 0.0 {
            return Err(Error::DegeneratePolygon {
                reason: "regular polygon needs three or more vertices and a positive radius",
            });
        }

        let vertices = (0..count)
            .map(|i| {
                let angle = std::f64::consts::TAU * i as f64 / count as f64;
                Vec2::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect::<Vec<_>>();

        Self::new(vertices)
    }

    /// Vertices in counter-clockwise order, local space.
    pub fn vertices(&self) -> &[Vec2<f64>] {
        &self.vertices
    }

    /// Unit outward normal of the edge starting at each vertex.
    pub fn normals(&self) -> &[Vec2<f64>] {
        &self.normals
    }

    /// Area centroid in local space.
    pub fn center(&self) -> Vec2<f64> {
        self.center
    }

    /// Vertices mapped to world space.
    pub fn world_vertices(&self, iso: Iso) -> Vec<Vec2<f64>> {
        self.vertices.iter().map(|v| iso.translate(*v)).collect()
    }

    /// Project onto a world axis.
    pub fn project(&self, axis: Vec2<f64>, iso: Iso) -> Projection {
        // Start with the first so we don't have to check for infinite
        let mut min = axis.dot(iso.translate(self.vertices[0]));
        let mut max = min;

        for vertex in self.vertices.iter().skip(1) {
            let d = axis.dot(iso.translate(*vertex));
            min = min.min(d);
            max = max.max(d);
        }

        Projection { min, max }
    }

    /// Index of the vertex farthest along a local direction.
    fn farthest_vertex_index(&self, local_direction: Vec2<f64>) -> usize {
        let mut best = 0;
        let mut best_dot = local_direction.dot(self.vertices[0]);

        for (i, vertex) in self.vertices.iter().enumerate().skip(1) {
            let d = local_direction.dot(*vertex);
            if d > best_dot {
                best_dot = d;
                best = i;
            }
        }

        best
    }

    /// World point farthest along a world direction.
    pub fn farthest_point(&self, direction: Vec2<f64>, iso: Iso) -> Vec2<f64> {
        let local = iso.inverse_rotate(direction);

        iso.translate(self.vertices[self.farthest_vertex_index(local)])
    }

    /// Farthest feature along a world direction.
    ///
    /// Always one of the two edges meeting at the farthest vertex, whichever
    /// outward normal points closest to the direction. The farthest vertex is
    /// carried along as the feature maximum.
    pub fn farthest_feature(&self, direction: Vec2<f64>, iso: Iso) -> Feature {
        let local = iso.inverse_rotate(direction);
        let count = self.vertices.len();

        let index = self.farthest_vertex_index(local);
        let prev_edge = (index + count - 1) % count;
        let next_edge = index;

        let max = VertexFeature::new(iso.translate(self.vertices[index]), index as u32);

        if local.dot(self.normals[prev_edge]) >= local.dot(self.normals[next_edge]) {
            // Edge leading into the farthest vertex, winding order kept
            let start = VertexFeature::new(
                iso.translate(self.vertices[prev_edge]),
                prev_edge as u32,
            );

            Feature::Edge(EdgeFeature::new(start, max, max, prev_edge as u32))
        } else {
            let end_index = (index + 1) % count;
            let end = VertexFeature::new(iso.translate(self.vertices[end_index]), end_index as u32);

            Feature::Edge(EdgeFeature::new(max, end, max, next_edge as u32))
        }
    }

    /// Local support point for the Minkowski difference.
    pub fn support(&self, direction: Vec2<f64>) -> Vec2<f64> {
        self.vertices[self.farthest_vertex_index(direction)]
    }

    /// Axis aligned bounding box in world space.
    pub fn aabr(&self, iso: Iso) -> Aabr<f64> {
        let first = iso.translate(self.vertices[0]);
        let mut aabr = Aabr {
            min: first,
            max: first,
        };

        for vertex in self.vertices.iter().skip(1) {
            aabr.expand_to_contain_point(iso.translate(*vertex));
        }

        aabr
    }

    /// Mass of a solid polygon of the given density.
    pub fn mass(&self, density: f64) -> Mass {
        let count = self.vertices.len();

        let mut area = 0.0;
        let mut inertia_origin = 0.0;
        for i in 0..count {
            let p1 = self.vertices[i];
            let p2 = self.vertices[(i + 1) % count];
            let cross = perp_dot(p1, p2);

            area += cross;
            inertia_origin += cross * (p1.dot(p1) + p1.dot(p2) + p2.dot(p2));
        }
        area *= 0.5;

        let mass = density * area;
        // Shift from the origin to the centroid
        let inertia = density * inertia_origin / 12.0 - mass * self.center.magnitude_squared();

        Mass::new(self.center, mass, inertia)
    }

    /// Greatest distance from a local point to any vertex.
    pub fn radius_from(&self, point: Vec2<f64>) -> f64 {
        self.vertices
            .iter()
            .map(|v| (*v - point).magnitude())
            .fold(0.0, f64::max)
    }
}

/// Twice the signed area, positive for counter-clockwise winding.
fn signed_area(vertices: &[Vec2<f64>]) -> f64 {
    let count = vertices.len();

    (0..count)
        .map(|i| perp_dot(vertices[i], vertices[(i + 1) % count]))
        .sum()
}

/// Area centroid of a simple polygon.
fn centroid(vertices: &[Vec2<f64>]) -> Vec2<f64> {
    let count = vertices.len();

    let mut area = 0.0;
    let mut center = Vec2::zero();
    for i in 0..count {
        let p1 = vertices[i];
        let p2 = vertices[(i + 1) % count];
        let cross = perp_dot(p1, p2);

        area += cross;
        center += (p1 + p2) * cross;
    }

    center / (3.0 * area)
}
