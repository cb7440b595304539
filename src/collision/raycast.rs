//! Ray casts against the shape variants.

use vek::Vec2;

use crate::{
    error::{check_finite, Error, Result},
    geometry::{Circle, Polygon, Segment, Shape},
    math::{perp_dot, Iso},
};

/// Ray with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point in world space.
    pub origin: Vec2<f64>,
    /// Unit direction.
    pub direction: Vec2<f64>,
}

impl Ray {
    /// Construct from an origin and a direction of any length.
    pub fn new(origin: Vec2<f64>, direction: Vec2<f64>) -> Result<Self> {
        check_finite("origin.x", origin.x)?;
        check_finite("origin.y", origin.y)?;
        check_finite("direction.x", direction.x)?;
        check_finite("direction.y", direction.y)?;

        let length = direction.magnitude();
        if length <= f64::EPSILON {
            return Err(Error::ZeroLengthAxis);
        }

        Ok(Self {
            origin,
            direction: direction / length,
        })
    }

    /// Point at a distance along the ray.
    pub fn at(&self, distance: f64) -> Vec2<f64> {
        self.origin + self.direction * distance
    }
}

/// A single ray intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Intersection point in world space.
    pub point: Vec2<f64>,
    /// Surface normal at the intersection, against the ray.
    pub normal: Vec2<f64>,
    /// Distance from the ray origin.
    pub distance: f64,
}

/// Cast a ray against a shape.
///
/// Rays starting inside a shape report no hit.
pub fn raycast(shape: &Shape, iso: Iso, ray: &Ray, max_distance: f64) -> Option<RayHit> {
    match shape {
        Shape::Circle(circle) => raycast_circle(circle, iso, ray, max_distance),
        Shape::Polygon(polygon) => raycast_polygon(polygon, iso, ray, max_distance),
        Shape::Segment(segment) => raycast_segment(segment, iso, ray, max_distance),
    }
}

fn raycast_circle(circle: &Circle, iso: Iso, ray: &Ray, max_distance: f64) -> Option<RayHit> {
    let center = iso.translate(circle.center);

    let m = ray.origin - center;
    let b = m.dot(ray.direction);
    let c = m.magnitude_squared() - circle.radius * circle.radius;

    // Starting inside counts as a miss
    if c < 0.0 {
        return None;
    }

    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let distance = -b - discriminant.sqrt();
    if distance < 0.0 || distance > max_distance {
        return None;
    }

    let point = ray.at(distance);

    Some(RayHit {
        point,
        normal: (point - center) / circle.radius,
        distance,
    })
}

fn raycast_polygon(polygon: &Polygon, iso: Iso, ray: &Ray, max_distance: f64) -> Option<RayHit> {
    // Work in the polygon's local frame
    let origin = iso.inverse_translate(ray.origin);
    let direction = iso.inverse_rotate(ray.direction);

    let vertices = polygon.vertices();
    let normals = polygon.normals();

    let mut enter = 0.0_f64;
    let mut exit = max_distance;
    let mut enter_normal = None;

    for (vertex, normal) in vertices.iter().zip(normals) {
        let denom = normal.dot(direction);
        let num = normal.dot(*vertex - origin);

        if denom.abs() <= f64::EPSILON {
            // Parallel to this edge, outside its half plane means a miss
            if num < 0.0 {
                return None;
            }
            continue;
        }

        let t = num / denom;
        if denom < 0.0 {
            // Entering through this edge
            if t > enter {
                enter = t;
                enter_normal = Some(*normal);
            }
        } else {
            exit = exit.min(t);
        }

        if enter > exit {
            return None;
        }
    }

    // No entering edge means the ray started inside
    let normal = enter_normal?;

    Some(RayHit {
        point: ray.at(enter),
        normal: iso.rotate(normal),
        distance: enter,
    })
}

fn raycast_segment(segment: &Segment, iso: Iso, ray: &Ray, max_distance: f64) -> Option<RayHit> {
    let p1 = iso.translate(segment.p1);
    let p2 = iso.translate(segment.p2);
    let edge = p2 - p1;

    let denom = perp_dot(ray.direction, edge);
    if denom.abs() <= f64::EPSILON {
        return None;
    }

    let to_start = p1 - ray.origin;
    let distance = perp_dot(to_start, edge) / denom;
    let along = perp_dot(to_start, ray.direction) / denom;

    if distance < 0.0 || distance > max_distance || !(0.0..=1.0).contains(&along) {
        return None;
    }

    // Face the normal against the ray
    let mut normal = iso.rotate(segment.normal());
    if normal.dot(ray.direction) > 0.0 {
        normal = -normal;
    }

    Some(RayHit {
        point: ray.at(distance),
        normal,
        distance,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use vek::Vec2;

    use crate::{
        geometry::{Circle, Polygon, Segment, Shape},
        math::Iso,
    };

    use super::{raycast, Ray};

    /// Ray hitting a circle head-on.
    #[test]
    fn test_circle() {
        let shape = Shape::Circle(Circle::new(1.0).unwrap());
        let ray = Ray::new(Vec2::new(-5.0, 0.0), Vec2::unit_x()).unwrap();

        let hit = raycast(&shape, Iso::identity(), &ray, 100.0).unwrap();
        assert_relative_eq!(hit.distance, 4.0, epsilon = 1e-12);
        assert_relative_eq!(hit.normal.x, -1.0, epsilon = 1e-12);

        // Starting inside must miss
        let inside = Ray::new(Vec2::zero(), Vec2::unit_x()).unwrap();
        assert!(raycast(&shape, Iso::identity(), &inside, 100.0).is_none());
    }

    /// Ray hitting a box face.
    #[test]
    fn test_polygon() {
        let shape = Shape::Polygon(Polygon::rectangle(2.0, 2.0).unwrap());
        let ray = Ray::new(Vec2::new(0.0, 5.0), -Vec2::unit_y()).unwrap();

        let hit = raycast(&shape, Iso::identity(), &ray, 100.0).unwrap();
        assert_relative_eq!(hit.distance, 4.0, epsilon = 1e-12);
        assert_relative_eq!(hit.normal.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(hit.point.y, 1.0, epsilon = 1e-12);
    }

    /// Range and miss cases.
    #[test]
    fn test_segment() {
        let shape = Shape::Segment(
            Segment::new(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0)).unwrap(),
        );
        let ray = Ray::new(Vec2::new(0.0, 2.0), -Vec2::unit_y()).unwrap();

        let hit = raycast(&shape, Iso::identity(), &ray, 100.0).unwrap();
        assert_relative_eq!(hit.distance, 2.0, epsilon = 1e-12);
        assert!(hit.normal.y > 0.0);

        // Too short
        assert!(raycast(&shape, Iso::identity(), &ray, 1.5).is_none());
        // Beside the segment
        let miss = Ray::new(Vec2::new(3.0, 2.0), -Vec2::unit_y()).unwrap();
        assert!(raycast(&shape, Iso::identity(), &miss, 100.0).is_none());
    }
}
