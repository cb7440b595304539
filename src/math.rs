//! Scalar and transform math shared by every subsystem.
//!
//! All simulation arithmetic is `f64`.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use vek::Vec2;

/// Perpendicular dot product, the z component of the 3D cross product.
#[inline]
pub fn perp_dot(a: Vec2<f64>, b: Vec2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Cross product of a scalar (z axis) with a vector.
#[inline]
pub fn cross_scalar(s: f64, v: Vec2<f64>) -> Vec2<f64> {
    Vec2::new(-s * v.y, s * v.x)
}

/// Counter-clockwise perpendicular.
#[inline]
pub fn left(v: Vec2<f64>) -> Vec2<f64> {
    Vec2::new(-v.y, v.x)
}

/// Clockwise perpendicular.
#[inline]
pub fn right(v: Vec2<f64>) -> Vec2<f64> {
    Vec2::new(v.y, -v.x)
}

/// Shortest signed difference between two angles in radians.
#[inline]
pub fn angle_diff(a: f64, b: f64) -> f64 {
    let mut diff = a - b;
    while diff > std::f64::consts::PI {
        diff -= std::f64::consts::TAU;
    }
    while diff < -std::f64::consts::PI {
        diff += std::f64::consts::TAU;
    }
    diff
}

/// Position with a rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Iso {
    /// Position before being rotated.
    pub pos: Vec2<f64>,
    /// Rotation.
    pub rot: Rotation,
}

impl Iso {
    /// Construct from a position and a rotation.
    pub fn new<P, R>(pos: P, rot: R) -> Self
    where
        P: Into<Vec2<f64>>,
        R: Into<Rotation>,
    {
        let pos = pos.into();
        let rot = rot.into();

        Self { pos, rot }
    }

    /// Construct from a position with a rotation of zero.
    pub fn from_pos<P>(pos: P) -> Self
    where
        P: Into<Vec2<f64>>,
    {
        let pos = pos.into();
        let rot = Rotation::default();

        Self { pos, rot }
    }

    /// The identity transform.
    pub fn identity() -> Self {
        Self::from_pos(Vec2::zero())
    }

    /// Rotate a relative point and add the position.
    pub fn translate(&self, point: Vec2<f64>) -> Vec2<f64> {
        self.pos + self.rot.rotate(point)
    }

    /// Map a world point back into the local frame.
    pub fn inverse_translate(&self, point: Vec2<f64>) -> Vec2<f64> {
        self.rot.inverse_rotate(point - self.pos)
    }

    /// Rotate a direction without translating it.
    pub fn rotate(&self, dir: Vec2<f64>) -> Vec2<f64> {
        self.rot.rotate(dir)
    }

    /// Rotate a world direction back into the local frame.
    pub fn inverse_rotate(&self, dir: Vec2<f64>) -> Vec2<f64> {
        self.rot.inverse_rotate(dir)
    }

    /// Interpolate between this and another transform.
    ///
    /// Positions are interpolated linearly and the rotation over the
    /// shortest arc, which is what the time-of-impact sweep needs.
    pub fn lerp(&self, other: &Iso, t: f64) -> Self {
        let pos = self.pos + (other.pos - self.pos) * t;

        let a0 = self.rot.to_radians();
        let rot = Rotation::from_radians(a0 + angle_diff(other.rot.to_radians(), a0) * t);

        Self { pos, rot }
    }

    /// Whether any component is NaN or infinite.
    pub fn is_degenerate(&self) -> bool {
        !self.pos.x.is_finite()
            || !self.pos.y.is_finite()
            || !self.rot.cos().is_finite()
            || !self.rot.sin().is_finite()
    }
}

impl Default for Iso {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<(Vec2<f64>, Rotation)> for Iso {
    fn from((pos, rot): (Vec2<f64>, Rotation)) -> Self {
        Self { pos, rot }
    }
}

/// Rotation split into it's sine and cosine parts.
///
/// This allows something to rotate infinitely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    /// Cosine part of the rotation.
    cos: f64,
    /// Sine part of the rotation.
    sin: f64,
}

impl Rotation {
    /// Create from radians.
    pub fn from_radians(rotation: f64) -> Self {
        let (sin, cos) = rotation.sin_cos();

        Self { sin, cos }
    }

    /// Create from degrees.
    pub fn from_degrees(rotation: f64) -> Self {
        Self::from_radians(rotation.to_radians())
    }

    /// Create from a direction vector.
    ///
    /// Vector is assumed to be normalized.
    pub fn from_direction(dir: Vec2<f64>) -> Self {
        let cos = dir.x;
        let sin = dir.y;

        Self { sin, cos }
    }

    /// Convert to radians.
    pub fn to_radians(self) -> f64 {
        self.sin.atan2(self.cos)
    }

    /// Convert to degrees.
    pub fn to_degrees(self) -> f64 {
        self.to_radians().to_degrees()
    }

    /// Rotate a point.
    pub fn rotate(&self, point: Vec2<f64>) -> Vec2<f64> {
        Vec2::new(
            point.x * self.cos - point.y * self.sin,
            point.x * self.sin + point.y * self.cos,
        )
    }

    /// Rotate a point in the opposite direction.
    pub fn inverse_rotate(&self, point: Vec2<f64>) -> Vec2<f64> {
        Vec2::new(
            point.x * self.cos + point.y * self.sin,
            -point.x * self.sin + point.y * self.cos,
        )
    }

    /// Sine.
    pub fn sin(&self) -> f64 {
        self.sin
    }

    /// Cosine.
    pub fn cos(&self) -> f64 {
        self.cos
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self { cos: 1.0, sin: 0.0 }
    }
}

impl From<f64> for Rotation {
    fn from(value: f64) -> Self {
        Self::from_radians(value)
    }
}

impl AddAssign<f64> for Rotation {
    fn add_assign(&mut self, rhs: f64) {
        *self = *self + rhs;
    }
}

impl AddAssign<Self> for Rotation {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Add<f64> for Rotation {
    type Output = Self;

    fn add(self, rhs: f64) -> Self::Output {
        self + Self::from_radians(rhs)
    }
}

impl Add<Self> for Rotation {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            cos: self.cos * rhs.cos - self.sin * rhs.sin,
            sin: self.sin * rhs.cos + self.cos * rhs.sin,
        }
    }
}

impl SubAssign<Self> for Rotation {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl SubAssign<f64> for Rotation {
    fn sub_assign(&mut self, rhs: f64) {
        *self = *self - rhs;
    }
}

impl Sub<Self> for Rotation {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        self + -rhs
    }
}

impl Sub<f64> for Rotation {
    type Output = Self;

    fn sub(self, rhs: f64) -> Self::Output {
        self + Self::from_radians(-rhs)
    }
}

impl Neg for Rotation {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            cos: self.cos,
            sin: -self.sin,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use vek::Vec2;

    use super::{Iso, Rotation};

    /// Test different operations on rotations.
    #[test]
    fn test_ops() {
        let mut a = Rotation::from_degrees(90.0);
        let b = Rotation::from_degrees(45.0);

        assert_eq!((-a).to_degrees().round() as i16, -90);
        assert_eq!((a + b).to_degrees().round() as i16, 135);
        assert_eq!((a - b).to_degrees().round() as i16, 45);

        assert_eq!((a + 45f64.to_radians()).to_degrees().round() as i16, 135);
        assert_eq!((a + 180f64.to_radians()).to_degrees().round() as i16, -90);
        assert_eq!((a - 180f64.to_radians()).to_degrees().round() as i16, -90);
        assert_eq!((a - 90f64.to_radians()).to_degrees().round() as i16, 0);

        a -= 10f64.to_radians();
        assert_eq!(a.to_degrees().round() as i16, 80);
        a += 10f64.to_radians();
        assert_eq!(a.to_degrees().round() as i16, 90);
    }

    /// A point mapped to world space and back must be unchanged.
    #[test]
    fn test_translate_roundtrip() {
        let iso = Iso::new(Vec2::new(3.0, -2.0), 1.2);
        let point = Vec2::new(0.7, 0.3);

        let roundtrip = iso.inverse_translate(iso.translate(point));
        assert_relative_eq!(roundtrip.x, point.x, epsilon = 1e-12);
        assert_relative_eq!(roundtrip.y, point.y, epsilon = 1e-12);
    }

    /// Interpolation must take the shortest arc between two rotations.
    #[test]
    fn test_lerp_shortest_arc() {
        let a = Iso::new(Vec2::zero(), Rotation::from_degrees(170.0));
        let b = Iso::new(Vec2::zero(), Rotation::from_degrees(-170.0));

        let half = a.lerp(&b, 0.5);
        assert_relative_eq!(half.rot.to_degrees().abs(), 180.0, epsilon = 1e-9);
    }
}
