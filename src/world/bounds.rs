//! World bounds that deactivate escaping bodies.

use vek::{Aabr, Extent2, Vec2};

use crate::error::{check_finite, Error, Result};

/// Axis aligned rectangle bodies must stay inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisAlignedBounds {
    aabr: Aabr<f64>,
}

impl AxisAlignedBounds {
    /// Bounds of the given size centered on the origin.
    pub fn new(size: Extent2<f64>) -> Result<Self> {
        check_finite("size.w", size.w)?;
        check_finite("size.h", size.h)?;
        if size.w <= 0.0 || size.h <= 0.0 {
            return Err(Error::OutOfRange {
                name: "size",
                min: f64::MIN_POSITIVE,
                max: f64::MAX,
                value: size.w.min(size.h),
            });
        }

        let half = Vec2::new(size.w, size.h) * 0.5;

        Ok(Self {
            aabr: Aabr {
                min: -half,
                max: half,
            },
        })
    }

    /// Bounds from an explicit rectangle.
    pub fn from_aabr(aabr: Aabr<f64>) -> Self {
        Self { aabr }
    }

    /// The bounding rectangle.
    pub fn aabr(&self) -> Aabr<f64> {
        self.aabr
    }

    /// Whether a bounding box has completely left the bounds.
    pub fn is_outside(&self, aabr: Aabr<f64>) -> bool {
        !self.aabr.collides_with_aabr(aabr)
    }

    /// Move the bounds, used when the world origin shifts.
    pub fn translate(&mut self, offset: Vec2<f64>) {
        self.aabr.min += offset;
        self.aabr.max += offset;
    }
}

#[cfg(test)]
mod tests {
    use vek::{Aabr, Extent2, Vec2};

    use super::AxisAlignedBounds;

    /// Overlap on the edge still counts as inside.
    #[test]
    fn test_outside() {
        let bounds = AxisAlignedBounds::new(Extent2::new(20.0, 20.0)).unwrap();

        let inside = Aabr {
            min: Vec2::new(9.0, 0.0),
            max: Vec2::new(11.0, 1.0),
        };
        assert!(!bounds.is_outside(inside));

        let outside = Aabr {
            min: Vec2::new(11.0, 0.0),
            max: Vec2::new(12.0, 1.0),
        };
        assert!(bounds.is_outside(outside));
    }
}
