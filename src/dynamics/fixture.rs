//! Fixtures bind a shape to a body with its surface material.

use vek::Aabr;

use crate::{
    collision::Filter,
    error::{check_range, Error, Result},
    geometry::{Mass, Shape},
    math::Iso,
};

use super::body::BodyKey;

/// Identifies a fixture inside a world, body plus slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixtureId {
    /// Owning body.
    pub body: BodyKey,
    /// Index into the body's fixture list.
    pub index: u32,
}

/// A convex shape attached to a body.
#[derive(Debug, Clone)]
pub struct Fixture {
    /// The collision shape, in body-local space.
    shape: Shape,
    /// Density in kg/m², drives the mass computation.
    density: f64,
    /// Friction coefficient of the surface.
    friction: f64,
    /// Bounciness of the surface.
    restitution: f64,
    /// Sensors detect but never resolve.
    sensor: bool,
    /// Collision filter.
    filter: Filter,
    /// Free tag for the embedding application.
    pub user_data: u128,
}

impl Fixture {
    /// Construct from a shape with default material values.
    pub fn new(shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        let density = 1.0;
        let friction = 0.2;
        let restitution = 0.0;
        let sensor = false;
        let filter = Filter::default();

        Self {
            shape,
            density,
            friction,
            restitution,
            sensor,
            filter,
            user_data: 0,
        }
    }

    /// Replace the density, must be positive.
    pub fn with_density(mut self, density: f64) -> Result<Self> {
        if !density.is_finite() || density <= 0.0 {
            return Err(Error::NonPositiveDensity { density });
        }
        self.density = density;

        Ok(self)
    }

    /// Replace the friction coefficient, in `[0, 1]`.
    pub fn with_friction(mut self, friction: f64) -> Result<Self> {
        check_range("friction", friction, 0.0, 1.0)?;
        self.friction = friction;

        Ok(self)
    }

    /// Replace the restitution coefficient, in `[0, 1]`.
    pub fn with_restitution(mut self, restitution: f64) -> Result<Self> {
        check_range("restitution", restitution, 0.0, 1.0)?;
        self.restitution = restitution;

        Ok(self)
    }

    /// Turn the fixture into a sensor.
    pub fn with_sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;

        self
    }

    /// Replace the collision filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;

        self
    }

    /// The collision shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Density in kg/m².
    pub fn density(&self) -> f64 {
        self.density
    }

    /// Friction coefficient.
    pub fn friction(&self) -> f64 {
        self.friction
    }

    /// Restitution coefficient.
    pub fn restitution(&self) -> f64 {
        self.restitution
    }

    /// Whether the fixture only detects.
    pub fn is_sensor(&self) -> bool {
        self.sensor
    }

    /// Collision filter.
    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// Mass of the shape at the fixture's density.
    pub fn mass(&self) -> Mass {
        self.shape.mass(self.density)
    }

    /// World bounding box under a body transform.
    pub fn aabr(&self, transform: Iso) -> Aabr<f64> {
        self.shape.aabr(transform)
    }
}

/// Mix two friction coefficients, geometric mean.
pub fn mix_friction(a: f64, b: f64) -> f64 {
    (a * b).sqrt()
}

/// Mix two restitution coefficients, the bouncier one wins.
pub fn mix_restitution(a: f64, b: f64) -> f64 {
    a.max(b)
}

#[cfg(test)]
mod tests {
    use crate::geometry::Circle;

    use super::Fixture;

    /// Material setters must reject values outside their domain.
    #[test]
    fn test_material_domains() {
        let fixture = Fixture::new(Circle::new(1.0).unwrap());

        assert!(fixture.clone().with_density(0.0).is_err());
        assert!(fixture.clone().with_friction(1.5).is_err());
        assert!(fixture.clone().with_restitution(-0.1).is_err());
        assert!(fixture.clone().with_restitution(f64::NAN).is_err());
        assert!(fixture.with_density(2.0).is_ok());
    }
}
