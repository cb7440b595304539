//! Mass, rotational inertia and their composition over fixtures.

use vek::Vec2;

/// How a mass responds to forces and torques.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MassKind {
    /// Both linear and angular motion.
    #[default]
    Normal,
    /// Immovable, the mass and inertia act as infinite.
    Infinite,
    /// Rotates but never translates.
    FixedLinear,
    /// Translates but never rotates.
    FixedAngular,
}

/// Mass distribution of a body, composed from its fixtures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mass {
    /// Local center of mass.
    center: Vec2<f64>,
    /// Mass in kg.
    mass: f64,
    /// Rotational inertia about the center in kg·m².
    inertia: f64,
    /// Cached inverse mass, zero when translation is locked.
    inv_mass: f64,
    /// Cached inverse inertia, zero when rotation is locked.
    inv_inertia: f64,
    /// Response kind.
    kind: MassKind,
}

impl Mass {
    /// Construct from explicit values.
    ///
    /// A zero mass or inertia locks the corresponding motion.
    pub fn new(center: Vec2<f64>, mass: f64, inertia: f64) -> Self {
        let kind = match (mass <= 0.0, inertia <= 0.0) {
            (true, true) => MassKind::Infinite,
            (true, false) => MassKind::FixedLinear,
            (false, true) => MassKind::FixedAngular,
            (false, false) => MassKind::Normal,
        };

        let inv_mass = if mass > 0.0 { mass.recip() } else { 0.0 };
        let inv_inertia = if inertia > 0.0 { inertia.recip() } else { 0.0 };

        Self {
            center,
            mass,
            inertia,
            inv_mass,
            inv_inertia,
            kind,
        }
    }

    /// An immovable mass centered at a local point.
    pub fn infinite(center: Vec2<f64>) -> Self {
        Self::new(center, 0.0, 0.0)
    }

    /// Compose fixture masses into a single body mass.
    ///
    /// The composite center is the mass-weighted centroid and the inertia
    /// follows the parallel axis theorem. Composing nothing yields an
    /// infinite mass at the origin.
    pub fn compose(masses: &[Mass]) -> Self {
        if masses.is_empty() {
            return Self::infinite(Vec2::zero());
        }
        if masses.len() == 1 {
            return masses[0];
        }

        let total: f64 = masses.iter().map(|m| m.mass).sum();
        if total <= 0.0 {
            return Self::infinite(Vec2::zero());
        }

        let center = masses
            .iter()
            .fold(Vec2::zero(), |acc, m| acc + m.center * m.mass)
            / total;

        // Shift every part inertia to the shared center
        let inertia = masses
            .iter()
            .map(|m| m.inertia + m.mass * (m.center - center).magnitude_squared())
            .sum();

        Self::new(center, total, inertia)
    }

    /// Re-type this mass, adjusting the cached inverses.
    pub fn with_kind(mut self, kind: MassKind) -> Self {
        self.kind = kind;
        self.inv_mass = match kind {
            MassKind::Normal | MassKind::FixedAngular if self.mass > 0.0 => self.mass.recip(),
            _ => 0.0,
        };
        self.inv_inertia = match kind {
            MassKind::Normal | MassKind::FixedLinear if self.inertia > 0.0 => self.inertia.recip(),
            _ => 0.0,
        };

        self
    }

    /// Local center of mass.
    pub fn center(&self) -> Vec2<f64> {
        self.center
    }

    /// Mass in kg, zero when infinite.
    pub fn value(&self) -> f64 {
        self.mass
    }

    /// Rotational inertia about the center.
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    /// Inverse mass, zero when translation is locked.
    pub fn inv_mass(&self) -> f64 {
        self.inv_mass
    }

    /// Inverse inertia, zero when rotation is locked.
    pub fn inv_inertia(&self) -> f64 {
        self.inv_inertia
    }

    /// Response kind.
    pub fn kind(&self) -> MassKind {
        self.kind
    }

    /// Whether the mass resists all motion.
    pub fn is_infinite(&self) -> bool {
        self.kind == MassKind::Infinite
    }
}

impl Default for Mass {
    fn default() -> Self {
        Self::infinite(Vec2::zero())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use vek::Vec2;

    use super::{Mass, MassKind};

    /// Two point-symmetric masses must compose to their midpoint.
    #[test]
    fn test_compose_symmetric() {
        let a = Mass::new(Vec2::new(-1.0, 0.0), 2.0, 0.5);
        let b = Mass::new(Vec2::new(1.0, 0.0), 2.0, 0.5);

        let composed = Mass::compose(&[a, b]);
        assert_relative_eq!(composed.center().x, 0.0);
        assert_relative_eq!(composed.value(), 4.0);
        // Parallel axis: 0.5 + 2*1 twice
        assert_relative_eq!(composed.inertia(), 5.0);
    }

    /// Composition order must not matter.
    #[test]
    fn test_compose_associative() {
        let a = Mass::new(Vec2::new(-1.0, 2.0), 1.0, 0.2);
        let b = Mass::new(Vec2::new(0.5, -1.0), 3.0, 0.7);
        let c = Mass::new(Vec2::new(2.0, 2.0), 0.5, 0.1);

        let left = Mass::compose(&[Mass::compose(&[a, b]), c]);
        let right = Mass::compose(&[a, Mass::compose(&[b, c])]);

        assert_relative_eq!(left.value(), right.value(), epsilon = 1e-12);
        assert_relative_eq!(left.inertia(), right.inertia(), epsilon = 1e-12);
        assert_relative_eq!(left.center().x, right.center().x, epsilon = 1e-12);
        assert_relative_eq!(left.center().y, right.center().y, epsilon = 1e-12);
    }

    /// Locking linear motion must zero only the inverse mass.
    #[test]
    fn test_kind_inverses() {
        let mass = Mass::new(Vec2::zero(), 2.0, 4.0);

        let fixed = mass.with_kind(MassKind::FixedLinear);
        assert_eq!(fixed.inv_mass(), 0.0);
        assert_relative_eq!(fixed.inv_inertia(), 0.25);

        let infinite = mass.with_kind(MassKind::Infinite);
        assert_eq!(infinite.inv_mass(), 0.0);
        assert_eq!(infinite.inv_inertia(), 0.0);
    }
}
