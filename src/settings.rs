//! Tunables for the simulation, held by the world.

use serde::Deserialize;

/// When continuous collision detection runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContinuousDetectionMode {
    /// Only bodies flagged as bullets are swept.
    #[default]
    Bullets,
    /// Every dynamic body is swept.
    All,
    /// No tunneling prevention at all.
    None,
}

/// Physics settings, all values use meters, kilograms, seconds and radians.
///
/// The defaults are tuned for stacks of meter-sized bodies at 60 Hz.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Fixed step frequency in Hz used by the accumulator update.
    pub step_frequency: f64,
    /// Upper bound on steps consumed by a single accumulator update.
    pub max_steps_per_update: u32,
    /// Iterations of the sequential impulse velocity solver.
    pub velocity_iterations: u32,
    /// Iterations of the split impulse position solver.
    pub position_iterations: u32,
    /// Position error feedback factor.
    pub baumgarte: f64,
    /// Penetration allowed before the position solver reacts.
    pub linear_slop: f64,
    /// Largest position correction applied in one iteration.
    pub max_correction: f64,
    /// Relative normal velocity under which restitution is ignored.
    pub restitution_threshold: f64,
    /// Linear speed under which a body counts as resting.
    pub sleep_linear_velocity: f64,
    /// Angular speed under which a body counts as resting.
    pub sleep_angular_velocity: f64,
    /// Seconds of rest before an island is put to sleep.
    pub sleep_time: f64,
    /// Largest rotation a body may take in a single step, radians.
    pub max_rotation: f64,
    /// Largest translation a body may take in a single step.
    pub max_translation: f64,
    /// Which bodies get a time-of-impact sweep.
    pub continuous_detection: ContinuousDetectionMode,
    /// Iteration cap of the conservative advancement search.
    pub max_toi_iterations: u32,
    /// Cap on continuous sub-steps per body per step.
    pub max_toi_substeps: u32,
}

impl Settings {
    /// Seconds of a single fixed step.
    pub fn step_dt(&self) -> f64 {
        1.0 / self.step_frequency
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            step_frequency: 60.0,
            max_steps_per_update: 5,
            velocity_iterations: 10,
            position_iterations: 5,
            baumgarte: 0.2,
            linear_slop: 0.005,
            max_correction: 0.2,
            restitution_threshold: 1.0,
            sleep_linear_velocity: 0.01,
            sleep_angular_velocity: 2f64.to_radians(),
            sleep_time: 0.5,
            max_rotation: 0.5 * std::f64::consts::PI,
            max_translation: 2.0,
            continuous_detection: ContinuousDetectionMode::Bullets,
            max_toi_iterations: 20,
            max_toi_substeps: 8,
        }
    }
}
