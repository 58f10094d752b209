//! Per-axis kinematic limits.

use pnp_core::SliderParams;

use crate::{MotionError, MotionResult};

/// Velocity, acceleration and optional jerk bounds per world axis `[x, y, z]`.
///
/// Jerk is optional by presence: `None` means the oracle may switch
/// acceleration instantly.
#[derive(Clone, Debug, PartialEq)]
pub struct KinematicLimits {
    pub velocity:     [f64; 3],
    pub acceleration: [f64; 3],
    pub jerk:         Option<[f64; 3]>,
}

impl KinematicLimits {
    pub fn new(
        velocity:     [f64; 3],
        acceleration: [f64; 3],
        jerk:         Option<[f64; 3]>,
    ) -> MotionResult<Self> {
        for axis in 0..3 {
            check(axis, "velocity", velocity[axis])?;
            check(axis, "acceleration", acceleration[axis])?;
            if let Some(j) = jerk {
                check(axis, "jerk", j[axis])?;
            }
        }
        Ok(Self { velocity, acceleration, jerk })
    }

    /// Limits for a slider described by the parameter file.
    pub fn from_params(slider: &SliderParams) -> MotionResult<Self> {
        Self::new(
            slider.world_velocity(),
            slider.world_acceleration(),
            slider.world_jerk(),
        )
    }

    /// Acceleration to use in a trapezoidal profile on `axis`.
    ///
    /// With a jerk limit `j`, a full ramp to `v` under an S-curve takes
    /// `v/a + a/j` instead of `v/a`, so the trapezoid uses the constant
    /// acceleration that covers the same ramp in the same time:
    ///
    ///   a_eff = v / (v/a + a/j)        when v ≥ a²/j  (acceleration saturates)
    ///   a_eff = √(v·j) / 2             otherwise      (pure jerk ramp)
    pub fn effective_acceleration(&self, axis: usize) -> f64 {
        let v = self.velocity[axis];
        let a = self.acceleration[axis];
        match self.jerk {
            None => a,
            Some(j) => {
                let j = j[axis];
                if v >= a * a / j {
                    v / (v / a + a / j)
                } else {
                    (v * j).sqrt() / 2.0
                }
            }
        }
    }
}

fn check(axis: usize, quantity: &'static str, value: f64) -> MotionResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(MotionError::InvalidLimit { axis, quantity, value })
    }
}
