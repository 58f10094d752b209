//! The trajectory oracle seam.

use pnp_core::Vec3;

use crate::profile::AxisProfile;
use crate::{KinematicLimits, KinematicState, TrapezoidPlan};

// ── Traits ────────────────────────────────────────────────────────────────────

/// A planned motion that can be sampled at any offset from its start.
pub trait Trajectory {
    /// Seconds until the slider is at rest on the target.
    fn duration(&self) -> f64;

    /// Predicted state `t` seconds after the plan's start.  Offsets past
    /// `duration()` return the target at rest.
    fn sample_at(&self, t: f64) -> KinematicState;
}

/// Minimum-time motion planner for one class of slider.
///
/// Implementations must be deterministic and must not keep per-query state:
/// the same `(state, target)` always yields the same plan.  `Send + Sync`
/// lets the simulation share one oracle across worker threads.
pub trait TrajectoryOracle: Send + Sync {
    type Plan: Trajectory;

    fn limits(&self) -> &KinematicLimits;

    /// Plan the fastest feasible motion from `from` to rest at `target`.
    fn plan(&self, from: &KinematicState, target: Vec3) -> Self::Plan;

    /// One discrete-time update: the planned state `dt` seconds from now.
    fn step(&self, from: &KinematicState, target: Vec3, dt: f64) -> KinematicState {
        self.plan(from, target).sample_at(dt)
    }

    /// Seconds needed to reach `target` from `from`.
    fn travel_time(&self, from: &KinematicState, target: Vec3) -> f64 {
        self.plan(from, target).duration()
    }
}

// ── TrapezoidalOracle ─────────────────────────────────────────────────────────

/// Per-axis time-optimal trapezoidal planner.
///
/// A jerk limit, when present, is folded into a derated acceleration (see
/// [`KinematicLimits::effective_acceleration`]) so ramp durations match the
/// jerk-limited motion while the profile stays piecewise-quadratic.
#[derive(Clone, Debug)]
pub struct TrapezoidalOracle {
    limits: KinematicLimits,
    accel:  [f64; 3],
}

impl TrapezoidalOracle {
    pub fn new(limits: KinematicLimits) -> Self {
        let accel = [0, 1, 2].map(|axis| limits.effective_acceleration(axis));
        Self { limits, accel }
    }
}

impl Trajectory for TrapezoidPlan {
    #[inline]
    fn duration(&self) -> f64 {
        TrapezoidPlan::duration(self)
    }

    #[inline]
    fn sample_at(&self, t: f64) -> KinematicState {
        self.sample(t)
    }
}

impl TrajectoryOracle for TrapezoidalOracle {
    type Plan = TrapezoidPlan;

    fn limits(&self) -> &KinematicLimits {
        &self.limits
    }

    fn plan(&self, from: &KinematicState, target: Vec3) -> TrapezoidPlan {
        let p = from.position.to_array();
        let v = from.velocity.to_array();
        let t = target.to_array();
        TrapezoidPlan::new([0, 1, 2].map(|k| {
            AxisProfile::plan(p[k], v[k], t[k], self.limits.velocity[k], self.accel[k])
        }))
    }
}
