//! Time-optimal trapezoidal velocity profiles.
//!
//! Each axis is planned independently from its current position and velocity
//! to rest at the target.  Working in the frame of the chosen travel
//! direction (`s` = signed distance along it, `v` = speed along it):
//!
//! | Phase  | Duration | Motion                                  |
//! |--------|----------|-----------------------------------------|
//! | ramp   | `t1`     | `v0 → vp` at ±a                         |
//! | cruise | `tc`     | constant `vp`                           |
//! | brake  | `t3`     | `vp → 0` at −a                          |
//!
//! The direction is the one the target lies in after a full stop from the
//! current velocity, so an axis overshooting its target first brakes through
//! zero and comes back.  `vp = min(vmax, √((2·a·d + v0²)/2))`.
//!
//! A multi-axis plan lasts as long as its slowest axis; faster axes reach
//! their target early and hold there.

use pnp_core::Vec3;

use crate::KinematicState;

// ── AxisProfile ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) struct AxisProfile {
    start:  f64,
    target: f64,
    /// `+1.0` or `-1.0`: world sign of the travel direction.
    dir:    f64,
    /// Initial speed along `dir` (may be negative when overshooting).
    v0:     f64,
    accel:  f64,
    vp:     f64,
    t1:     f64,
    tc:     f64,
    t3:     f64,
    s1:     f64,
    sc:     f64,
}

impl AxisProfile {
    pub(crate) fn plan(start: f64, velocity: f64, target: f64, vmax: f64, accel: f64) -> Self {
        let delta = target - start;
        let stopping = velocity * velocity.abs() / (2.0 * accel);
        let dir = if delta - stopping >= 0.0 { 1.0 } else { -1.0 };

        let d = delta * dir;
        let v0 = velocity * dir;
        let vp = ((2.0 * accel * d + v0 * v0) / 2.0).max(0.0).sqrt().min(vmax);

        let t1 = (vp - v0).abs() / accel;
        let s1 = (v0 + vp) / 2.0 * t1;
        let t3 = vp / accel;
        let s3 = vp * vp / (2.0 * accel);
        let sc = (d - s1 - s3).max(0.0);
        let tc = if vp > 0.0 { sc / vp } else { 0.0 };

        Self { start, target, dir, v0, accel, vp, t1, tc, t3, s1, sc }
    }

    #[inline]
    pub(crate) fn duration(&self) -> f64 {
        self.t1 + self.tc + self.t3
    }

    /// World `(position, velocity, acceleration)` at `t` seconds into the plan.
    pub(crate) fn sample(&self, t: f64) -> (f64, f64, f64) {
        if t >= self.duration() {
            return (self.target, 0.0, 0.0);
        }
        let (s, v, a) = if t <= 0.0 {
            (0.0, self.v0, 0.0)
        } else if t < self.t1 {
            let a = if self.vp >= self.v0 { self.accel } else { -self.accel };
            (self.v0 * t + 0.5 * a * t * t, self.v0 + a * t, a)
        } else if t < self.t1 + self.tc {
            (self.s1 + self.vp * (t - self.t1), self.vp, 0.0)
        } else {
            let tau = t - self.t1 - self.tc;
            (
                self.s1 + self.sc + self.vp * tau - 0.5 * self.accel * tau * tau,
                self.vp - self.accel * tau,
                -self.accel,
            )
        };
        (self.start + self.dir * s, self.dir * v, self.dir * a)
    }
}

// ── TrapezoidPlan ─────────────────────────────────────────────────────────────

/// A three-axis minimum-time plan produced by [`crate::TrapezoidalOracle`].
#[derive(Clone, Debug, PartialEq)]
pub struct TrapezoidPlan {
    axes:     [AxisProfile; 3],
    duration: f64,
}

impl TrapezoidPlan {
    pub(crate) fn new(axes: [AxisProfile; 3]) -> Self {
        let duration = axes.iter().map(AxisProfile::duration).fold(0.0, f64::max);
        Self { axes, duration }
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn sample(&self, t: f64) -> KinematicState {
        let [x, y, z] = self.axes.map(|axis| axis.sample(t));
        KinematicState {
            position:     Vec3::new(x.0, y.0, z.0),
            velocity:     Vec3::new(x.1, y.1, z.1),
            acceleration: Vec3::new(x.2, y.2, z.2),
        }
    }
}
