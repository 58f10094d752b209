//! Per-slider kinematic state.

use pnp_core::Vec3;

/// Position (mm), velocity (mm/s) and acceleration (mm/s²) of one slider.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct KinematicState {
    pub position:     Vec3,
    pub velocity:     Vec3,
    pub acceleration: Vec3,
}

impl KinematicState {
    /// A slider standing still at `position`.
    #[inline]
    pub fn at_rest(position: Vec3) -> Self {
        Self { position, velocity: Vec3::ZERO, acceleration: Vec3::ZERO }
    }

    /// `true` when every velocity component is within `margin` of zero.
    #[inline]
    pub fn is_settled(&self, margin: f64) -> bool {
        self.velocity.max_abs() <= margin
    }
}
