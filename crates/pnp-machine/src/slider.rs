//! One slider: a 3-axis carriage on a rail with an arm reaching along x.

use pnp_conveyor::TargetRef;
use pnp_core::{RailId, SchedulingPolicy, SliderId, Tick, Vec2, Vec3};
use pnp_motion::{KinematicState, TrajectoryOracle};

use crate::{SliderStatus, Task};

#[derive(Clone, Debug, PartialEq)]
pub struct Slider {
    pub id:         SliderId,
    pub rail:       RailId,
    /// 0 or 1 within the rail; slider 0 sits at the lower y.
    pub index:      usize,
    pub state:      KinematicState,
    /// Where the slider is heading; the meeting point while tracking.
    pub target:     Vec3,
    /// Reachable envelope, inclusive on every axis.
    pub min:        Vec3,
    pub max:        Vec3,
    pub tracked:    Option<TargetRef>,
    pub status:     SliderStatus,
    pub in_policy:  SchedulingPolicy,
    pub out_policy: SchedulingPolicy,
    /// Tick the current vertical dwell started.
    pub z_started:  Tick,
}

impl Slider {
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.state.position
    }

    /// Scheduling policy for `task`.
    #[inline]
    pub fn policy(&self, task: Task) -> SchedulingPolicy {
        match task {
            Task::Pick => self.in_policy,
            Task::Place => self.out_policy,
        }
    }

    /// Clamp a flow-axis coordinate into the arm's reach.
    #[inline]
    pub fn clamp_x(&self, x: f64) -> f64 {
        x.clamp(self.min.x, self.max.x)
    }

    /// Take `target` for `task`, heading for `meeting` with x clamped into
    /// the envelope.  The vertical target is left untouched.
    pub fn commit(&mut self, target: TargetRef, meeting: Vec2, task: Task) {
        self.target.x = self.clamp_x(meeting.x);
        self.target.y = meeting.y;
        self.tracked = Some(target);
        self.status = task.engaged_status();
    }

    /// Drop whatever is tracked and go idle.
    pub fn release(&mut self) {
        self.tracked = None;
        self.status = SliderStatus::Idle;
    }

    /// `true` when the slider sits within `margin` of `reference` on both
    /// plane axes and every velocity component is within `margin`.
    #[inline]
    pub fn is_at(&self, reference: Vec2, margin: f64) -> bool {
        self.state.position.xy().within(reference, margin) && self.state.is_settled(margin)
    }

    /// One discrete-time kinematic update toward the current target.
    pub fn step<O: TrajectoryOracle>(&mut self, oracle: &O, dt: f64) {
        self.state = oracle.step(&self.state, self.target, dt);
    }
}
