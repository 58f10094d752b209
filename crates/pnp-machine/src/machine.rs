//! The machine arena and the per-tick state cycles.
//!
//! # State-cycle table
//!
//! Applied to a slider that has reached its reference point (the tracked item
//! while engaged, its own target otherwise) and only while the rail is in a
//! busy phase:
//!
//! | slider \ rail | PICKING                  | PLACING                      |
//! |---------------|--------------------------|------------------------------|
//! | PICKING       | Z_MVMT, pick removed     | violation                    |
//! | PLACING       | violation                | Z_MVMT, slot DONE, counted   |
//! | Z_MVMT        | IDLE after the dwell     | IDLE after the dwell         |
//! | SKIPPED       | SKIPPED                  | IDLE                         |
//! | SKIP_N_WAIT   | SKIP_N_WAIT              | SKIP_N_WAIT                  |
//! | WAITING       | IDLE                     | IDLE                         |
//! | IDLE          | IDLE                     | IDLE                         |

use pnp_conveyor::{ConveyorLaneSet, TargetRef};
use pnp_core::time::ticks_for_secs;
use pnp_core::{BeamId, LaneId, MachineParams, RailId, RunStats, SliderId, Tick, Vec3};
use pnp_motion::{KinematicState, TrajectoryOracle};
use tracing::{debug, error, warn};

use crate::{
    Beam, InvariantViolation, MachineError, MachineResult, Rail, RailPhase, Slider,
    SliderStatus, Task,
};

/// Run switches that change how rails cycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleFlags {
    /// Pre-position both sliders at the start of every ready phase.
    pub pre_move:       bool,
    /// Let a rail forced to repeat its phase start bouncing.
    pub state_bouncing: bool,
}

pub struct Machine {
    beams:   Vec<Beam>,
    rails:   Vec<Rail>,
    sliders: Vec<Slider>,
    /// Minimum beam-axis separation of two sliders: width + safety margin.
    clearance:     f64,
    /// Half the pre-move spacing: width / 2 + safety margin.
    half_spacing:  f64,
    error_margin:  f64,
    z_move_ticks:  u64,
    in_centers:    Vec<f64>,
    out_centers:   Vec<f64>,
    in_flow_sign:  f64,
    out_flow_sign: f64,
}

impl Machine {
    /// Lay out every beam, rail and slider.
    ///
    /// Sliders start at rest, `railOffset` from the beam on their side and
    /// `initialSpacing` apart along y, with nothing tracked.
    pub fn from_params(params: &MachineParams) -> MachineResult<Self> {
        let policies = params.beam_policies()?;
        let s = &params.slider;
        let c = &params.conveyor;
        let b = &params.beam;

        let y_max = c
            .in_end_pos
            .iter()
            .zip(&c.in_width)
            .map(|(end, width)| end[1] + width)
            .fold(0.0, f64::max);

        let mut beams = Vec::with_capacity(b.nb_of_beams);
        let mut rails = Vec::with_capacity(params.rail_count());
        let mut sliders = Vec::with_capacity(params.slider_count());

        for (i, &(in_policy, out_policy)) in policies.iter().enumerate() {
            let beam_id = BeamId(i as u16);
            let beam_x = b.first_beam_pos + i as f64 * b.spacing;
            let mut rail_ids = [RailId::INVALID; 2];

            for (k, side) in [-1.0, 1.0].into_iter().enumerate() {
                let rail_id = RailId((2 * i + k) as u16);
                rail_ids[k] = rail_id;

                let near = beam_x + side * (b.width / 2.0 + s.reach_offset);
                let far = near + side * s.reach;
                let min = Vec3::new(near.min(far), 0.0, 0.0);
                let max = Vec3::new(near.max(far), y_max, s.depth);

                let mut slider_ids = [SliderId::INVALID; 2];
                for (j, slot) in slider_ids.iter_mut().enumerate() {
                    let id = SliderId((2 * rail_id.index() + j) as u16);
                    *slot = id;
                    let start = Vec3::new(
                        beam_x + side * s.rail_offset,
                        s.initial_spacing * j as f64 + c.x_offset,
                        0.0,
                    );
                    sliders.push(Slider {
                        id,
                        rail: rail_id,
                        index: j,
                        state: KinematicState::at_rest(start),
                        target: start,
                        min,
                        max,
                        tracked: None,
                        status: SliderStatus::Idle,
                        in_policy,
                        out_policy,
                        z_started: Tick::ZERO,
                    });
                }

                rails.push(Rail {
                    id: rail_id,
                    beam: beam_id,
                    side,
                    sliders: slider_ids,
                    phase: RailPhase::CanPick,
                    bouncing: None,
                    starved_passes: 0,
                });
            }

            beams.push(Beam {
                id:       beam_id,
                x:        beam_x,
                rails:    rail_ids,
                in_lane:  LaneId(b.workspace_side[i] as u16),
                out_lane: LaneId(params.out_lane_of_beam(i) as u16),
            });
        }

        debug!(beams = beams.len(), rails = rails.len(), sliders = sliders.len(), "machine built");
        Ok(Self {
            beams,
            rails,
            sliders,
            clearance:     s.width + s.safety_margin,
            half_spacing:  s.width / 2.0 + s.safety_margin,
            error_margin:  c.error_margin,
            z_move_ticks:  ticks_for_secs(s.z_move_time, params.time_step),
            in_centers:    c.in_end_pos.iter().map(|e| e[1]).collect(),
            out_centers:   c.out_end_pos.iter().map(|e| e[1]).collect(),
            in_flow_sign:  c.in_flow_sign(),
            out_flow_sign: c.out_flow_sign(),
        })
    }

    // ── Access ────────────────────────────────────────────────────────────

    pub fn beams(&self) -> &[Beam] {
        &self.beams
    }

    pub fn rails(&self) -> &[Rail] {
        &self.rails
    }

    pub fn sliders(&self) -> &[Slider] {
        &self.sliders
    }

    /// Every slider, for per-slider updates that may run in parallel.
    pub fn sliders_mut(&mut self) -> &mut [Slider] {
        &mut self.sliders
    }

    #[inline]
    pub fn beam(&self, id: BeamId) -> &Beam {
        &self.beams[id.index()]
    }

    #[inline]
    pub fn rail(&self, id: RailId) -> &Rail {
        &self.rails[id.index()]
    }

    #[inline]
    pub fn rail_mut(&mut self, id: RailId) -> &mut Rail {
        &mut self.rails[id.index()]
    }

    #[inline]
    pub fn slider(&self, id: SliderId) -> &Slider {
        &self.sliders[id.index()]
    }

    #[inline]
    pub fn slider_mut(&mut self, id: SliderId) -> &mut Slider {
        &mut self.sliders[id.index()]
    }

    /// Slider `index` (0 or 1) of `rail`.
    #[inline]
    pub fn rail_slider(&self, rail: RailId, index: usize) -> &Slider {
        self.slider(self.rail(rail).sliders[index])
    }

    #[inline]
    pub fn rail_slider_mut(&mut self, rail: RailId, index: usize) -> &mut Slider {
        let id = self.rail(rail).sliders[index];
        self.slider_mut(id)
    }

    /// Beam carrying `rail`.
    #[inline]
    pub fn beam_of(&self, rail: RailId) -> &Beam {
        self.beam(self.rail(rail).beam)
    }

    #[inline]
    pub fn clearance(&self) -> f64 {
        self.clearance
    }

    #[inline]
    pub fn error_margin(&self) -> f64 {
        self.error_margin
    }

    /// The slider tracking `target`, if any.
    pub fn tracker_of(&self, target: TargetRef) -> Option<SliderId> {
        self.sliders.iter().find(|s| s.tracked == Some(target)).map(|s| s.id)
    }

    /// `true` while any slider of the rail is travelling or in its dwell.
    pub fn is_rail_busy(&self, rail: RailId) -> bool {
        self.rail(rail).sliders.iter().any(|&s| self.slider(s).status.is_busy())
    }

    // ── Rail moves ────────────────────────────────────────────────────────

    /// Park slider `index` of `rail` one clearance beside its sibling's target
    /// (above it for slider 1, below it for slider 0), keeping its own x and z.
    pub fn park(&mut self, rail: RailId, index: usize) {
        let r = self.rail(rail);
        let me = r.sliders[index];
        let sibling_y = self.slider(r.sibling(index)).target.y;
        let sign = if index == 1 { 1.0 } else { -1.0 };
        let y = sibling_y + sign * self.clearance;

        let s = self.slider_mut(me);
        if !s.status.is_sidelined() {
            s.status = SliderStatus::SkipNWait;
        }
        s.target = Vec3::new(s.state.position.x, y, s.target.z);
        s.tracked = None;
        debug!(slider = %me, y, status = s.status.as_str(), "parked");
    }

    /// Flip `rail` to `next` and, if one slider is waiting, swap the waiting
    /// role so the loaded slider gets to act.
    pub fn bounce(&mut self, rail: RailId, next: RailPhase) {
        let [a, b] = self.rail(rail).sliders;
        self.rail_mut(rail).phase = next;
        let (sa, sb) = (self.slider(a).status, self.slider(b).status);
        if sa == SliderStatus::Waiting {
            self.slider_mut(a).status = SliderStatus::Idle;
            self.slider_mut(b).status = SliderStatus::Waiting;
        } else if sb == SliderStatus::Waiting {
            self.slider_mut(a).status = SliderStatus::Waiting;
            self.slider_mut(b).status = SliderStatus::Idle;
        }
        debug!(%rail, phase = next.as_str(), "bounced");
    }

    /// Send both sliders of `rail` to the upstream end of their envelope,
    /// straddling the centre of the lane `task` is served from.
    pub fn pre_move(&mut self, rail: RailId, task: Task) {
        let beam = self.beam_of(rail);
        let (center, sign) = match task {
            Task::Pick => (self.in_centers.get(beam.in_lane.index()), self.in_flow_sign),
            Task::Place => (self.out_centers.get(beam.out_lane.index()), self.out_flow_sign),
        };
        let Some(&center) = center else { return };
        let [a, b] = self.rail(rail).sliders;
        let first = self.slider(a);
        let x = if sign > 0.0 { first.min.x } else { first.max.x };
        let half = self.half_spacing;

        let lower = self.slider_mut(a);
        lower.target.x = x;
        lower.target.y = center - half;
        let upper = self.slider_mut(b);
        upper.target.x = x;
        upper.target.y = center + half;
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// One kinematic update of every slider.
    pub fn step_kinematics<O: TrajectoryOracle>(&mut self, oracle: &O, dt: f64) {
        for slider in &mut self.sliders {
            slider.step(oracle, dt);
        }
    }

    /// Fold this tick's speeds and accelerations into the per-slider peaks.
    pub fn record_peaks(&self, stats: &mut RunStats) {
        for (i, s) in self.sliders.iter().enumerate() {
            stats.peak_speed[i] = stats.peak_speed[i].max(s.state.velocity.norm());
            stats.peak_accel[i] = stats.peak_accel[i].max(s.state.acceleration.norm());
        }
    }

    /// Advance every slider through the state-cycle table, then every idle
    /// rail to its next phase.  Rails are visited in id order.
    pub fn advance_states(
        &mut self,
        now:   Tick,
        lanes: &mut ConveyorLaneSet,
        stats: &mut RunStats,
        flags: CycleFlags,
    ) -> MachineResult<()> {
        for r in 0..self.rails.len() {
            let rail = RailId(r as u16);
            let phase = self.rails[r].phase;
            for slider in self.rails[r].sliders {
                self.advance_slider(slider, phase, now, lanes, stats)?;
            }
            if !self.is_rail_busy(rail) {
                self.advance_rail(rail, flags);
            }
        }
        Ok(())
    }

    fn advance_slider(
        &mut self,
        id:    SliderId,
        phase: RailPhase,
        now:   Tick,
        lanes: &mut ConveyorLaneSet,
        stats: &mut RunStats,
    ) -> MachineResult<()> {
        let margin = self.error_margin;
        let dwell = self.z_move_ticks;
        let i = id.index();
        let slider = &mut self.sliders[i];

        let engaged = matches!(
            (slider.status, phase),
            (SliderStatus::Picking, RailPhase::Picking) | (SliderStatus::Placing, RailPhase::Placing)
        );
        let reference = if engaged {
            match slider.tracked.and_then(|t| lanes.position_of(t)) {
                Some(p) => p,
                None => {
                    warn!(slider = %id, tracked = ?slider.tracked, "target left the lane before interception");
                    slider.release();
                    stats.workload[i] += 1;
                    return Ok(());
                }
            }
        } else {
            slider.target.xy()
        };

        if !slider.is_at(reference, margin) {
            stats.workload[i] += 1;
            return Ok(());
        }
        if phase.is_ready() {
            return Ok(());
        }

        let next = match (slider.status, phase, slider.tracked) {
            (SliderStatus::Picking, RailPhase::Picking, Some(TargetRef::Pick { lane, id: pick })) => {
                lanes.complete_pick(lane, pick, stats);
                slider.tracked = None;
                slider.z_started = now;
                debug!(slider = %id, %pick, "picked");
                SliderStatus::ZMovement
            }
            (SliderStatus::Placing, RailPhase::Placing, Some(TargetRef::Drop { lane, id: slot })) => {
                lanes.complete_drop(lane, slot);
                stats.pick_per_slider[i] += 1;
                slider.tracked = None;
                slider.z_started = now;
                debug!(slider = %id, %slot, "placed");
                SliderStatus::ZMovement
            }
            (SliderStatus::Picking | SliderStatus::Placing, _, _) => {
                let violation = InvariantViolation {
                    slider:   id,
                    rail:     slider.rail,
                    status:   slider.status,
                    phase,
                    tracked:  slider.tracked,
                    position: slider.state.position,
                    min:      slider.min,
                    max:      slider.max,
                };
                error!(%violation, "slider status outside the state-cycle table");
                return Err(MachineError::InvariantViolation(Box::new(violation)));
            }
            (SliderStatus::ZMovement, _, _) if now.since(slider.z_started) > dwell => {
                SliderStatus::Idle
            }
            (SliderStatus::ZMovement, _, _) => SliderStatus::ZMovement,
            (SliderStatus::Skipped, RailPhase::Picking, _) => SliderStatus::Skipped,
            (SliderStatus::SkipNWait, _, _) => SliderStatus::SkipNWait,
            (SliderStatus::Skipped | SliderStatus::Waiting | SliderStatus::Idle, _, _) => {
                SliderStatus::Idle
            }
        };
        slider.status = next;
        if next == SliderStatus::ZMovement {
            stats.workload[i] += 1;
        }
        Ok(())
    }

    /// Move a rail whose sliders are all done to its next ready phase.
    fn advance_rail(&mut self, rail: RailId, flags: CycleFlags) {
        let (next, repeat) = match self.rail(rail).phase {
            RailPhase::Picking => (RailPhase::CanPlace, RailPhase::CanPick),
            RailPhase::Placing => (RailPhase::CanPick, RailPhase::CanPlace),
            RailPhase::CanPick | RailPhase::CanPlace => return,
        };
        let [a, b] = self.rail(rail).sliders;
        let (sa, sb) = (self.slider(a).status, self.slider(b).status);

        if sa == SliderStatus::SkipNWait || sb == SliderStatus::SkipNWait {
            let r = self.rail_mut(rail);
            r.phase = repeat;
            if flags.state_bouncing {
                r.bouncing = Some(repeat);
            }
            let (new_a, new_b) = if sa == SliderStatus::SkipNWait {
                (SliderStatus::Idle, SliderStatus::Waiting)
            } else {
                (SliderStatus::Waiting, SliderStatus::Idle)
            };
            self.slider_mut(a).status = new_a;
            self.slider_mut(b).status = new_b;
            debug!(%rail, phase = repeat.as_str(), "rail repeats its phase");
        } else {
            self.rail_mut(rail).phase = next;
            if flags.pre_move {
                self.pre_move(rail, next.task());
            }
        }
    }
}
