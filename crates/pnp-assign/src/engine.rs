//! The assignment engine: candidate search, feasibility, resolution.

use std::collections::BTreeSet;

use pnp_conveyor::{ConveyorLaneSet, ConveyorResult, LaneGeometry, LaneItem};
use pnp_core::{LaneId, RailId, RowId, Vec2};
use pnp_machine::{Machine, RailPhase, Slider, SliderStatus, Task};
use pnp_motion::{Trajectory, TrajectoryOracle};
use tracing::debug;

use crate::{Candidate, Side, Strategy};

/// Lookahead multiplier while a rail bounces.
const BOUNCING_LOOKAHEAD: f64 = 3.0;

/// Meeting-point refinements tried per candidate before giving up on it.
const MAX_REFINEMENTS: usize = 256;

/// Engine switches taken from the run configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub tick_secs:      f64,
    pub state_bouncing: bool,
    /// Empty passes after which a rail starts bouncing; `None` disables it.
    pub starve_limit:   Option<u32>,
}

pub struct AssignmentEngine<O: TrajectoryOracle> {
    oracle:     O,
    config:     EngineConfig,
    /// `[pick, place]` strategy per rail, indexed by `RailId`.
    strategies: Vec<[Strategy; 2]>,
}

impl<O: TrajectoryOracle> AssignmentEngine<O> {
    /// Resolve every rail's policies once.  Both sliders of a rail share the
    /// beam's policies, so slider 0 speaks for the rail.
    pub fn new(oracle: O, machine: &Machine, config: EngineConfig) -> Self {
        let strategies = machine
            .rails()
            .iter()
            .map(|rail| {
                let s = machine.slider(rail.sliders[0]);
                [Strategy::for_policy(s.in_policy), Strategy::for_policy(s.out_policy)]
            })
            .collect();
        Self { oracle, config, strategies }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn strategy(&self, rail: RailId, task: Task) -> &Strategy {
        let pair = &self.strategies[rail.index()];
        match task {
            Task::Pick => &pair[0],
            Task::Place => &pair[1],
        }
    }

    // ── Passes ────────────────────────────────────────────────────────────

    /// Offer picks to every rail in CAN_PICK, in rail id order.
    pub fn pick_pass(&self, machine: &mut Machine, lanes: &mut ConveyorLaneSet) -> ConveyorResult<()> {
        self.pass(machine, lanes, Task::Pick)
    }

    /// Offer drop slots to every rail in CAN_PLACE, in rail id order.
    pub fn drop_pass(&self, machine: &mut Machine, lanes: &mut ConveyorLaneSet) -> ConveyorResult<()> {
        self.pass(machine, lanes, Task::Place)
    }

    fn pass(&self, machine: &mut Machine, lanes: &mut ConveyorLaneSet, task: Task) -> ConveyorResult<()> {
        for r in 0..machine.rails().len() {
            let rail = RailId(r as u16);
            if machine.rail(rail).phase != task.ready_phase() {
                continue;
            }
            self.serve(machine, lanes, rail, task)?;
        }
        Ok(())
    }

    /// One rail's turn at `task`, including the bounce follow-up.
    fn serve(
        &self,
        machine: &mut Machine,
        lanes:   &mut ConveyorLaneSet,
        rail:    RailId,
        task:    Task,
    ) -> ConveyorResult<()> {
        let candidates = self.find_candidates(machine, lanes, rail, task)?;
        if candidates.is_empty() {
            self.note_starved(machine, rail, task);
            if machine.rail(rail).bouncing.is_some() {
                machine.bounce(rail, task.opposite().ready_phase());
                self.follow_up(machine, lanes, rail, task.opposite())?;
            }
            return Ok(());
        }

        machine.rail_mut(rail).starved_passes = 0;
        self.resolve_rail_assignment(machine, lanes, rail, task, candidates)?;
        if machine.rail(rail).bouncing.is_some() {
            self.follow_up(machine, lanes, rail, task.opposite())?;
        }
        Ok(())
    }

    /// Try the opposite task right away; bounce back if there is nothing to do.
    fn follow_up(
        &self,
        machine: &mut Machine,
        lanes:   &mut ConveyorLaneSet,
        rail:    RailId,
        task:    Task,
    ) -> ConveyorResult<()> {
        let candidates = self.find_candidates(machine, lanes, rail, task)?;
        if candidates.is_empty() {
            machine.bounce(rail, task.opposite().ready_phase());
            return Ok(());
        }
        self.resolve_rail_assignment(machine, lanes, rail, task, candidates)?;
        Ok(())
    }

    fn note_starved(&self, machine: &mut Machine, rail: RailId, task: Task) {
        let Some(limit) = self.config.starve_limit else { return };
        if !self.config.state_bouncing {
            return;
        }
        let r = machine.rail_mut(rail);
        r.starved_passes += 1;
        if r.starved_passes >= limit && r.bouncing.is_none() {
            r.bouncing = Some(task.ready_phase());
            debug!(%rail, passes = r.starved_passes, "starved rail starts bouncing");
        }
    }

    // ── Search ────────────────────────────────────────────────────────────

    /// Items on the beam's lane for `task` that the rail could go for.
    ///
    /// An item qualifies when its x lies strictly inside the rail's envelope
    /// (stretched upstream by the lane lookahead, three times as far while
    /// the rail bounces in this phase), or when it shares a row with such an
    /// item; only FREE/NORMAL and SKIPPED items are returned, in ascending
    /// id order.  Nothing is mutated.
    pub fn find_candidates(
        &self,
        machine: &Machine,
        lanes:   &ConveyorLaneSet,
        rail:    RailId,
        task:    Task,
    ) -> ConveyorResult<Vec<Candidate>> {
        let r = machine.rail(rail);
        let envelope = machine.slider(r.sliders[0]);
        let beam = machine.beam(r.beam);
        let geometry = lane_geometry(lanes, beam.in_lane, beam.out_lane, task)?;

        let mut extra = geometry.extra_range;
        if r.bouncing == Some(task.ready_phase()) {
            extra *= BOUNCING_LOOKAHEAD;
        }
        let (lo, hi) = if geometry.flow_sign < 0.0 {
            (envelope.min.x, envelope.max.x + extra)
        } else {
            (envelope.min.x - extra, envelope.max.x)
        };

        Ok(match task {
            Task::Pick => in_reach(lanes.in_lane(beam.in_lane)?.picks(), lo, hi),
            Task::Place => in_reach(lanes.out_lane(beam.out_lane)?.drops(), lo, hi),
        })
    }

    /// First candidate `slider` can meet in time, with the meeting point.
    ///
    /// For each candidate the meeting point starts at the candidate, pulled
    /// into the envelope on the upstream side, and is refined until the
    /// slider is predicted to arrive ahead of the item by more than the error
    /// margin.  A candidate whose projected position leaves the (lookahead
    /// extended) envelope is dropped.
    pub fn find_feasible_target(
        &self,
        slider:     &Slider,
        candidates: &[Candidate],
        geometry:   &LaneGeometry,
        bouncing:   bool,
        margin:     f64,
    ) -> Option<(usize, Vec2)> {
        let sign = geometry.flow_sign;
        let dt = self.config.tick_secs;
        let mut extra = geometry.extra_range;
        if bouncing {
            extra *= BOUNCING_LOOKAHEAD;
        }
        let (lo, hi) = if sign > 0.0 {
            (slider.min.x - extra, slider.max.x)
        } else {
            (slider.min.x, slider.max.x + extra)
        };

        for (k, candidate) in candidates.iter().enumerate() {
            let start_x = if sign > 0.0 {
                slider.min.x.max(candidate.position.x)
            } else {
                slider.max.x.min(candidate.position.x)
            };
            let mut meeting = Vec2::new(start_x, candidate.position.y);

            for _ in 0..MAX_REFINEMENTS {
                let plan = self.oracle.plan(&slider.state, meeting.with_z(slider.target.z));
                let t = plan.duration();
                let t = t + dt - t % dt;
                let predicted = plan.sample_at(t).position.xy();
                let item = geometry.project(candidate.position, t);

                if item.x < lo || item.x > hi {
                    break;
                }
                if geometry.is_stationary() {
                    return Some((k, meeting));
                }
                let lead = (predicted.x - item.x) * sign;
                if lead < -margin {
                    meeting = item;
                } else if lead < margin {
                    meeting = predicted + geometry.delta();
                } else {
                    return Some((k, meeting));
                }
            }
        }
        None
    }

    // ── Resolution ────────────────────────────────────────────────────────

    /// Order the candidates, give the primary slider the first feasible one
    /// and try to occupy the secondary with the rest.
    ///
    /// Returns `true` if the primary slider committed to a target.
    pub fn resolve_rail_assignment(
        &self,
        machine:        &mut Machine,
        lanes:          &mut ConveyorLaneSet,
        rail:           RailId,
        task:           Task,
        mut candidates: Vec<Candidate>,
    ) -> ConveyorResult<bool> {
        let side = self.acting_side(machine, lanes, rail, task)?;
        let strategy = self.strategy(rail, task);
        (strategy.order)(&mut candidates, side);

        let lead = strategy.lead(side);
        let (primary, is_first) = if machine.rail_slider(rail, lead).status.is_sidelined() {
            (1 - lead, false)
        } else {
            (lead, true)
        };
        let secondary = 1 - primary;

        let beam = machine.beam_of(rail);
        let geometry = lane_geometry(lanes, beam.in_lane, beam.out_lane, task)?.clone();
        let margin = machine.error_margin();
        let bouncing = machine.rail(rail).bouncing.is_some();

        let found = self.find_feasible_target(
            machine.rail_slider(rail, primary),
            &candidates,
            &geometry,
            bouncing,
            margin,
        );

        let Some((k, meeting)) = found else {
            if bouncing {
                machine.bounce(rail, task.opposite().ready_phase());
            } else if !is_first && task == Task::Pick {
                machine.rail_slider_mut(rail, primary).status = SliderStatus::Skipped;
                machine.rail_mut(rail).phase = RailPhase::Picking;
                debug!(%rail, "sidelined pair found nothing, holding the rail");
            }
            return Ok(false);
        };

        let chosen = candidates.remove(k);
        commit(machine, lanes, rail, primary, chosen, meeting, task);
        let r = machine.rail_mut(rail);
        r.bouncing = None;
        r.phase = task.busy_phase();

        if is_first && !machine.rail_slider(rail, secondary).status.is_sidelined() {
            self.search_for_second(machine, lanes, rail, primary, candidates, &geometry, task);
        } else {
            machine.park(rail, secondary);
        }
        Ok(true)
    }

    /// Occupy the secondary slider with a candidate that keeps clear of the
    /// primary's item, or park it.
    #[allow(clippy::too_many_arguments)]
    fn search_for_second(
        &self,
        machine:        &mut Machine,
        lanes:          &mut ConveyorLaneSet,
        rail:           RailId,
        primary:        usize,
        mut candidates: Vec<Candidate>,
        geometry:       &LaneGeometry,
        task:           Task,
    ) {
        let secondary = 1 - primary;
        let first = machine.rail_slider(rail, primary);
        let primary_y = first
            .tracked
            .and_then(|t| lanes.position_of(t))
            .map_or(first.target.y, |p| p.y);
        let margin = machine.error_margin();
        let clearance = machine.clearance();

        loop {
            let found = self.find_feasible_target(
                machine.rail_slider(rail, secondary),
                &candidates,
                geometry,
                false,
                margin,
            );
            let Some((k, meeting)) = found else {
                machine.park(rail, secondary);
                return;
            };
            let candidate = candidates[k];
            if collides(primary_y, candidate.position.y, secondary, clearance) {
                lanes.mark_skipped(candidate.target);
                debug!(%rail, target = %candidate.target, "too close to the primary, skipped");
                candidates.drain(..=k);
                continue;
            }
            commit(machine, lanes, rail, secondary, candidate, meeting, task);
            return;
        }
    }

    /// Which slider of `rail` leads on the lane `task` serves.
    ///
    /// Picking leads with slider 0 unless the in-feed lies below the out-feed;
    /// placing leads with slider 1 when the out-feed lies below the in-feed.
    pub fn acting_side(
        &self,
        machine: &Machine,
        lanes:   &ConveyorLaneSet,
        rail:    RailId,
        task:    Task,
    ) -> ConveyorResult<Side> {
        let beam = machine.beam_of(rail);
        let in_y = lanes.in_lane(beam.in_lane)?.geometry.center_y();
        let out_y = lanes.out_lane(beam.out_lane)?.geometry.center_y();
        Ok(match task {
            Task::Pick if in_y >= out_y => Side::Zero,
            Task::Pick => Side::Negative,
            Task::Place if out_y < in_y => Side::Negative,
            Task::Place => Side::Zero,
        })
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// `true` when a secondary slider (index `secondary`) heading for `candidate_y`
/// would come closer than `clearance` to the primary's item at `primary_y`.
///
/// Slider 1 must stay above the primary, slider 0 below it.
pub fn collides(primary_y: f64, candidate_y: f64, secondary: usize, clearance: f64) -> bool {
    let delta = candidate_y - primary_y;
    let delta = if secondary == 1 { delta } else { -delta };
    delta < clearance
}

fn lane_geometry(
    lanes:    &ConveyorLaneSet,
    in_lane:  LaneId,
    out_lane: LaneId,
    task:     Task,
) -> ConveyorResult<&LaneGeometry> {
    Ok(match task {
        Task::Pick => &lanes.in_lane(in_lane)?.geometry,
        Task::Place => &lanes.out_lane(out_lane)?.geometry,
    })
}

/// Items strictly inside `(lo, hi)` along x, widened to their whole rows and
/// filtered to candidate statuses.
fn in_reach<'a, I: LaneItem + 'a>(items: impl Iterator<Item = &'a I>, lo: f64, hi: f64) -> Vec<Candidate> {
    let items: Vec<&I> = items.collect();
    let rows: BTreeSet<RowId> = items
        .iter()
        .filter(|i| lo < i.position().x && i.position().x < hi)
        .map(|i| i.row())
        .collect();
    items
        .into_iter()
        .filter(|i| i.is_candidate() && rows.contains(&i.row()))
        .map(Candidate::of)
        .collect()
}

fn commit(
    machine:   &mut Machine,
    lanes:     &mut ConveyorLaneSet,
    rail:      RailId,
    index:     usize,
    candidate: Candidate,
    meeting:   Vec2,
    task:      Task,
) {
    lanes.mark_assigned(candidate.target);
    let slider = machine.rail_slider_mut(rail, index);
    slider.commit(candidate.target, meeting, task);
    debug!(slider = %slider.id, target = %candidate.target, x = slider.target.x, y = slider.target.y, "committed");
}
