//! All lanes of the line plus the in/out stagger.
//!
//! # Stagger offset
//!
//! In-feed and out-feed belts usually run at different speeds.  So that the
//! first items and the first packages reach the middle of the line together,
//! one feed is held still for `|t_offset|` ticks at start-up:
//!
//! ```text
//! meeting  = d_out / (d_in + d_out) · length
//! t_offset = meeting · (1/d_in − 1/d_out)          (ticks)
//!
//! t_offset < 0  →  in-feed holds while  tick < −t_offset
//! t_offset > 0  →  out-feed holds while tick <  t_offset
//! ```
//!
//! `d_*` are per-tick belt steps.  A stationary feed disables the stagger.

use pnp_core::{
    DropId, LaneId, LaneRng, MachineParams, PickId, RowPattern, RunStats, Tick, Vec2,
};
use tracing::debug;

use crate::lane::{InFeedLane, LaneGeometry, OutFeedLane};
use crate::pattern::{PackageLayout, RowLayout};
use crate::{ConveyorError, ConveyorResult, DropStatus, Pick, PickStatus, TargetRef};

pub struct ConveyorLaneSet {
    in_lanes:  Vec<InFeedLane>,
    out_lanes: Vec<OutFeedLane>,
    /// Start-up stagger, ticks (see module docs).
    t_offset:  f64,
}

impl ConveyorLaneSet {
    /// Build every lane from validated parameters.  Each lane starts with one
    /// row or package group at its upstream edge, counted as generation 0, so
    /// the next one follows a full spacing later.
    pub fn from_params(params: &MachineParams, seed: u64) -> ConveyorResult<Self> {
        let c = &params.conveyor;
        let dt = params.time_step;
        let pattern: RowPattern = c.in_pattern.parse()?;

        let in_stride: u32 = c.in_items_per_row.iter().map(|&n| n as u32).sum();
        let mut in_lanes = Vec::with_capacity(c.nb_in_conveyor);
        let mut offset = 0u32;
        for i in 0..c.nb_in_conveyor {
            let id = LaneId(i as u16);
            let geometry = LaneGeometry {
                end:          Vec2::from(c.in_end_pos[i]),
                flow_sign:    c.in_flow_sign(),
                length:       c.length,
                width:        c.in_width[i],
                speed:        c.speed[0],
                step:         c.speed[0] * dt,
                error_margin: c.error_margin,
                extra_range:  0.0,
            };
            let layout = RowLayout::new(
                c.in_items_per_row[i],
                c.in_width[i] - params.target.width,
                pattern,
            );
            in_lanes.push(InFeedLane::new(
                id,
                geometry,
                layout,
                c.in_row_spacing,
                LaneRng::in_feed(seed, id),
                c.bad_product_ratio,
                c.jitter_std_dev,
                in_stride,
                offset,
            ));
            offset += c.in_items_per_row[i] as u32;
        }

        let split = c.packages_row_splitting.then_some(c.packages_row_split_spacing);
        let per_group = if split.is_some() { 2 } else { 1 };
        let out_stride: u32 = c
            .out_items_per_row
            .iter()
            .map(|&n| (n * c.n_packages_row) as u32)
            .sum();
        let package_stride = per_group * c.nb_out_conveyor as u32;
        let group_spacing =
            c.packages_row_spacing * c.n_packages_row as f64 + c.packages_extra_spacing;

        let mut out_lanes = Vec::with_capacity(c.nb_out_conveyor);
        let mut offset = 0u32;
        for i in 0..c.nb_out_conveyor {
            let id = LaneId(i as u16);
            let geometry = LaneGeometry {
                end:          Vec2::from(c.out_end_pos[i]),
                flow_sign:    c.out_flow_sign(),
                length:       c.length,
                width:        c.out_width[i],
                speed:        c.speed[1],
                step:         c.speed[1] * dt,
                error_margin: c.error_margin,
                extra_range:  0.0,
            };
            let layout = PackageLayout::new(
                c.out_items_per_row[i],
                c.n_packages_row,
                c.out_width[i],
                c.drop_side_offset,
                split,
                c.packages_row_spacing,
                c.out_flow_sign(),
            );
            out_lanes.push(OutFeedLane::new(
                id,
                geometry,
                layout,
                group_spacing,
                c.packages_extra_spacing,
                out_stride,
                offset,
                package_stride,
                per_group * i as u32,
            ));
            offset += (c.out_items_per_row[i] * c.n_packages_row) as u32;
        }

        for lane in &mut in_lanes {
            lane.generate_row(0.0);
        }
        for lane in &mut out_lanes {
            lane.generate_group(0.0);
        }

        let t_offset = stagger_ticks(c.speed[0] * dt, c.speed[1] * dt, c.length);
        debug!(t_offset, in_lanes = in_lanes.len(), out_lanes = out_lanes.len(), "conveyors built");
        Ok(Self { in_lanes, out_lanes, t_offset })
    }

    // ── Access ────────────────────────────────────────────────────────────

    pub fn in_lanes(&self) -> &[InFeedLane] {
        &self.in_lanes
    }

    pub fn out_lanes(&self) -> &[OutFeedLane] {
        &self.out_lanes
    }

    pub fn in_lane(&self, id: LaneId) -> ConveyorResult<&InFeedLane> {
        self.in_lanes.get(id.index()).ok_or(ConveyorError::UnknownInLane(id))
    }

    pub fn in_lane_mut(&mut self, id: LaneId) -> ConveyorResult<&mut InFeedLane> {
        self.in_lanes.get_mut(id.index()).ok_or(ConveyorError::UnknownInLane(id))
    }

    pub fn out_lane(&self, id: LaneId) -> ConveyorResult<&OutFeedLane> {
        self.out_lanes.get(id.index()).ok_or(ConveyorError::UnknownOutLane(id))
    }

    pub fn out_lane_mut(&mut self, id: LaneId) -> ConveyorResult<&mut OutFeedLane> {
        self.out_lanes.get_mut(id.index()).ok_or(ConveyorError::UnknownOutLane(id))
    }

    /// Start-up stagger in ticks.
    pub fn t_offset(&self) -> f64 {
        self.t_offset
    }

    /// Current position of a tracked item, `None` once it has left the belt.
    pub fn position_of(&self, target: TargetRef) -> Option<Vec2> {
        match target {
            TargetRef::Pick { lane, id } => self.in_lanes.get(lane.index())?.pick(id).map(|p| p.position),
            TargetRef::Drop { lane, id } => {
                self.out_lanes.get(lane.index())?.drop_slot(id).map(|d| d.position)
            }
        }
    }

    // ── Status changes ────────────────────────────────────────────────────

    /// Hand a candidate to a slider.  Returns `false` if the item is gone.
    pub fn mark_assigned(&mut self, target: TargetRef) -> bool {
        self.set_status(target, PickStatus::Assigned, DropStatus::Assigned)
    }

    /// Reject a candidate for this pass; it stays eligible later.
    pub fn mark_skipped(&mut self, target: TargetRef) -> bool {
        self.set_status(target, PickStatus::Skipped, DropStatus::Skipped)
    }

    fn set_status(&mut self, target: TargetRef, pick: PickStatus, drop: DropStatus) -> bool {
        match target {
            TargetRef::Pick { lane, id } => self
                .in_lanes
                .get_mut(lane.index())
                .and_then(|l| l.pick_mut(id))
                .map(|p| p.status = pick)
                .is_some(),
            TargetRef::Drop { lane, id } => self
                .out_lanes
                .get_mut(lane.index())
                .and_then(|l| l.drop_slot_mut(id))
                .map(|d| d.status = drop)
                .is_some(),
        }
    }

    /// A slider lifted `id`: remove it and count it.
    pub fn complete_pick(&mut self, lane: LaneId, id: PickId, stats: &mut RunStats) -> Option<Pick> {
        self.in_lanes.get_mut(lane.index())?.complete(id, stats)
    }

    /// A slider filled `id`: mark it DONE.  It stays until its package retires.
    pub fn complete_drop(&mut self, lane: LaneId, id: DropId) -> bool {
        self.out_lanes
            .get_mut(lane.index())
            .is_some_and(|l| l.complete(id))
    }

    // ── Lookahead ─────────────────────────────────────────────────────────

    /// Set each lane's lookahead to the distance it travels in `travel_secs`,
    /// the time a slider needs to cross from the in-feed to the out-feed.
    pub fn set_lookahead(&mut self, travel_secs: f64) {
        for lane in &mut self.in_lanes {
            lane.geometry.extra_range = lane.geometry.speed * travel_secs;
        }
        for lane in &mut self.out_lanes {
            lane.geometry.extra_range = lane.geometry.speed * travel_secs;
        }
    }

    /// Beam-axis distance between the last in-feed lane and the last out-feed lane.
    pub fn feed_separation(&self) -> f64 {
        let last_in = self.in_lanes.last().map_or(0.0, |l| l.geometry.center_y());
        let last_out = self.out_lanes.last().map_or(0.0, |l| l.geometry.center_y());
        last_in - last_out
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Move, generate and retire on every lane whose feed is not held by the
    /// start-up stagger, then note when each feed first covers a full length.
    pub fn advance(&mut self, now: Tick, stats: &mut RunStats) {
        let t = now.0 as f64;
        let in_held = self.t_offset < 0.0 && t < -self.t_offset;
        let out_held = self.t_offset > 0.0 && t < self.t_offset;

        if !in_held {
            for lane in &mut self.in_lanes {
                lane.advance(now, stats);
            }
        }
        if !out_held {
            for lane in &mut self.out_lanes {
                lane.advance(now, stats);
            }
        }

        if stats.start_recording_in.is_none()
            && self.in_lanes.first().is_some_and(|l| l.travelled() > l.geometry.length)
        {
            stats.start_recording_in = Some(now);
            debug!(%now, "in-feed reached steady state");
        }
        if stats.start_recording_out.is_none()
            && self.out_lanes.first().is_some_and(|l| l.travelled() > l.geometry.length)
        {
            stats.start_recording_out = Some(now);
            debug!(%now, "out-feed reached steady state");
        }
    }
}

/// Start-up stagger in ticks; zero if either feed is stationary.
pub(crate) fn stagger_ticks(d_in: f64, d_out: f64, length: f64) -> f64 {
    if d_in <= 0.0 || d_out <= 0.0 {
        return 0.0;
    }
    let meeting = d_out / (d_in + d_out) * length;
    meeting * (1.0 / d_in - 1.0 / d_out)
}
