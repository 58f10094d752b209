//! In-feed and out-feed lanes.
//!
//! A lane is a straight belt along x ending at `end` (its downstream end,
//! centred on the lane).  Items enter at the upstream edge
//! `end.x - flow_sign * length` and are retired shortly after passing `end.x`.

use std::collections::{BTreeMap, BTreeSet};

use pnp_core::{DropId, LaneId, LaneRng, PackageId, PickId, RowId, RunStats, Tick, Vec2};
use tracing::trace;

use crate::pattern::{PackageLayout, RowLayout};
use crate::{Drop, DropStatus, Pick, PickStatus};

/// Retirement tolerance beyond the in-feed lane ends, mm.
pub const BORDER_TOLERANCE: f64 = 10.0;

/// First id (and row id) of hand-placed items.
const MANUAL_BASE: u32 = 1 << 31;

/// Hand-placed id: lane index in bits 20..31, running count below.
#[inline]
fn manual_id(lane: LaneId, n: u32) -> u32 {
    MANUAL_BASE | (lane.0 as u32) << 20 | n
}

// ── LaneGeometry ──────────────────────────────────────────────────────────────

/// Position, extent and motion of one lane.
#[derive(Clone, Debug, PartialEq)]
pub struct LaneGeometry {
    /// Downstream end: `(x_end, y_centre)`.
    pub end:          Vec2,
    /// `+1.0` when items flow toward +x.
    pub flow_sign:    f64,
    pub length:       f64,
    pub width:        f64,
    /// Belt speed, mm/s.
    pub speed:        f64,
    /// Belt travel per tick, mm.
    pub step:         f64,
    pub error_margin: f64,
    /// Upstream lookahead added to slider envelopes, mm.
    pub extra_range:  f64,
}

impl LaneGeometry {
    /// Unit flow direction.
    #[inline]
    pub fn direction(&self) -> Vec2 {
        Vec2::new(self.flow_sign, 0.0)
    }

    /// Item displacement over one tick.
    #[inline]
    pub fn delta(&self) -> Vec2 {
        self.direction() * self.step
    }

    #[inline]
    pub fn center_y(&self) -> f64 {
        self.end.y
    }

    /// x of the edge where items enter.
    #[inline]
    pub fn upstream_x(&self) -> f64 {
        self.end.x - self.flow_sign * self.length
    }

    /// `(min_x, max_x)` of the belt.
    pub fn bounds(&self) -> (f64, f64) {
        let a = self.end.x;
        let b = self.upstream_x();
        (a.min(b), a.max(b))
    }

    /// Where an item at `position` will be after `secs` seconds.
    #[inline]
    pub fn project(&self, position: Vec2, secs: f64) -> Vec2 {
        position + self.direction() * (self.speed * secs)
    }

    #[inline]
    pub fn is_stationary(&self) -> bool {
        self.step == 0.0
    }
}

// ── Cadence ───────────────────────────────────────────────────────────────────

/// Distance-driven generation schedule.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Cadence {
    pub(crate) spacing:     f64,
    pub(crate) travelled:   f64,
    pub(crate) generations: u32,
}

impl Cadence {
    fn new(spacing: f64) -> Self {
        Self { spacing, ..Self::default() }
    }

    /// Distance by which the belt has passed the next generation point, if it has.
    fn due(&self) -> Option<f64> {
        let overshoot = self.travelled - self.spacing * self.generations as f64;
        (overshoot > 0.0).then_some(overshoot)
    }
}

// ── InFeedLane ────────────────────────────────────────────────────────────────

pub struct InFeedLane {
    pub id:       LaneId,
    pub geometry: LaneGeometry,
    layout:       RowLayout,
    cadence:      Cadence,
    picks:        BTreeMap<PickId, Pick>,
    rng:          LaneRng,
    bad_ratio:    f64,
    jitter:       f64,
    /// Picks per generation across all in-feed lanes.
    id_stride:    u32,
    /// This lane's first slot within a generation's id block.
    id_offset:    u32,
    manual_rows:  u32,
    manual_items: u32,
}

impl InFeedLane {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id:        LaneId,
        geometry:  LaneGeometry,
        layout:    RowLayout,
        spacing:   f64,
        rng:       LaneRng,
        bad_ratio: f64,
        jitter:    f64,
        id_stride: u32,
        id_offset: u32,
    ) -> Self {
        Self {
            id,
            geometry,
            layout,
            cadence: Cadence::new(spacing),
            picks: BTreeMap::new(),
            rng,
            bad_ratio,
            jitter,
            id_stride,
            id_offset,
            manual_rows: 0,
            manual_items: 0,
        }
    }

    /// Live picks in ascending id order.
    pub fn picks(&self) -> impl Iterator<Item = &Pick> {
        self.picks.values()
    }

    pub fn pick(&self, id: PickId) -> Option<&Pick> {
        self.picks.get(&id)
    }

    pub fn pick_mut(&mut self, id: PickId) -> Option<&mut Pick> {
        self.picks.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    pub fn generations(&self) -> u32 {
        self.cadence.generations
    }

    pub fn travelled(&self) -> f64 {
        self.cadence.travelled
    }

    /// Place a row of picks by hand (fixtures, scripted scenarios).
    ///
    /// Hand-placed items live in the upper half of the id space, so they never
    /// collide with generated ones and sort after them.
    pub fn insert_row(&mut self, positions: &[Vec2], status: PickStatus) -> Vec<PickId> {
        let row = RowId(MANUAL_BASE + self.manual_rows);
        self.manual_rows += 1;
        positions
            .iter()
            .map(|&position| {
                let id = PickId(manual_id(self.id, self.manual_items));
                self.manual_items += 1;
                self.picks.insert(id, Pick { id, position, status, row, lane: self.id });
                id
            })
            .collect()
    }

    /// Place one pick on a row of its own.
    pub fn insert_pick(&mut self, position: Vec2, status: PickStatus) -> PickId {
        self.insert_row(&[position], status)[0]
    }

    /// One tick: move every pick, generate due rows, retire rows that left.
    pub(crate) fn advance(&mut self, now: Tick, stats: &mut RunStats) {
        let delta = self.geometry.delta();
        for pick in self.picks.values_mut() {
            pick.position += delta;
        }
        self.cadence.travelled += self.geometry.step;
        while let Some(overshoot) = self.cadence.due() {
            self.generate_row(overshoot);
        }
        self.retire(now, stats);
    }

    /// Generate one row `overshoot` mm downstream of the upstream edge.
    pub(crate) fn generate_row(&mut self, overshoot: f64) {
        let generation = self.cadence.generations;
        let g = &self.geometry;
        let origin = Vec2::new(
            g.upstream_x() + g.flow_sign * overshoot,
            g.center_y() + self.layout.shift(generation),
        );
        for (slot, offset) in self.layout.offsets.iter().enumerate() {
            let jitter = Vec2::new(self.rng.gaussian(self.jitter), self.rng.gaussian(self.jitter));
            let status = if self.rng.gen_bool(self.bad_ratio) {
                PickStatus::Bad
            } else {
                PickStatus::Free
            };
            let id = PickId(generation * self.id_stride + self.id_offset + slot as u32);
            self.picks.insert(
                id,
                Pick { id, position: origin + *offset + jitter, status, row: RowId(generation), lane: self.id },
            );
        }
        self.cadence.generations += 1;
        trace!(lane = self.id.0, generation, "pick row generated");
    }

    /// Retire every row with at least one pick outside the belt tolerance.
    fn retire(&mut self, now: Tick, stats: &mut RunStats) {
        let (min_x, max_x) = self.geometry.bounds();
        let (lo, hi) = (min_x - BORDER_TOLERANCE, max_x + BORDER_TOLERANCE);
        let leaving: BTreeSet<RowId> = self
            .picks
            .values()
            .filter(|p| !(lo < p.position.x && p.position.x < hi))
            .map(|p| p.row)
            .collect();
        if leaving.is_empty() {
            return;
        }
        self.picks.retain(|_, p| {
            if !leaving.contains(&p.row) {
                return true;
            }
            if !matches!(p.status, PickStatus::Gone | PickStatus::Bad) {
                stats.record_missed_pick(now);
            }
            if p.status != PickStatus::Bad {
                stats.total_picks += 1;
            }
            false
        });
    }

    /// Remove a picked item.  Returns it with status `Gone`.
    pub(crate) fn complete(&mut self, id: PickId, stats: &mut RunStats) -> Option<Pick> {
        let mut pick = self.picks.remove(&id)?;
        if pick.status != PickStatus::Bad {
            stats.total_picks += 1;
        }
        pick.status = PickStatus::Gone;
        Some(pick)
    }
}

// ── OutFeedLane ───────────────────────────────────────────────────────────────

pub struct OutFeedLane {
    pub id:        LaneId,
    pub geometry:  LaneGeometry,
    layout:        PackageLayout,
    cadence:       Cadence,
    drops:         BTreeMap<DropId, Drop>,
    /// Groups enter this far upstream of the belt edge.
    extra_spacing: f64,
    id_stride:     u32,
    id_offset:     u32,
    package_stride: u32,
    package_offset: u32,
    manual_items:   u32,
}

impl OutFeedLane {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id:             LaneId,
        geometry:       LaneGeometry,
        layout:         PackageLayout,
        spacing:        f64,
        extra_spacing:  f64,
        id_stride:      u32,
        id_offset:      u32,
        package_stride: u32,
        package_offset: u32,
    ) -> Self {
        Self {
            id,
            geometry,
            layout,
            cadence: Cadence::new(spacing),
            drops: BTreeMap::new(),
            extra_spacing,
            id_stride,
            id_offset,
            package_stride,
            package_offset,
            manual_items: 0,
        }
    }

    /// Live drop slots in ascending id order.
    pub fn drops(&self) -> impl Iterator<Item = &Drop> {
        self.drops.values()
    }

    pub fn drop_slot(&self, id: DropId) -> Option<&Drop> {
        self.drops.get(&id)
    }

    pub fn drop_slot_mut(&mut self, id: DropId) -> Option<&mut Drop> {
        self.drops.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.drops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drops.is_empty()
    }

    pub fn generations(&self) -> u32 {
        self.cadence.generations
    }

    pub fn travelled(&self) -> f64 {
        self.cadence.travelled
    }

    /// Place one drop slot by hand as a single-slot package with its own row.
    pub fn insert_drop(&mut self, position: Vec2, status: DropStatus) -> DropId {
        let id = DropId(manual_id(self.id, self.manual_items));
        let package = PackageId(id.0);
        let row = RowId(MANUAL_BASE + self.manual_items);
        self.manual_items += 1;
        self.drops.insert(id, Drop { id, position, status, package, row, lane: self.id });
        id
    }

    pub(crate) fn advance(&mut self, now: Tick, stats: &mut RunStats) {
        let delta = self.geometry.delta();
        for drop in self.drops.values_mut() {
            drop.position += delta;
        }
        self.cadence.travelled += self.geometry.step;
        while let Some(overshoot) = self.cadence.due() {
            self.generate_group(overshoot);
        }
        self.retire(now, stats);
    }

    pub(crate) fn generate_group(&mut self, overshoot: f64) {
        let generation = self.cadence.generations;
        let g = &self.geometry;
        let origin = Vec2::new(
            g.upstream_x() - g.flow_sign * self.extra_spacing + g.flow_sign * overshoot,
            g.center_y(),
        );
        for (slot_index, slot) in self.layout.slots.iter().enumerate() {
            let id = DropId(generation * self.id_stride + self.id_offset + slot_index as u32);
            let package = PackageId(generation * self.package_stride + self.package_offset + slot.package);
            let row = RowId(generation * self.layout.rows + slot.row);
            self.drops.insert(
                id,
                Drop {
                    id,
                    position: origin + slot.offset,
                    status: DropStatus::Normal,
                    package,
                    row,
                    lane: self.id,
                },
            );
        }
        self.cadence.generations += 1;
        trace!(lane = self.id.0, generation, "package group generated");
    }

    /// Retire every package with at least one slot outside the belt tolerance.
    ///
    /// Groups are spawned `extra_spacing` upstream, so the upstream tolerance
    /// is wider than the downstream one.
    fn retire(&mut self, now: Tick, stats: &mut RunStats) {
        let (min_x, max_x) = self.geometry.bounds();
        let near = self.extra_spacing + 1.0;
        let far = 2.0 * self.extra_spacing + 1.0;
        let (lo, hi) = if self.geometry.flow_sign < 0.0 {
            (min_x - near, max_x + far)
        } else {
            (min_x - far, max_x + near)
        };
        let leaving: BTreeSet<PackageId> = self
            .drops
            .values()
            .filter(|d| !(lo < d.position.x && d.position.x < hi))
            .map(|d| d.package)
            .collect();
        if leaving.is_empty() {
            return;
        }
        stats.total_packages += leaving.len() as u64;

        let mut unfilled: BTreeSet<PackageId> = BTreeSet::new();
        self.drops.retain(|_, d| {
            if !leaving.contains(&d.package) {
                return true;
            }
            stats.total_drops += 1;
            if d.status != DropStatus::Done {
                stats.record_missed_drop(now);
                if unfilled.insert(d.package) {
                    stats.unfilled_packages += 1;
                }
            }
            false
        });
    }

    /// Mark a slot filled.  Returns `false` if the slot no longer exists.
    pub(crate) fn complete(&mut self, id: DropId) -> bool {
        match self.drops.get_mut(&id) {
            Some(d) => {
                d.status = DropStatus::Done;
                true
            }
            None => false,
        }
    }
}
