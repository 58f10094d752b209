//! Simulation observer trait and the per-tick snapshot handed to it.

use pnp_conveyor::ConveyorLaneSet;
use pnp_core::{LaneId, RunStats, SliderId, Tick, Vec2, Vec3};
use pnp_machine::{Machine, RailPhase, SliderStatus};

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// One pick or drop slot as seen at snapshot time.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemRecord {
    pub id:       u32,
    pub lane:     LaneId,
    pub position: Vec2,
    pub status:   &'static str,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SliderRecord {
    pub id:       SliderId,
    pub position: Vec3,
    pub status:   SliderStatus,
}

/// Read-only copy of the visible world at one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub tick:    Tick,
    pub picks:   Vec<ItemRecord>,
    pub drops:   Vec<ItemRecord>,
    pub sliders: Vec<SliderRecord>,
    /// Phase of every rail, indexed by `RailId`.
    pub rails:   Vec<RailPhase>,
}

impl Snapshot {
    pub fn capture(tick: Tick, lanes: &ConveyorLaneSet, machine: &Machine) -> Self {
        let picks = lanes
            .in_lanes()
            .iter()
            .flat_map(|l| l.picks())
            .map(|p| ItemRecord { id: p.id.0, lane: p.lane, position: p.position, status: p.status.as_str() })
            .collect();
        let drops = lanes
            .out_lanes()
            .iter()
            .flat_map(|l| l.drops())
            .map(|d| ItemRecord { id: d.id.0, lane: d.lane, position: d.position, status: d.status.as_str() })
            .collect();
        let sliders = machine
            .sliders()
            .iter()
            .map(|s| SliderRecord { id: s.id, position: s.position(), status: s.status })
            .collect();
        let rails = machine.rails().iter().map(|r| r.phase).collect();
        Self { tick, picks, drops, sliders, rails }
    }
}

// ── SimObserver ───────────────────────────────────────────────────────────────

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at key points in the
/// tick loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct Progress { every: u64 }
///
/// impl SimObserver for Progress {
///     fn on_tick_end(&mut self, tick: Tick, stats: &RunStats) {
///         if tick.0 % self.every == 0 {
///             println!("{tick}: {} placed", stats.placed());
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before any processing.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called at the end of each tick with the counters so far.
    fn on_tick_end(&mut self, _tick: Tick, _stats: &RunStats) {}

    /// Called every `snapshot_interval_ticks` ticks, after the tick completed.
    fn on_snapshot(&mut self, _snapshot: &Snapshot) {}

    /// Called once when the run stops, whether it completed or was interrupted.
    fn on_run_end(&mut self, _final_tick: Tick, _stats: &RunStats) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
