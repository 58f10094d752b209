//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically increasing `Tick` counter.  The mapping to
//! simulated seconds is held in `SimClock`:
//!
//!   elapsed_secs = tick * tick_secs
//!
//! Everything that must be exact (generation cadence, stagger offsets, dwell
//! timers) is expressed in ticks; the oracle works in seconds and its travel
//! times are rounded up to the next tick boundary before they are compared.
//!
//! The reference line runs at 10 ms per tick.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[derive(Serialize, Deserialize)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Ticks elapsed from `earlier` to `self`, zero if `earlier` is later.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts between tick counts and simulated seconds.
#[derive(Clone, Debug)]
pub struct SimClock {
    /// Simulated seconds per tick.
    pub tick_secs: f64,
    /// The current tick, advanced by `SimClock::advance()` each iteration.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(tick_secs: f64) -> Self {
        Self { tick_secs, current_tick: Tick::ZERO }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick.0 += 1;
    }

    /// Elapsed simulated seconds since tick 0.
    #[inline]
    pub fn elapsed_secs(&self) -> f64 {
        self.current_tick.0 as f64 * self.tick_secs
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2} s)", self.current_tick, self.elapsed_secs())
    }
}

/// Ticks needed to cover `secs` at `tick_secs` per tick, rounding up.
///
/// A tiny relative tolerance keeps exact multiples (0.15 s at 10 ms) from
/// rounding up an extra tick through float noise.
pub fn ticks_for_secs(secs: f64, tick_secs: f64) -> u64 {
    if secs <= 0.0 || tick_secs <= 0.0 {
        return 0;
    }
    let ratio = secs / tick_secs;
    let rounded = ratio.round();
    if (ratio - rounded).abs() < 1e-9 * rounded.max(1.0) {
        rounded as u64
    } else {
        ratio.ceil() as u64
    }
}

// ── RunConfig ─────────────────────────────────────────────────────────────────

/// Per-run driver configuration.
///
/// Usually derived with `MachineParams::run_config`; a batch driver varies
/// `seed` between runs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    /// Simulated seconds per tick.
    pub tick_secs: f64,

    /// Total ticks to simulate.
    pub total_ticks: u64,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Pre-position sliders over the next lane when a rail changes phase.
    pub pre_move: bool,

    /// Allow rails to serve the opposite phase when one phase is starved.
    pub state_bouncing: bool,

    /// Emit an observer snapshot every N ticks.  0 disables snapshots.
    pub snapshot_interval_ticks: u64,
}

impl RunConfig {
    /// A run of `duration_secs` at `tick_secs` per tick with everything else off.
    pub fn new(duration_secs: f64, tick_secs: f64, seed: u64) -> Self {
        Self {
            tick_secs,
            total_ticks: ticks_for_secs(duration_secs, tick_secs),
            seed,
            pre_move: false,
            state_bouncing: false,
            snapshot_interval_ticks: 0,
        }
    }

    /// The tick at which the simulation ends (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.tick_secs)
    }
}
